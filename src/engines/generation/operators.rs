use crate::engines::generation::candidate::Candidate;
use crate::engines::generation::random::RandomStream;

/// Whether `a` beats `b` under the configured direction. Strict, so ties keep
/// the incumbent.
pub fn is_better(a: f64, b: f64, greater_is_better: bool) -> bool {
    if greater_is_better {
        a > b
    } else {
        a < b
    }
}

/// Tournament selection: index of the best of `tournament_size` random draws.
///
/// Ties go to the first drawn. Unscored candidates are treated as NaN and never
/// win against a scored one.
pub fn tournament_selection(
    population: &[Candidate],
    tournament_size: usize,
    greater_is_better: bool,
    rng: &mut RandomStream,
) -> usize {
    let mut best_idx = rng.next_index(population.len());
    let mut best_fitness = fitness_of(population, best_idx);

    for _ in 1..tournament_size {
        let idx = rng.next_index(population.len());
        let fitness = fitness_of(population, idx);
        if best_fitness.is_nan() || is_better(fitness, best_fitness, greater_is_better) {
            best_idx = idx;
            best_fitness = fitness;
        }
    }

    best_idx
}

/// Two uniformly drawn indices, no fitness comparison.
pub fn contenders(population: &[Candidate], rng: &mut RandomStream) -> [usize; 2] {
    [
        rng.next_index(population.len()),
        rng.next_index(population.len()),
    ]
}

/// The `n` best candidates, best first. Stable, so equal scores keep input order.
pub fn best_n(candidates: Vec<Candidate>, n: usize, greater_is_better: bool) -> Vec<Candidate> {
    let mut sorted = candidates;
    sorted.sort_by(|a, b| {
        let (fa, fb) = (a.fitness().unwrap_or(f64::NAN), b.fitness().unwrap_or(f64::NAN));
        let ordering = fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal);
        if greater_is_better {
            ordering.reverse()
        } else {
            ordering
        }
    });
    sorted.truncate(n);
    sorted
}

fn fitness_of(population: &[Candidate], idx: usize) -> f64 {
    population
        .get(idx)
        .and_then(Candidate::fitness)
        .unwrap_or(f64::NAN)
}
