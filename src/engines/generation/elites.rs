use crate::engines::generation::candidate::Candidate;
use crate::engines::generation::operators::best_n;

/// Best-so-far candidates carried across generations.
///
/// Holds at most `capacity` candidates, sorted best first. Identities are not
/// deduplicated: two candidates with the same tag set may both be elites.
#[derive(Debug, Clone)]
pub struct EliteSet {
    elites: Vec<Candidate>,
    capacity: usize,
    greater_is_better: bool,
}

impl EliteSet {
    pub fn new(capacity: usize, greater_is_better: bool) -> Self {
        Self {
            elites: Vec::with_capacity(capacity),
            capacity,
            greater_is_better,
        }
    }

    /// Keep the best `capacity` of the current elites plus `valid`.
    /// Current elites come first, so they win ties against newcomers.
    pub fn merge(&mut self, valid: &[Candidate]) {
        let mut pool = std::mem::take(&mut self.elites);
        pool.extend(valid.iter().filter(|c| c.is_valid()).cloned());
        self.elites = best_n(pool, self.capacity, self.greater_is_better);
    }

    pub fn get_all(&self) -> &[Candidate] {
        &self.elites
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.elites.first()
    }

    pub fn fitnesses(&self) -> Vec<f64> {
        self.elites.iter().filter_map(Candidate::fitness).collect()
    }

    pub fn mean_fitness(&self) -> Option<f64> {
        let fitnesses = self.fitnesses();
        if fitnesses.is_empty() {
            return None;
        }
        Some(fitnesses.iter().sum::<f64>() / fitnesses.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.elites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elites.is_empty()
    }
}
