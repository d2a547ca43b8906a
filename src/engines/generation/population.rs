use crate::config::EvolutionConfig;
use crate::data::TagUniverse;
use crate::engines::evaluation::{score_candidate, FitnessEvaluator};
use crate::engines::generation::candidate::{Candidate, LineageInfo, TagSet};
use crate::engines::generation::operators::{contenders, tournament_selection};
use crate::engines::generation::random::RandomStream;
use rayon::prelude::*;

/// Primary genetic operator applied to an offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Crossover,
    SubtreeMutation,
    HoistMutation,
    PointMutation,
    Reproduction,
}

/// Cumulative operator thresholds, `[crossover, subtree, hoist, point]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorThresholds([f64; 4]);

impl OperatorThresholds {
    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self(config.method_probs())
    }

    pub fn as_array(&self) -> [f64; 4] {
        self.0
    }

    /// Map a uniform draw to an operator by the first threshold it falls under.
    pub fn select(&self, draw: f64) -> Operator {
        let [crossover, subtree, hoist, point] = self.0;
        if draw < crossover {
            Operator::Crossover
        } else if draw < subtree {
            Operator::SubtreeMutation
        } else if draw < hoist {
            Operator::HoistMutation
        } else if draw < point {
            Operator::PointMutation
        } else {
            Operator::Reproduction
        }
    }

    /// Gate for the extra crossover against a fresh random program.
    pub fn fresh_gate(&self) -> f64 {
        self.0[2]
    }

    /// Gate for the closing crossover back against the tournament parent.
    pub fn back_gate(&self) -> f64 {
        self.0[3]
    }
}

/// Produces and scores one generation.
///
/// Slots are independent: slot `i` draws every random decision from
/// `RandomStream::from_seed(seeds[i])` and reads `parents` only, so the output
/// is the same for any worker count.
pub struct PopulationEvolver<'a, E: FitnessEvaluator> {
    config: &'a EvolutionConfig,
    universe: &'a TagUniverse,
    evaluator: &'a E,
    pool: &'a rayon::ThreadPool,
    thresholds: OperatorThresholds,
    default_value: f64,
}

impl<'a, E: FitnessEvaluator> PopulationEvolver<'a, E> {
    pub fn new(
        config: &'a EvolutionConfig,
        universe: &'a TagUniverse,
        evaluator: &'a E,
        pool: &'a rayon::ThreadPool,
    ) -> Self {
        Self {
            config,
            universe,
            evaluator,
            pool,
            thresholds: OperatorThresholds::from_config(config),
            default_value: config.default_value(),
        }
    }

    pub fn thresholds(&self) -> OperatorThresholds {
        self.thresholds
    }

    /// One evaluated candidate per seed, in seed order. `None` parents builds
    /// the random seed generation.
    pub fn evolve_generation(
        &self,
        parents: Option<&[Candidate]>,
        market: &E::Market,
        seeds: &[u64],
        generation: u64,
    ) -> Vec<Candidate> {
        self.pool.install(|| {
            seeds
                .par_iter()
                .map(|&seed| {
                    let mut rng = RandomStream::from_seed(seed);
                    let candidate = self.breed(parents, generation, &mut rng);
                    self.evaluate(candidate, market)
                })
                .collect()
        })
    }

    /// Build one offspring without scoring it.
    pub fn breed(
        &self,
        parents: Option<&[Candidate]>,
        generation: u64,
        rng: &mut RandomStream,
    ) -> Candidate {
        let parents = match parents {
            Some(parents) if !parents.is_empty() => parents,
            _ => {
                return Candidate::build_random(
                    self.universe,
                    self.config.init_depth,
                    generation,
                    rng,
                )
            }
        };

        let config = self.config;
        let universe = self.universe;

        let parent_idx =
            tournament_selection(parents, config.tournament_size, config.greater_is_better, rng);
        let ori_parent = parents[parent_idx].items();
        let mut current = ori_parent.clone();

        if !config.single_operator {
            for contender in contenders(parents, rng) {
                current = current.crossover(parents[contender].items(), universe, rng).child;
            }
            if rng.next_uniform() < self.thresholds.fresh_gate() {
                let fresh = TagSet::build_random(universe, config.init_depth, rng);
                current = current.crossover(&fresh, universe, rng).child;
            }
        }

        let (items, lineage) = match self.thresholds.select(rng.next_uniform()) {
            Operator::Crossover => {
                let donor_idx = tournament_selection(
                    parents,
                    config.tournament_size,
                    config.greater_is_better,
                    rng,
                );
                let out = current.crossover(parents[donor_idx].items(), universe, rng);
                (
                    out.child,
                    LineageInfo::Crossover {
                        parent_idx,
                        parent_removed_positions: out.removed,
                        donor_idx,
                        donor_kept_positions: out.donor_kept,
                    },
                )
            }
            Operator::SubtreeMutation => {
                let out = current.subtree_mutation(universe, config.init_depth, rng);
                (
                    out.child,
                    LineageInfo::SubtreeMutation {
                        parent_idx,
                        removed_positions: out.positions,
                    },
                )
            }
            Operator::HoistMutation => {
                let out = current.hoist_mutation(universe, rng);
                (
                    out.child,
                    LineageInfo::HoistMutation {
                        parent_idx,
                        removed_positions: out.positions,
                    },
                )
            }
            Operator::PointMutation => {
                let out = current.point_mutation(universe, config.p_point_replace, rng);
                (
                    out.child,
                    LineageInfo::PointMutation {
                        parent_idx,
                        mutated_positions: out.positions,
                    },
                )
            }
            Operator::Reproduction => (current, LineageInfo::Reproduction { parent_idx }),
        };

        let back_crossover =
            !config.single_operator && rng.next_uniform() < self.thresholds.back_gate();
        let items = if back_crossover {
            items.crossover(ori_parent, universe, rng).child
        } else {
            items
        };

        Candidate::new(items, generation, lineage)
    }

    fn evaluate(&self, candidate: Candidate, market: &E::Market) -> Candidate {
        let scored = score_candidate(self.evaluator, candidate.tags(), market, self.default_value);
        candidate.with_evaluation(scored.fitness, scored.valid)
    }
}
