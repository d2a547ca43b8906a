use super::traits::ConfigSection;
use crate::error::GenticError;
use serde::{Deserialize, Serialize};

/// Slack allowed when checking that the operator probabilities sum to at most one.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub tournament_size: usize,
    pub max_generations: usize,
    pub greater_is_better: bool,
    /// Inclusive `(min, max)` bounds on how many tags of each kind a random
    /// candidate is drawn around.
    pub init_depth: (usize, usize),
    pub p_crossover: f64,
    pub p_subtree_mutation: f64,
    pub p_hoist_mutation: f64,
    pub p_point_mutation: f64,
    pub p_point_replace: f64,
    pub convergence_threshold: f64,
    pub convergence_patience: usize,
    pub parallelism: usize,
    pub seed: Option<u64>,
    /// Apply only the primary operator per offspring, skipping the extra
    /// contender, fresh-random and back-to-parent crossovers.
    pub single_operator: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            tournament_size: 20,
            max_generations: 20,
            greater_is_better: true,
            init_depth: (1, 5),
            p_crossover: 0.9,
            p_subtree_mutation: 0.01,
            p_hoist_mutation: 0.01,
            p_point_mutation: 0.01,
            p_point_replace: 0.05,
            convergence_threshold: 1e-4,
            convergence_patience: 3,
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            seed: None,
            single_operator: false,
        }
    }
}

impl EvolutionConfig {
    /// Cumulative operator thresholds: crossover, subtree, hoist, point.
    pub fn method_probs(&self) -> [f64; 4] {
        let mut acc = 0.0;
        let mut probs = [0.0; 4];
        for (slot, p) in probs.iter_mut().zip([
            self.p_crossover,
            self.p_subtree_mutation,
            self.p_hoist_mutation,
            self.p_point_mutation,
        ]) {
            acc += p;
            *slot = acc;
        }
        probs
    }

    /// Fitness assigned to candidates whose evaluation failed. Always loses a
    /// comparison under the configured direction.
    pub fn default_value(&self) -> f64 {
        if self.greater_is_better {
            f64::from(i32::MIN)
        } else {
            f64::from(i32::MAX)
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), GenticError> {
        if self.population_size == 0 {
            return Err(GenticError::Configuration(
                "Population size must be at least 1".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(GenticError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if self.max_generations == 0 {
            return Err(GenticError::Configuration(
                "Max generations must be at least 1".to_string(),
            ));
        }
        if self.parallelism == 0 {
            return Err(GenticError::Configuration(
                "Parallelism must be at least 1".to_string(),
            ));
        }
        let (min_depth, max_depth) = self.init_depth;
        if min_depth > max_depth {
            return Err(GenticError::Configuration(format!(
                "init_depth min ({}) must not exceed max ({})",
                min_depth, max_depth
            )));
        }

        let named = [
            ("p_crossover", self.p_crossover),
            ("p_subtree_mutation", self.p_subtree_mutation),
            ("p_hoist_mutation", self.p_hoist_mutation),
            ("p_point_mutation", self.p_point_mutation),
            ("p_point_replace", self.p_point_replace),
        ];
        for (name, p) in named {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenticError::Configuration(format!(
                    "{} must be between 0 and 1, got {}",
                    name, p
                )));
            }
        }
        let total = self.method_probs()[3];
        if total > 1.0 + PROBABILITY_TOLERANCE {
            return Err(GenticError::Configuration(format!(
                "Sum of crossover and mutation probabilities must not exceed 1, got {:.4}",
                total
            )));
        }

        if self.convergence_threshold.is_nan() || self.convergence_threshold < 0.0 {
            return Err(GenticError::Configuration(
                "Convergence threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
