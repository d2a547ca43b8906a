use crate::types::Tag;
use log::debug;

/// Raw answer of the external scoring pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationResult {
    pub fitness: f64,
    pub status_ok: bool,
}

impl EvaluationResult {
    pub fn ok(fitness: f64) -> Self {
        Self {
            fitness,
            status_ok: true,
        }
    }

    pub fn failed(default_value: f64) -> Self {
        Self {
            fitness: default_value,
            status_ok: false,
        }
    }
}

/// Scores one tag combination against market data.
///
/// Called once per candidate per generation, possibly from several worker
/// threads at once. Implementations may return an error instead of a failed
/// status; both are absorbed by the caller.
pub trait FitnessEvaluator: Sync {
    type Market: Sync;

    fn evaluate(
        &self,
        tags: &[Tag],
        market: &Self::Market,
        default_value: f64,
    ) -> anyhow::Result<EvaluationResult>;
}

/// Fitness and validity after failures have been folded into the sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub fitness: f64,
    pub valid: bool,
}

/// Run the evaluator and map any failure (error, failed status, NaN, sentinel
/// score) to `default_value` with `valid = false`.
pub fn score_candidate<E: FitnessEvaluator>(
    evaluator: &E,
    tags: &[Tag],
    market: &E::Market,
    default_value: f64,
) -> Scored {
    let invalid = Scored {
        fitness: default_value,
        valid: false,
    };

    match evaluator.evaluate(tags, market, default_value) {
        Ok(result) if !result.status_ok => {
            debug!("Evaluation reported failure for {} tags", tags.len());
            invalid
        }
        Ok(result) if result.fitness.is_nan() => {
            debug!("Evaluation produced NaN for {} tags", tags.len());
            invalid
        }
        Ok(result) if result.fitness == default_value => invalid,
        Ok(result) => Scored {
            fitness: result.fitness,
            valid: true,
        },
        Err(e) => {
            debug!("Evaluation failed: {:#}", e);
            invalid
        }
    }
}
