pub mod evaluator;

pub use evaluator::{score_candidate, EvaluationResult, FitnessEvaluator, Scored};
