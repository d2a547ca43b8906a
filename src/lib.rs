pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use data::TagUniverse;
pub use engines::evaluation::{EvaluationResult, FitnessEvaluator};
pub use engines::generation::{
    Candidate, CancellationToken, EvolutionEngine, GenerationRecord, LineageInfo, RunHistory,
};
pub use error::{GenticError, Result};
pub use types::{Tag, TagKind};
