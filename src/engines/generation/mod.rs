pub mod random;
pub mod candidate;
pub mod operators;
pub mod population;
pub mod elites;
pub mod evolution_engine;
pub mod progress;

pub use random::RandomStream;
pub use candidate::{Candidate, CrossoverOutput, LineageInfo, MutationOutput, TagSet};
pub use operators::{best_n, contenders, is_better, tournament_selection};
pub use population::{Operator, OperatorThresholds, PopulationEvolver};
pub use elites::EliteSet;
pub use evolution_engine::{
    CancellationToken, EvolutionEngine, GenerationRecord, ProgressCallback, RunHistory, StopReason,
};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressMessage};
