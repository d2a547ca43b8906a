use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenticError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation {generation} produced no valid candidates")]
    EmptyPopulation { generation: u64 },

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Config load error: {0}")]
    ConfigLoad(#[from] ::config::ConfigError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenticError>;
