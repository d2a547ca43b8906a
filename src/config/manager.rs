use super::{catalog::TagCatalog, evolution::EvolutionConfig, traits::ConfigSection};
use crate::error::GenticError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `GENTIC__EVOLUTION__POPULATION_SIZE=50`.
const ENV_PREFIX: &str = "GENTIC";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub tags: TagCatalog,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), GenticError> {
        self.evolution.validate().map_err(section_error::<EvolutionConfig>)?;
        self.tags.validate().map_err(section_error::<TagCatalog>)?;
        Ok(())
    }
}

fn section_error<S: ConfigSection>(err: GenticError) -> GenticError {
    match err {
        GenticError::Configuration(msg) => {
            GenticError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML or JSON file (picked by extension), then apply
    /// `GENTIC__<SECTION>__<FIELD>` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GenticError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GenticError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        log::info!(
            "Loaded config from {}: population={}, generations={}, {} industry / {} universe tags",
            path.display(),
            config.evolution.population_size,
            config.evolution.max_generations,
            config.tags.industries.len(),
            config.tags.universes.len()
        );

        *self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GenticError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| GenticError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Apply `f` and keep the result only if it still validates.
    pub fn update<F>(&self, f: F) -> Result<(), GenticError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }
}
