use super::traits::ConfigSection;
use crate::error::GenticError;
use serde::{Deserialize, Serialize};

/// Names of the industry and universe tags a run may draw from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagCatalog {
    pub industries: Vec<String>,
    pub universes: Vec<String>,
}

impl ConfigSection for TagCatalog {
    fn section_name() -> &'static str {
        "tags"
    }

    fn validate(&self) -> Result<(), GenticError> {
        if self.industries.is_empty() && self.universes.is_empty() {
            return Err(GenticError::Configuration(
                "Tag catalog must list at least one industry or universe tag".to_string(),
            ));
        }
        if self
            .industries
            .iter()
            .chain(&self.universes)
            .any(|name| name.trim().is_empty())
        {
            return Err(GenticError::Configuration(
                "Tag names must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
