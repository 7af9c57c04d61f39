use crate::projection::{CamelCaseMatchStrategy, ExactMatchStrategy, MemberNameMatchStrategy};
use recast_core::error::{Error, ErrorClass, ErrorOrigin};
use recast_schema::build::SynthesisOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to parse recast configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render recast configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::InvalidOperation, ErrorOrigin::Config, err.to_string())
    }
}

///
/// RecastConfig
///
/// ```toml
/// [synthesis]
/// max_members = 64
/// allow_resynthesis = false
///
/// [projection]
/// match_strategy = "exact"
/// ```
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecastConfig {
    pub synthesis: SynthesisOptions,
    pub projection: ProjectionSettings,
}

impl RecastConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

///
/// ProjectionSettings
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionSettings {
    pub match_strategy: MatchStrategyKind,
}

///
/// MatchStrategyKind
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum MatchStrategyKind {
    #[default]
    CamelCase,
    Exact,
}

impl MatchStrategyKind {
    #[must_use]
    pub fn strategy(self) -> Arc<dyn MemberNameMatchStrategy> {
        match self {
            Self::CamelCase => Arc::new(CamelCaseMatchStrategy),
            Self::Exact => Arc::new(ExactMatchStrategy),
        }
    }
}
