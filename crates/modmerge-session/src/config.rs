use serde::{Deserialize, Serialize};

use modmerge_diff::DiffMode;

use crate::error::ConfigError;

/// Which input list drives the order of the assembled catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    /// Incoming order first; unpaired existing items slot in by their
    /// original neighbours.
    #[default]
    IncomingFirst,
    /// Existing order first; unpaired incoming items are appended.
    ExistingFirst,
}

/// Configuration for a merge session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ordering of the assembled catalog.
    pub order_mode: OrderMode,
    /// When `true`, fully selected pairs are labelled as duplicates (`Match`)
    /// instead of updates in incoming-first previews.
    pub skip_duplicates: bool,
    /// Algorithm for per-item and catalog diffs.
    pub diff_mode: DiffMode,
}

impl SessionConfig {
    /// Parse from TOML. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}
