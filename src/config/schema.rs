use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::roi::InternalConstants;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Overrides for the engine's business constants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<InternalConstants>,

    /// Scenario store location (defaults to ~/.config/invoice-roi/scenarios.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Config {
    /// Constants to inject into the engine
    pub fn effective_constants(&self) -> InternalConstants {
        self.constants.unwrap_or_default()
    }

    pub fn effective_bind(&self) -> String {
        self.server
            .as_ref()
            .map(|s| s.bind.clone())
            .unwrap_or_else(default_bind)
    }
}
