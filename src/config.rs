//! Run configuration loaded from a TOML file
//!
//! ```toml
//! step_limit = 100000
//! trace = true
//! log_level = "debug"
//! ```
//!
//! Every key is optional. Command-line flags override what the file says.

use crate::error::ZError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Stop after this many instructions; no limit when absent
    pub step_limit: Option<u64>,
    /// Install the logging observer
    pub trace: bool,
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<RunConfig, ZError> {
        toml::from_str(text).map_err(|e| ZError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<RunConfig, ZError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ZError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        RunConfig::from_toml_str(&text)
    }
}
