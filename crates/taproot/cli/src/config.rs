//! Configuration file support.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Settings read from `taproot.toml`. Command-line flags win over
/// file values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub synth_command: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub engine: Option<String>,
    #[serde(default)]
    pub auto_approve: bool,
}

impl CliConfig {
    /// Resolve the config: an explicit `--config` path, then
    /// `taproot.toml` in the app directory, then the user config
    /// directory. No file at all is an empty config; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load(explicit: Option<&Path>, app_dir: &Path) -> CliResult<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        let local = app_dir.join("taproot.toml");
        if local.exists() {
            return Self::read(&local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let global = config_dir.join("taproot").join("config.toml");
            if global.exists() {
                return Self::read(&global);
            }
        }
        Ok(Self::default())
    }

    fn read(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| CliError::Config {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }
}
