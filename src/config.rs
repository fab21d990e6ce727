//! REPL configuration loaded from TOML

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Directory under the platform config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "racket-stepper";

/// REPL settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Prompt shown before each form
    pub prompt: String,
    /// Print every reduction step instead of only the value
    pub show_steps: bool,
    /// Colored output
    pub color: bool,
    /// Startup banner
    pub banner: bool,
    /// Line-editor history file
    pub history_file: PathBuf,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            prompt: "> ".to_string(),
            show_steps: false,
            color: true,
            banner: true,
            history_file: PathBuf::from(".racket_stepper_history"),
        }
    }
}

impl ReplConfig {
    /// Read and parse a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Default location: `<config dir>/racket-stepper/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load `explicit` if given (errors are fatal), else the default file if
    /// it exists (errors fall back to defaults), else defaults.
    pub fn load(explicit: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => Ok(config),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring malformed config");
                    Ok(Self::default())
                }
            },
            _ => Ok(Self::default()),
        }
    }
}
