//! Compiler configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use msgscript_data::FormatVersion;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default diagnostics channel name.
pub const DEFAULT_CHANNEL: &str = "MessageScriptCompiler";

/// Errors raised while loading compiler options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings for a [`crate::MessageScriptCompiler`].
///
/// ```toml
/// format_version = "v1-big-endian"
/// channel = "event-scripts"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    pub format_version: FormatVersion,
    pub channel: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            format_version: FormatVersion::default(),
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl CompilerOptions {
    /// Parse options from TOML text; missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] for malformed TOML, unknown keys, or
    /// unknown format versions.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse an options file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`CompilerOptions::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
