//! Configuration loading for the melody corpus tools.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/melody-corpus/config.toml` (system)
//! 2. `~/.config/melody-corpus/config.toml` (user)
//! 3. `./melody-corpus.toml` (local override, or the `--config` path)
//! 4. Environment variables (`MELODY_CORPUS_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! data_dir = "~/corpora"
//!
//! [logging]
//! level = "melody_corpus=debug"
//!
//! [prepare]
//! min_length = 16
//! max_length = 256
//! seed = 42
//! transpose = true
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigLayer, ConfigSources};
pub use settings::{LoggingConfig, PathsConfig, PrepareConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub prepare: PrepareConfig,
}

impl CorpusConfig {
    /// Load configuration from all standard sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, letting `config_path` replace `./melody-corpus.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = CorpusConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Melody corpus configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "data_dir = \"{}\"\n",
            self.paths.data_dir.display()
        ));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        output.push_str("\n[prepare]\n");
        if let Some(v) = self.prepare.min_length {
            output.push_str(&format!("min_length = {}\n", v));
        }
        if let Some(v) = self.prepare.max_length {
            output.push_str(&format!("max_length = {}\n", v));
        }
        if let Some(v) = self.prepare.seed {
            output.push_str(&format!("seed = {}\n", v));
        }
        output.push_str(&format!("transpose = {}\n", self.prepare.transpose));

        output
    }
}
