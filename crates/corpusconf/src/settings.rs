//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where corpus documents live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory that relative corpus paths are resolved against.
    /// Default: ~/.local/share/melody-corpus
    #[serde(default = "PathsConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl PathsConfig {
    fn default_data_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/melody-corpus"))
            .unwrap_or_else(|| PathBuf::from(".local/share/melody-corpus"))
    }

    /// Resolve `path` against `data_dir` unless it is absolute or exists as given.
    pub fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Defaults for `corpus prepare` and `corpus sample`; CLI flags win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Seed for sampling.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Transpose every melody to C major / A minor.
    #[serde(default)]
    pub transpose: bool,
}
