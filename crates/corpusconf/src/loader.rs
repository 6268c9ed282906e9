//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, CorpusConfig, LoggingConfig, PathsConfig, PrepareConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local/cli). Only returns
/// files that exist; an existing `cli_path` replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/melody-corpus/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("melody-corpus/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("melody-corpus.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Values one config file sets explicitly. `None` leaves the layer below alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub seed: Option<u64>,
    pub transpose: Option<bool>,
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

fn parse_toml(contents: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_err(e.to_string()))?;

    let count = |section: &toml::Table, key: &str| -> Result<Option<usize>, ConfigError> {
        match section.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| parse_err(format!("{key} must be a non-negative integer"))),
        }
    };

    let mut layer = ConfigLayer::default();

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        layer.data_dir = paths.get("data_dir").and_then(|v| v.as_str()).map(expand_path);
    }

    if let Some(logging) = table.get("logging").and_then(|v| v.as_table()) {
        layer.log_level = logging
            .get("level")
            .and_then(|v| v.as_str())
            .map(str::to_string);
    }

    if let Some(prepare) = table.get("prepare").and_then(|v| v.as_table()) {
        layer.min_length = count(prepare, "min_length")?;
        layer.max_length = count(prepare, "max_length")?;
        layer.seed = count(prepare, "seed")?.map(|s| s as u64);
        layer.transpose = prepare.get("transpose").and_then(|v| v.as_bool());
    }

    Ok(layer)
}

/// Apply `overlay` on top of `base`; every value the overlay sets wins.
pub fn merge_configs(base: CorpusConfig, overlay: ConfigLayer) -> CorpusConfig {
    CorpusConfig {
        paths: PathsConfig {
            data_dir: overlay.data_dir.unwrap_or(base.paths.data_dir),
        },
        logging: LoggingConfig {
            level: overlay.log_level.unwrap_or(base.logging.level),
        },
        prepare: PrepareConfig {
            min_length: overlay.min_length.or(base.prepare.min_length),
            max_length: overlay.max_length.or(base.prepare.max_length),
            seed: overlay.seed.or(base.prepare.seed),
            transpose: overlay.transpose.unwrap_or(base.prepare.transpose),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut CorpusConfig, sources: &mut ConfigSources) {
    apply_overrides_with(config, sources, |key| env::var(key).ok());
}

fn apply_overrides_with(
    config: &mut CorpusConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("MELODY_CORPUS_DATA_DIR") {
        config.paths.data_dir = expand_path(&v);
        sources.env_overrides.push("MELODY_CORPUS_DATA_DIR".to_string());
    }

    if let Some(v) = lookup("MELODY_CORPUS_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("MELODY_CORPUS_LOG_LEVEL".to_string());
    }
    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(v) = lookup("MELODY_CORPUS_MIN_LENGTH") {
        if let Ok(n) = v.parse() {
            config.prepare.min_length = Some(n);
            sources.env_overrides.push("MELODY_CORPUS_MIN_LENGTH".to_string());
        }
    }
    if let Some(v) = lookup("MELODY_CORPUS_MAX_LENGTH") {
        if let Ok(n) = v.parse() {
            config.prepare.max_length = Some(n);
            sources.env_overrides.push("MELODY_CORPUS_MAX_LENGTH".to_string());
        }
    }
    if let Some(v) = lookup("MELODY_CORPUS_SEED") {
        if let Ok(seed) = v.parse() {
            config.prepare.seed = Some(seed);
            sources.env_overrides.push("MELODY_CORPUS_SEED".to_string());
        }
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        directories::BaseDirs::new()
            .map(|d| d.home_dir().join(stripped))
            .unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        match stripped.split_once('/') {
            Some((var_name, rest)) => env::var(var_name)
                .map(|value| PathBuf::from(value).join(rest))
                .unwrap_or_else(|_| PathBuf::from(path)),
            None => env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path)),
        }
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/corpora/folk");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("corpora/folk"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/srv/corpora"), PathBuf::from("/srv/corpora"));
    }

    fn parse(contents: &str) -> CorpusConfig {
        let layer = parse_toml(contents, Path::new("test.toml")).unwrap();
        merge_configs(CorpusConfig::default(), layer)
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[paths]
data_dir = "/custom/corpora"
"#;
        let config = parse(toml);
        assert_eq!(config.paths.data_dir, PathBuf::from("/custom/corpora"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.prepare, PrepareConfig::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[paths]
data_dir = "/data/tunes"

[logging]
level = "debug"

[prepare]
min_length = 16
max_length = 256
seed = 42
transpose = true
"#;
        let config = parse(toml);

        assert_eq!(config.paths.data_dir, PathBuf::from("/data/tunes"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.prepare,
            PrepareConfig {
                min_length: Some(16),
                max_length: Some(256),
                seed: Some(42),
                transpose: true,
            }
        );
    }

    #[test]
    fn test_negative_length_rejected() {
        let err = parse_toml("[prepare]\nmin_length = -1\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = parse_toml("[prepare\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn test_merge_keeps_base_where_overlay_is_silent() {
        let base = parse("[logging]\nlevel = \"warn\"\n[prepare]\nmin_length = 4\nseed = 1\n");
        let overlay = parse_toml("[prepare]\nseed = 9\n", Path::new("overlay.toml")).unwrap();

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.logging.level, "warn");
        assert_eq!(merged.prepare.min_length, Some(4));
        assert_eq!(merged.prepare.seed, Some(9));
    }

    #[test]
    fn test_later_file_can_restore_defaults() {
        let base = parse("[logging]\nlevel = \"debug\"\n[prepare]\ntranspose = true\n");
        let overlay = parse_toml(
            "[logging]\nlevel = \"info\"\n[prepare]\ntranspose = false\n",
            Path::new("overlay.toml"),
        )
        .unwrap();

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.logging.level, "info");
        assert!(!merged.prepare.transpose);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MELODY_CORPUS_SEED", "1234"),
            ("MELODY_CORPUS_MIN_LENGTH", "not-a-number"),
            ("MELODY_CORPUS_LOG_LEVEL", "debug"),
            ("RUST_LOG", "melody_corpus=trace"),
        ]);
        let mut config = CorpusConfig::default();
        let mut sources = ConfigSources::default();

        apply_overrides_with(&mut config, &mut sources, |key| {
            vars.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.prepare.seed, Some(1234));
        assert_eq!(config.prepare.min_length, None);
        assert_eq!(config.logging.level, "melody_corpus=trace");
        assert_eq!(
            sources.env_overrides,
            vec!["MELODY_CORPUS_LOG_LEVEL", "RUST_LOG", "MELODY_CORPUS_SEED"]
        );
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = load_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
