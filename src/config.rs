use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from an optional TOML file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
#[derive(Default)]
pub struct FiltersConfig {
    pub scan: ScanConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// File name suffix marking a metric series file.
    pub suffix: String,
    /// Sort metric paths before deduplication for reproducible output.
    pub sort: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
#[derive(Default)]
pub struct FilterConfig {
    pub skip_leaves: bool,
    /// Emit `{  }` filters for paths that leave no segments instead of dropping them.
    pub keep_empty: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            suffix: ".wsp".to_string(),
            sort: false,
        }
    }
}

/// Errors from loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// The configured suffix is empty, which would match every file.
    EmptySuffix,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::EmptySuffix => write!(f, "scan.suffix must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::EmptySuffix => None,
        }
    }
}

impl FiltersConfig {
    /// Load configuration from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        if config.scan.suffix.is_empty() {
            return Err(ConfigError::EmptySuffix);
        }
        Ok(config)
    }

    /// Merge command-line overrides on top of the file settings.
    pub fn resolve(&self, overrides: &Overrides) -> RunSettings {
        RunSettings {
            suffix: self.scan.suffix.clone(),
            sort: overrides.sort.unwrap_or(self.scan.sort),
            skip_leaves: overrides.skip_leaves.unwrap_or(self.filter.skip_leaves),
            keep_empty: self.filter.keep_empty,
        }
    }
}

/// Tri-state flags from the command line; `None` defers to the config file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Overrides {
    pub skip_leaves: Option<bool>,
    pub sort: Option<bool>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub suffix: String,
    pub sort: bool,
    pub skip_leaves: bool,
    pub keep_empty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = FiltersConfig::load(None).unwrap();
        assert_eq!(config.scan.suffix, ".wsp");
        assert!(!config.scan.sort);
        assert!(!config.filter.skip_leaves);
        assert!(!config.filter.keep_empty);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = FiltersConfig::parse("[filter]\nskip_leaves = true\n").unwrap();
        assert!(config.filter.skip_leaves);
        assert_eq!(config.scan.suffix, ".wsp");
    }

    #[test]
    fn load_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("filters.toml");
        std::fs::write(
            &path,
            "[scan]\nsuffix = \".whisper\"\nsort = true\n\n[filter]\nkeep_empty = true\n",
        )
        .unwrap();

        let config = FiltersConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scan.suffix, ".whisper");
        assert!(config.scan.sort);
        assert!(config.filter.keep_empty);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = FiltersConfig::load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn parse_error_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[scan\nsuffix = 1").unwrap();

        let err = FiltersConfig::load(Some(&path)).unwrap_err();
        match &err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, &path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn empty_suffix_rejected() {
        let err = FiltersConfig::parse("[scan]\nsuffix = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptySuffix));
    }

    #[test]
    fn overrides_win_over_file() {
        let config = FiltersConfig::parse("[filter]\nskip_leaves = true\n").unwrap();

        let settings = config.resolve(&Overrides::default());
        assert!(settings.skip_leaves);
        assert!(!settings.sort);

        let settings = config.resolve(&Overrides {
            skip_leaves: Some(false),
            sort: Some(true),
        });
        assert!(!settings.skip_leaves);
        assert!(settings.sort);
    }
}
