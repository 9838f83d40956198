//! Transpiler configuration.
//!
//! Options can be passed directly or loaded from a TOML file:
//!
//! ```toml
//! dialect = "duckdb"
//!
//! [options]
//! strict_mode = true
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Transpiler;
use crate::transpiler::Dialect;

/// Per-call options. Unknown keys are ignored when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileOptions {
    /// Reject column references that cannot be resolved against the current
    /// projection instead of passing them through.
    pub strict_mode: bool,
    /// Carried for callers that keep comments alongside the source; no effect
    /// on the generated SQL.
    pub preserve_comments: bool,
}

impl TranspileOptions {
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }
}

/// File-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialect: Dialect,
    pub options: TranspileOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// `<config dir>/dplyr-sql/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dplyr-sql").join("config.toml"))
    }

    /// Load the default config file; a missing file yields defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn transpiler(&self) -> Transpiler {
        Transpiler::new(self.dialect).with_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(
            r#"
            dialect = "duckdb"

            [options]
            strict_mode = true
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::DuckDB);
        assert!(config.options.strict_mode);
        assert!(!config.options.preserve_comments);
    }

    #[test]
    fn test_defaults_and_unknown_keys() {
        let config = Config::from_toml_str("cache_size = 10\n[options]\nverbose = true").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dialect, Dialect::Postgres);
    }

    #[test]
    fn test_dialect_aliases() {
        let config = Config::from_toml_str("dialect = \"pg\"").unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
    }

    #[test]
    fn test_invalid_dialect() {
        let err = Config::from_toml_str("dialect = \"oracle\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/dplyr-sql.toml").unwrap_err();
        assert!(err.to_string().starts_with("Failed to read config file"));
    }
}
