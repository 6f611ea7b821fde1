//! Configuration loading from provenance.toml.

use policy::Identity;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Identity used for mutating commands when `--as` is not given.
    #[serde(default)]
    pub caller: Option<String>,

    /// Ledger storage configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Where the journal lives.
#[derive(Debug, Deserialize, Default)]
pub struct LedgerConfig {
    /// Path to the SQLite journal. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the caller identity, preferring an explicit override.
    pub fn caller(&self, explicit: Option<&str>) -> Result<Identity, ConfigError> {
        explicit
            .or(self.caller.as_deref())
            .map(Identity::from)
            .ok_or(ConfigError::MissingCaller)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("caller identity not configured: pass --as <identity> or set `caller`")]
    MissingCaller,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.caller.is_none());
        assert!(config.ledger.path.is_none());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
caller = "0xretailer"

[ledger]
path = "/var/lib/provenance/ledger.db"

[log]
level = "ledger=debug"
"#,
        )
        .unwrap();
        assert_eq!(config.caller.as_deref(), Some("0xretailer"));
        assert_eq!(
            config.ledger.path,
            Some(PathBuf::from("/var/lib/provenance/ledger.db"))
        );
        assert_eq!(config.log.level, "ledger=debug");
    }

    #[test]
    fn test_explicit_caller_wins() {
        let config = Config::parse(r#"caller = "0xdefault""#).unwrap();
        assert_eq!(config.caller(Some("0xother")).unwrap(), Identity::from("0xother"));
        assert_eq!(config.caller(None).unwrap(), Identity::from("0xdefault"));
        assert!(matches!(
            Config::default().caller(None),
            Err(ConfigError::MissingCaller)
        ));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(Config::parse("caller = "), Err(ConfigError::Parse(_))));
    }
}
