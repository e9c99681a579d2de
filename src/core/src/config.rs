use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PackError, Result};

/// Pack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Local image store directory
    pub store_dir: PathBuf,

    /// Upper bound on a single image fetch, in seconds
    pub fetch_timeout_secs: Option<u64>,

    /// Whether images may be pulled from a registry
    pub pull_registry: bool,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            fetch_timeout_secs: None,
            pull_registry: true,
            log_level: LogLevel::Warn,
        }
    }
}

impl PackConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PackError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: PackConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Fetch timeout as a duration, if configured.
    pub fn fetch_timeout(&self) -> Option<std::time::Duration> {
        self.fetch_timeout_secs.map(std::time::Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.store_dir.as_os_str().is_empty() {
            return Err(PackError::ConfigError(
                "store_dir must not be empty".to_string(),
            ));
        }
        if self.fetch_timeout_secs == Some(0) {
            return Err(PackError::ConfigError(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default image store directory (~/.a3s/pack/images).
pub fn default_store_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".a3s"))
        .unwrap_or_else(|| PathBuf::from(".a3s"))
        .join("pack")
        .join("images")
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PackConfig::default();
        assert!(config.store_dir.ends_with("pack/images"));
        assert!(config.pull_registry);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.fetch_timeout().is_none());
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pack.yaml");
        std::fs::write(&path, "fetch_timeout_secs: 30\nlog_level: debug\n").unwrap();

        let config = PackConfig::load(&path).unwrap();
        assert_eq!(
            config.fetch_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.pull_registry);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PackConfig::load("/nonexistent/pack.yaml").unwrap_err();
        assert!(matches!(err, PackError::ConfigError(_)));
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pack.yaml");
        std::fs::write(&path, "fetch_timeout_secs: 0\n").unwrap();

        let err = PackConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("fetch_timeout_secs"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pack.yaml");
        std::fs::write(&path, "log_level: [not, a, level]\n").unwrap();

        let err = PackConfig::load(&path).unwrap_err();
        assert!(matches!(err, PackError::SerializationError(_)));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = PackConfig::load_or_default(None).unwrap();
        assert_eq!(config.store_dir, default_store_dir());
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Info.as_filter(), "info");
        assert_eq!(LogLevel::Error.as_filter(), "error");
    }
}
