//! Storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default trailing-edge debounce window for disk writes
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Environment variable overriding the local storage directory
pub const ENV_STORAGE_DIR: &str = "PREFSTORE_STORAGE_DIR";

/// Environment variable overriding the debounce window, in milliseconds
pub const ENV_DEBOUNCE_MS: &str = "PREFSTORE_DEBOUNCE_MS";

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one `{scopeId}.json` file per scope
    pub local_storage_dir: PathBuf,
    /// Delay after the last mutation before the document is written
    #[serde(with = "humantime_serde")]
    pub debounce: Duration,
    /// Write indented JSON
    pub pretty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_storage_dir: Self::default_storage_dir(),
            debounce: DEFAULT_DEBOUNCE,
            pretty: true,
        }
    }
}

impl StorageConfig {
    /// Create a config rooted at `dir` with default timings
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            local_storage_dir: dir.into(),
            ..Self::default()
        }
    }

    /// `{data_dir}/prefstore/local-storage`, or a relative fallback when the
    /// platform has no data directory
    pub fn default_storage_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prefstore")
            .join("local-storage")
    }

    /// Set the storage directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_storage_dir = dir.into();
        self
    }

    /// Set the debounce window
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Toggle indented output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Apply `PREFSTORE_*` environment overrides. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_STORAGE_DIR).filter(|d| !d.trim().is_empty()) {
            self.local_storage_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.debounce = Duration::from_millis(ms),
                Err(e) => {
                    tracing::warn!("Ignoring {}={:?}: {}", ENV_DEBOUNCE_MS, raw, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert!(config.pretty);
        assert!(config.local_storage_dir.ends_with("prefstore/local-storage"));
    }

    #[test]
    fn test_builder() {
        let config = StorageConfig::new("/tmp/store")
            .with_debounce(Duration::from_millis(10))
            .with_pretty(false);
        assert_eq!(config.local_storage_dir, PathBuf::from("/tmp/store"));
        assert_eq!(config.debounce, Duration::from_millis(10));
        assert!(!config.pretty);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_STORAGE_DIR, "/var/lib/prefs"),
            (ENV_DEBOUNCE_MS, "40"),
        ]
        .into_iter()
        .collect();

        let mut config = StorageConfig::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.local_storage_dir, PathBuf::from("/var/lib/prefs"));
        assert_eq!(config.debounce, Duration::from_millis(40));
    }

    #[test]
    fn test_invalid_debounce_override_is_ignored() {
        let mut config = StorageConfig::default();
        config.apply_overrides(|name| (name == ENV_DEBOUNCE_MS).then(|| "soon".to_string()));
        assert_eq!(config.debounce, DEFAULT_DEBOUNCE);
    }

    #[test]
    fn test_serde_humantime() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"local_storage_dir": "/x", "debounce": "1s"}"#).unwrap();
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert!(config.pretty);
    }
}
