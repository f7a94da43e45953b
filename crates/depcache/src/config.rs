use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// Tunables for one [`DependencyCache`](crate::DependencyCache).
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries untouched for longer than this are marked, then evicted.
    pub max_age_days: u64,
    /// Minimum spacing between two cleanup passes over the same root.
    pub cleanup_interval_hours: u64,
    pub lock_stripes: usize,
    /// Run the due-check before every extraction.
    pub cleanup_on_extract: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_days: 22,
            cleanup_interval_hours: 24,
            lock_stripes: 1024,
            cleanup_on_extract: true,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    pub fn cleanup_interval_hours(mut self, hours: u64) -> Self {
        self.cleanup_interval_hours = hours;
        self
    }

    pub fn lock_stripes(mut self, stripes: usize) -> Self {
        self.lock_stripes = stripes;
        self
    }

    pub fn cleanup_on_extract(mut self, enabled: bool) -> Self {
        self.cleanup_on_extract = enabled;
        self
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days.saturating_mul(DAY))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours.saturating_mul(HOUR))
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io("failed to read config", path, e))?;
        let config: Self = toml::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.lock_stripes == 0 {
            return Err(Error::Config {
                path: path.to_path_buf(),
                reason: "lock_stripes must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cache_policy() {
        let config = CacheConfig::default();
        assert_eq!(config.max_age(), Duration::from_secs(22 * DAY));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(DAY));
        assert_eq!(config.lock_stripes, 1024);
        assert!(config.cleanup_on_extract);
    }

    #[test]
    fn load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depcache.toml");
        std::fs::write(&path, "max_age_days = 7\ncleanup_on_extract = false\n").unwrap();

        let config = CacheConfig::load(&path).unwrap();
        assert_eq!(config, CacheConfig::new().max_age_days(7).cleanup_on_extract(false));
    }

    #[test]
    fn load_rejects_zero_stripes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depcache.toml");
        std::fs::write(&path, "lock_stripes = 0\n").unwrap();

        assert!(matches!(CacheConfig::load(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depcache.toml");
        std::fs::write(&path, "max_age_days = \"soon\"\n").unwrap();

        let err = CacheConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("depcache.toml"));
    }

    #[test]
    fn load_missing_file() {
        let err = CacheConfig::load("/nonexistent/depcache.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
