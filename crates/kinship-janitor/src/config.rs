//! Configuration for Janitor operations
//!
//! Defines the repair interval, job retention and which repairs run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Janitor service
///
/// # Examples
///
/// ```
/// use kinship_janitor::JanitorConfig;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.repair_interval_secs, 900);
///
/// let config = JanitorConfig::aggressive();
/// assert_eq!(config.repair_interval_secs, 120);
///
/// let config = JanitorConfig::lenient();
/// assert_eq!(config.repair_interval_secs, 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// How often the background worker repairs every network (seconds)
    /// Default: 15 minutes
    pub repair_interval_secs: u64,

    /// How long finished or abandoned re-inference jobs stay readable (seconds)
    /// Default: 1 hour
    pub job_ttl_secs: u64,

    /// Dry-run mode: log repairs without writing them
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Confirm pending inferred rows found inside a network
    /// Default: true
    #[serde(default = "default_auto_promote")]
    pub auto_promote: bool,

    /// Insert the missing reverse of half-written inferred pairs
    /// Default: true
    #[serde(default = "default_auto_backfill")]
    pub auto_backfill: bool,
}

fn default_auto_promote() -> bool {
    true
}

fn default_auto_backfill() -> bool {
    true
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            repair_interval_secs: 15 * 60,
            job_ttl_secs: 60 * 60,
            dry_run: false,
            auto_promote: true,
            auto_backfill: true,
        }
    }
}

impl JanitorConfig {
    /// Frequent repairs, short job retention
    pub fn aggressive() -> Self {
        Self {
            repair_interval_secs: 2 * 60,
            job_ttl_secs: 15 * 60,
            ..Self::default()
        }
    }

    /// Infrequent repairs, long job retention; suits development databases
    pub fn lenient() -> Self {
        Self {
            repair_interval_secs: 60 * 60,
            job_ttl_secs: 6 * 60 * 60,
            ..Self::default()
        }
    }

    /// Repair interval as Duration
    pub fn repair_interval(&self) -> Duration {
        Duration::from_secs(self.repair_interval_secs)
    }

    /// Job retention as Duration
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.repair_interval_secs == 0 {
            return Err("repair_interval_secs must be greater than 0".to_string());
        }
        if self.job_ttl_secs == 0 {
            return Err("job_ttl_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert_eq!(config.repair_interval_secs, 900);
        assert_eq!(config.job_ttl_secs, 3600);
        assert!(!config.dry_run);
        assert!(config.auto_promote);
        assert!(config.auto_backfill);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_order() {
        let aggressive = JanitorConfig::aggressive();
        let lenient = JanitorConfig::lenient();
        let default = JanitorConfig::default();
        assert!(aggressive.repair_interval_secs < default.repair_interval_secs);
        assert!(lenient.repair_interval_secs > default.repair_interval_secs);
        assert!(aggressive.job_ttl() < lenient.job_ttl());
    }

    #[test]
    fn test_duration_conversions() {
        let config = JanitorConfig::default();
        assert_eq!(config.repair_interval(), Duration::from_secs(15 * 60));
        assert_eq!(config.job_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_switches_default_when_missing() {
        let config: JanitorConfig =
            serde_json::from_str(r#"{"repair_interval_secs": 60, "job_ttl_secs": 60}"#).unwrap();
        assert!(!config.dry_run);
        assert!(config.auto_promote);
        assert!(config.auto_backfill);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = JanitorConfig {
            repair_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
