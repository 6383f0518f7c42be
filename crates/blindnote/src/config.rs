//! Service configuration.
//!
//! Deserializable from any serde format; missing fields take their defaults.

use std::time::Duration;

use blindnote_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Configuration for the [`NoteService`](crate::NoteService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Shortest lifetime a sender may choose.
    pub min_ttl_minutes: u32,
    /// Longest lifetime a sender may choose.
    pub max_ttl_minutes: u32,
    /// Lifetime used when a request doesn't name one.
    pub default_ttl_minutes: u32,
    /// Largest accepted wire blob.
    pub max_ciphertext_bytes: usize,
    /// Bound on each storage operation.
    pub storage_timeout_ms: u64,
    /// Period of the background purge.
    pub purge_interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_ttl_minutes: 15,
            max_ttl_minutes: 10_080,
            default_ttl_minutes: 60,
            max_ciphertext_bytes: 10 * 1024 * 1024,
            storage_timeout_ms: 5_000,
            purge_interval_secs: 3_600,
        }
    }
}

impl ServiceConfig {
    /// Reject configurations the service can't run with.
    pub fn validate(&self) -> Result<()> {
        if self.min_ttl_minutes == 0 || self.min_ttl_minutes > self.max_ttl_minutes {
            return Err(ServiceError::InvalidConfig(format!(
                "ttl bounds {}..={} are empty or start at zero",
                self.min_ttl_minutes, self.max_ttl_minutes
            )));
        }
        if !(self.min_ttl_minutes..=self.max_ttl_minutes).contains(&self.default_ttl_minutes) {
            return Err(ServiceError::InvalidConfig(format!(
                "default ttl {} is outside {}..={}",
                self.default_ttl_minutes, self.min_ttl_minutes, self.max_ttl_minutes
            )));
        }
        if self.max_ciphertext_bytes == 0 {
            return Err(ServiceError::InvalidConfig("max_ciphertext_bytes is zero".into()));
        }
        if self.storage_timeout_ms == 0 || self.purge_interval_secs == 0 {
            return Err(ServiceError::InvalidConfig(
                "timeouts and intervals must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Store tuning derived from this configuration.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            op_timeout: self.storage_timeout(),
            ..StoreConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store_config().op_timeout, Duration::from_secs(5));
        assert_eq!(config.purge_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{ "max_ttl_minutes": 1440, "purge_interval_secs": 60 }"#)
                .unwrap();

        assert_eq!(config.max_ttl_minutes, 1440);
        assert_eq!(config.purge_interval_secs, 60);
        assert_eq!(config.min_ttl_minutes, 15);
        assert_eq!(config.default_ttl_minutes, 60);
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let inverted = ServiceConfig {
            min_ttl_minutes: 100,
            max_ttl_minutes: 10,
            ..ServiceConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(ServiceError::InvalidConfig(_))));

        let default_outside = ServiceConfig {
            default_ttl_minutes: 5,
            ..ServiceConfig::default()
        };
        assert!(default_outside.validate().is_err());

        let no_interval = ServiceConfig {
            purge_interval_secs: 0,
            ..ServiceConfig::default()
        };
        assert!(no_interval.validate().is_err());
    }
}
