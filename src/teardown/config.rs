//! Teardown configuration
//!
//! Every field is optional in the config document; missing fields take the
//! defaults below. Durations are integer milliseconds.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cluster::AdminErrorKind;

use super::errors::{DeleteError, DeleteResult};

/// Delete-collection tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfig {
    /// How long to wait for the collection to leave the cached view
    #[serde(default = "default_convergence_timeout_ms")]
    pub convergence_timeout_ms: u64,

    /// Pause between view checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after the collection is first seen absent
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Admin error kinds meaning the replica is already gone
    #[serde(default = "default_already_absent_errors")]
    pub already_absent_errors: BTreeSet<AdminErrorKind>,
}

fn default_convergence_timeout_ms() -> u64 {
    30_000
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_already_absent_errors() -> BTreeSet<AdminErrorKind> {
    BTreeSet::from([AdminErrorKind::NonExistentCore])
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            convergence_timeout_ms: default_convergence_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            already_absent_errors: default_already_absent_errors(),
        }
    }
}

impl DeleteConfig {
    /// Parse and validate a config document.
    pub fn from_json(json: &str) -> DeleteResult<Self> {
        let config: DeleteConfig = serde_json::from_str(json)
            .map_err(|e| DeleteError::InvalidConfig(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check durations are positive and the poll interval fits in the timeout.
    pub fn validate(&self) -> DeleteResult<()> {
        if self.convergence_timeout_ms == 0 {
            return Err(DeleteError::InvalidConfig(
                "convergence_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(DeleteError::InvalidConfig(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.settle_delay_ms == 0 {
            return Err(DeleteError::InvalidConfig(
                "settle_delay_ms must be > 0".to_string(),
            ));
        }
        if self.poll_interval_ms > self.convergence_timeout_ms {
            return Err(DeleteError::InvalidConfig(format!(
                "poll_interval_ms ({}) must not exceed convergence_timeout_ms ({})",
                self.poll_interval_ms, self.convergence_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn convergence_timeout(&self) -> Duration {
        Duration::from_millis(self.convergence_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Builder-style override of the convergence deadline.
    pub fn with_convergence_timeout(mut self, timeout: Duration) -> Self {
        self.convergence_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder-style override of the already-absent allow-list.
    pub fn with_already_absent_errors(mut self, kinds: &[AdminErrorKind]) -> Self {
        self.already_absent_errors = kinds.iter().copied().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeleteConfig::default();
        assert_eq!(config.convergence_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert!(config.already_absent_errors.contains(&AdminErrorKind::NonExistentCore));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = DeleteConfig::from_json(r#"{"poll_interval_ms": 250}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.convergence_timeout_ms, 30_000);
        assert_eq!(config.already_absent_errors.len(), 1);
    }

    #[test]
    fn test_allow_list_parses_snake_case_kinds() {
        let config = DeleteConfig::from_json(
            r#"{"already_absent_errors": ["non_existent_core", "unreachable"]}"#,
        )
        .unwrap();
        assert!(config.already_absent_errors.contains(&AdminErrorKind::Unreachable));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = DeleteConfig::from_json(r#"{"settle_delay_ms": 0}"#).unwrap_err();
        assert!(matches!(err, DeleteError::InvalidConfig(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_poll_interval_longer_than_timeout_rejected() {
        let err =
            DeleteConfig::from_json(r#"{"convergence_timeout_ms": 50, "poll_interval_ms": 100}"#)
                .unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let config = DeleteConfig::default().with_convergence_timeout(Duration::MAX);
        assert_eq!(config.convergence_timeout_ms, u64::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(DeleteConfig::from_json("{not json").is_err());
    }
}
