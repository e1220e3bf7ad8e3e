//! Batcher configuration.
//!
//! Both values are fixed for the lifetime of an engine; a different configuration means a new
//! engine. On the wire the fields use the serving stack's names, `maxBatchSize` and
//! `maxLatency`, with the latency given in whole milliseconds.

use std::time::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::error::{Error, Result};

/// Default upper bound on items per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 32;

/// Default batch residency bound, in milliseconds
pub const DEFAULT_MAX_LATENCY_MS: u64 = 5000;

/// Size and latency bounds for batch formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatcherConfig {
    /// Upper bound on items per batch. A batch reaching this size is closed immediately.
    #[serde(default = "default_max_batch_size")]
    max_batch_size: usize,

    /// Longest an item waits before its batch is forced closed, even if under-full.
    #[serde(
        default = "default_max_latency",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    max_latency: Duration,
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_max_latency() -> Duration {
    Duration::from_millis(DEFAULT_MAX_LATENCY_MS)
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

impl BatcherConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `max_batch_size` is zero.
    pub fn new(max_batch_size: usize, max_latency: Duration) -> Result<Self> {
        let config = Self {
            max_batch_size,
            max_latency,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants a deserialized configuration cannot enforce by itself.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(Error::InvalidConfig("maxBatchSize must be positive".to_string()));
        }
        Ok(())
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn max_latency(&self) -> Duration {
        self.max_latency
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_latency: default_max_latency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BatcherConfig::default();
        assert_eq!(config.max_batch_size(), 32);
        assert_eq!(config.max_latency(), Duration::from_millis(5000));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = BatcherConfig::new(0, Duration::from_millis(10));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_latency_allowed() {
        let config = BatcherConfig::new(4, Duration::ZERO).unwrap();
        assert_eq!(config.max_latency(), Duration::ZERO);
    }

    #[test]
    fn test_deserialize_wire_names() {
        let config: BatcherConfig = serde_json::from_str(r#"{"maxBatchSize": 8, "maxLatency": 250}"#).unwrap();
        assert_eq!(config.max_batch_size(), 8);
        assert_eq!(config.max_latency(), Duration::from_millis(250));
    }

    #[test]
    fn test_deserialize_missing_fields_use_defaults() {
        let config: BatcherConfig = serde_json::from_str(r#"{"maxLatency": 100}"#).unwrap();
        assert_eq!(config.max_batch_size(), DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(config.max_latency(), Duration::from_millis(100));
    }

    #[test]
    fn test_deserialized_zero_size_fails_validation() {
        let config: BatcherConfig = serde_json::from_str(r#"{"maxBatchSize": 0}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialize_millis() {
        let config = BatcherConfig::new(16, Duration::from_millis(40)).unwrap();
        let value = serde_json::to_value(config).unwrap();
        assert_eq!(value["maxBatchSize"], 16);
        assert_eq!(value["maxLatency"], 40);
    }
}
