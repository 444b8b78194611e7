use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::params::Parameters;

pub const DEFAULT_DESIRED_RETENTION: f64 = 0.9;
pub const DEFAULT_MAXIMUM_INTERVAL_DAYS: f64 = 36_500.0;
/// Largest accepted `maximum_interval_days`, about a thousand years
pub const MAXIMUM_INTERVAL_DAYS_LIMIT: f64 = 365_250.0;

/// Scheduler settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Recall probability at which the next review is due (0.7-0.99, typically 0.9)
    pub desired_retention: f64,
    pub maximum_interval_days: f64,
    pub weights: Parameters,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_retention: DEFAULT_DESIRED_RETENTION,
            maximum_interval_days: DEFAULT_MAXIMUM_INTERVAL_DAYS,
            weights: Parameters::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_desired_retention(mut self, desired_retention: f64) -> Self {
        self.desired_retention = desired_retention;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, SchedulerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(SchedulerError::InvalidConfig(format!(
                "desired_retention {} must be strictly between 0 and 1",
                self.desired_retention
            )));
        }
        if !(1.0..=MAXIMUM_INTERVAL_DAYS_LIMIT).contains(&self.maximum_interval_days) {
            return Err(SchedulerError::InvalidConfig(format!(
                "maximum_interval_days {} must be between 1 and {MAXIMUM_INTERVAL_DAYS_LIMIT}",
                self.maximum_interval_days
            )));
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_WEIGHTS;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.desired_retention, 0.9);
        assert_eq!(config.weights.weights(), &DEFAULT_WEIGHTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SchedulerConfig::from_json(r#"{ "desired_retention": 0.85 }"#).unwrap();
        assert_eq!(config.desired_retention, 0.85);
        assert_eq!(config.maximum_interval_days, DEFAULT_MAXIMUM_INTERVAL_DAYS);
        assert_eq!(config.weights, Parameters::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            SchedulerConfig::from_json(r#"{ "desired_retention": 1.0 }"#),
            Err(SchedulerError::InvalidConfig(_))
        ));
        assert!(SchedulerConfig::from_json(r#"{ "maximum_interval_days": 0 }"#).is_err());
        assert!(matches!(
            SchedulerConfig::from_json(r#"{ "maximum_interval_days": 1e15 }"#),
            Err(SchedulerError::InvalidConfig(_))
        ));
        assert!(matches!(
            SchedulerConfig::from_json(r#"{ "weights": [1.0, 2.0] }"#),
            Err(SchedulerError::Json(_))
        ));
    }
}
