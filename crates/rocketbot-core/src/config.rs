//! Bot configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Runtime settings, supplied by the content script at boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BotConfig {
    /// Polling period of the automation loop.
    pub poll_interval_ms: u32,
    /// Accelerated mode: type answers but leave the submit to a `pressEnter` consumer.
    pub race_mode: bool,
    /// Extension-relative path of the factor catalog.
    pub catalog_path: String,
    /// Upper bound on backspaces when clearing a wrong fraction answer.
    pub clear_attempts: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 700,
            race_mode: false,
            catalog_path: "factors_100.json".to_string(),
            clear_attempts: 6,
        }
    }
}

impl BotConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "pollIntervalMs",
                reason: "must be positive".into(),
            });
        }
        if self.clear_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "clearAttempts",
                reason: "must be positive".into(),
            });
        }
        if self.catalog_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "catalogPath",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(700));
        assert!(!config.race_mode);
        assert_eq!(config.catalog_path, "factors_100.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BotConfig::from_json(r#"{"raceMode": true}"#).unwrap();
        assert!(config.race_mode);
        assert_eq!(config.poll_interval_ms, 700);
        assert_eq!(config.clear_attempts, 6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            BotConfig::from_json(r#"{"pollIntervalMs": 0}"#),
            Err(ConfigError::Invalid { field: "pollIntervalMs", .. })
        ));
        assert!(matches!(
            BotConfig::from_json(r#"{"catalogPath": "  "}"#),
            Err(ConfigError::Invalid { field: "catalogPath", .. })
        ));
        assert!(matches!(BotConfig::from_json("42"), Err(ConfigError::Parse(_))));
    }
}
