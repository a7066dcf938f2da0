// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty hosts and sane queue limits.

use crate::diagnostic::ConfigError;
use crate::model::ConsultEaseConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ConsultEaseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !VALID_LOG_LEVELS.contains(&config.system.log_level.to_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "system.log_level must be one of {}, got `{}`",
                VALID_LOG_LEVELS.join(", "),
                config.system.log_level
            ),
        });
    }

    if config.broker.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "broker.host must not be empty".to_string(),
        });
    }

    if config.broker.client_id.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "broker.client_id must not be empty".to_string(),
        });
    }

    if config.broker.keep_alive_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "broker.keep_alive_secs must be greater than zero".to_string(),
        });
    }

    if config.broker.publish_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "broker.publish_timeout_ms must be greater than zero".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.queue.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.max_attempts must be at least 1".to_string(),
        });
    }

    if config.queue.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.sweep_interval_secs must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ConsultEaseConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_broker_host_rejected() {
        let mut config = ConsultEaseConfig::default();
        config.broker.host = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("broker.host")));
    }

    #[test]
    fn zero_max_attempts_rejected() {
        let mut config = ConsultEaseConfig::default();
        config.queue.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("queue.max_attempts")));
    }

    #[test]
    fn bogus_log_level_rejected() {
        let mut config = ConsultEaseConfig::default();
        config.system.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("system.log_level")));
    }

    #[test]
    fn multiple_errors_collected() {
        let mut config = ConsultEaseConfig::default();
        config.broker.host = String::new();
        config.queue.max_attempts = 0;
        config.storage.database_path = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
