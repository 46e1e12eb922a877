// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: thresholds inside [0, 1],
//! the ordering of the similarity bands, positive durations and sizes.

use crate::diagnostic::ConfigError;
use crate::model::TenetConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing fast.
pub fn validate_config(config: &TenetConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let memory = &config.memory;

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let unit_fields = [
        ("reinforce_threshold", memory.reinforce_threshold),
        ("contradiction_band", memory.contradiction_band),
        ("prune_threshold", memory.prune_threshold),
        ("stale_watermark", memory.stale_watermark),
        ("reinforce_step", memory.reinforce_step),
        ("initial_confidence", memory.initial_confidence),
        ("insight_confidence", memory.insight_confidence),
        ("meta_confidence", memory.meta_confidence),
        ("duplicate_threshold", memory.duplicate_threshold),
    ];
    for (name, value) in unit_fields {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("memory.{name} must be within [0, 1], got {value}"),
            });
        }
    }

    if memory.contradiction_band >= memory.reinforce_threshold {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.contradiction_band ({}) must be below memory.reinforce_threshold ({})",
                memory.contradiction_band, memory.reinforce_threshold
            ),
        });
    }

    if memory.decay_half_life_days <= 0.0 || !memory.decay_half_life_days.is_finite() {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.decay_half_life_days must be positive, got {}",
                memory.decay_half_life_days
            ),
        });
    }

    if memory.search_k == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.search_k must be at least 1".to_string(),
        });
    }

    if memory.consolidation_max_turns < memory.consolidation_min_turns {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.consolidation_max_turns ({}) must not be below consolidation_min_turns ({})",
                memory.consolidation_max_turns, memory.consolidation_min_turns
            ),
        });
    }

    if memory.model_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.model_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.knowledge.chunk_max_words == 0 {
        errors.push(ConfigError::Validation {
            message: "knowledge.chunk_max_words must be at least 1".to_string(),
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

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TenetConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TenetConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn inverted_bands_fail_validation() {
        let mut config = TenetConfig::default();
        config.memory.contradiction_band = 0.9;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "contradiction_band"));
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let mut config = TenetConfig::default();
        config.memory.prune_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "memory.prune_threshold"));
    }

    #[test]
    fn non_positive_half_life_fails_validation() {
        let mut config = TenetConfig::default();
        config.memory.decay_half_life_days = 0.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "decay_half_life_days"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = TenetConfig::default();
        config.memory.search_k = 0;
        config.knowledge.chunk_max_words = 0;
        config.memory.model_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: TenetConfig = toml::from_str("[memory]\nsearch_k = 8\n").unwrap();
        assert_eq!(config.memory.search_k, 8);
        assert_eq!(config.memory.prune_threshold, 0.05);
        assert_eq!(config.knowledge.chunk_max_words, 300);
    }
}
