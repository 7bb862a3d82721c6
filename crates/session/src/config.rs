//! Session configuration.
//!
//! Every field has a default matching the standard page behavior, so an
//! empty JSON object (or no file at all) is a valid configuration.

use chrono::Duration;
use folio_evolution::{RefirePolicy, RuleError, RuleSet};
use folio_storage::StorageKeys;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A cooldown override names an unknown rule.
    #[error("invalid rule override: {0}")]
    Rule(#[from] RuleError),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Upper bound for every configured duration: one day.
pub const MAX_DURATION_MS: u64 = 86_400_000;

/// Timing, persistence and rule settings for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Period of the evaluation timer
    pub evaluation_interval_ms: u64,

    /// Period of the statistics flush timer
    pub flush_interval_ms: u64,

    /// Delay between a click and the evaluation it schedules
    pub click_check_delay_ms: u64,

    /// How long a notice stays visible
    pub notice_duration_ms: u64,

    /// Whether applied rules may fire again after their cooldown
    pub refire_policy: RefirePolicy,

    /// Keys of the persisted blobs
    pub storage_keys: StorageKeys,

    /// Per-rule cooldown overrides, by rule name
    pub cooldowns_ms: BTreeMap<String, u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_ms: 10_000,
            flush_interval_ms: 30_000,
            click_check_delay_ms: 1_000,
            notice_duration_ms: 5_000,
            refire_policy: RefirePolicy::Once,
            storage_keys: StorageKeys::default(),
            cooldowns_ms: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Json`] if it is not valid JSON, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the periods are non-zero and every duration is at most
    /// [`MAX_DURATION_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("evaluationIntervalMs", self.evaluation_interval_ms),
            ("flushIntervalMs", self.flush_interval_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }

        let durations = [
            ("evaluationIntervalMs".to_string(), self.evaluation_interval_ms),
            ("flushIntervalMs".to_string(), self.flush_interval_ms),
            ("clickCheckDelayMs".to_string(), self.click_check_delay_ms),
            ("noticeDurationMs".to_string(), self.notice_duration_ms),
        ]
        .into_iter()
        .chain(
            self.cooldowns_ms
                .iter()
                .map(|(rule, ms)| (format!("cooldownsMs.{rule}"), *ms)),
        );
        for (name, value) in durations {
            if value > MAX_DURATION_MS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at most {MAX_DURATION_MS} ms"
                )));
            }
        }
        Ok(())
    }

    /// The built-in rules with this configuration's cooldown overrides.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        self.validate()?;
        let mut rules = RuleSet::builtin();
        for (name, ms) in &self.cooldowns_ms {
            rules = rules.with_cooldown(name, millis(*ms))?;
        }
        Ok(rules)
    }

    /// Evaluation period.
    pub fn evaluation_interval(&self) -> Duration {
        millis(self.evaluation_interval_ms)
    }

    /// Flush period.
    pub fn flush_interval(&self) -> Duration {
        millis(self.flush_interval_ms)
    }

    /// Post-click evaluation delay.
    pub fn click_check_delay(&self) -> Duration {
        millis(self.click_check_delay_ms)
    }

    /// Notice lifetime.
    pub fn notice_duration(&self) -> Duration {
        millis(self.notice_duration_ms)
    }
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_evolution::CTA_OPTIMIZATION;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(SessionConfig::parse("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::parse(
            r#"{
                "evaluationIntervalMs": 2000,
                "refirePolicy": "after_cooldown",
                "storageKeys": { "history": "h" },
                "cooldownsMs": { "cta_optimization": 500 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.evaluation_interval(), Duration::seconds(2));
        assert_eq!(config.flush_interval(), Duration::seconds(30));
        assert_eq!(config.refire_policy, RefirePolicy::AfterCooldown);
        assert_eq!(config.storage_keys.history, "h");
        assert_eq!(config.storage_keys.interactions, "portfolioInteractions");

        let rules = config.rule_set().unwrap();
        assert_eq!(
            rules.get(CTA_OPTIMIZATION).map(|r| r.cooldown),
            Some(Duration::milliseconds(500))
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = SessionConfig::parse(r#"{"flushIntervalMs": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_oversized_durations_rejected() {
        for json in [
            r#"{"noticeDurationMs": 18446744073709551615}"#,
            r#"{"evaluationIntervalMs": 9000000000000000000}"#,
            r#"{"clickCheckDelayMs": 86400001}"#,
            r#"{"cooldownsMs": {"content_reveal": 18446744073709551615}}"#,
        ] {
            let err = SessionConfig::parse(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}");
        }
        let config = SessionConfig::parse(r#"{"noticeDurationMs": 86400000}"#).unwrap();
        assert_eq!(config.notice_duration(), Duration::days(1));
    }

    #[test]
    fn test_rule_set_validates_hand_built_config() {
        let config = SessionConfig {
            flush_interval_ms: u64::MAX,
            ..SessionConfig::default()
        };
        assert!(matches!(config.rule_set(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_rule_override_rejected() {
        let mut config = SessionConfig::default();
        config.cooldowns_ms.insert("nope".into(), 1);
        assert!(matches!(config.rule_set(), Err(ConfigError::Rule(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, r#"{"noticeDurationMs": 2500}"#).unwrap();
        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.notice_duration(), Duration::milliseconds(2500));
        assert!(matches!(
            SessionConfig::from_file(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
