//! Console configuration
//!
//! All fields are defaulted, so a config file only needs the keys it
//! overrides. Environment variables are applied on top via
//! [`ConsoleConfig::from_env`].

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`ConsoleConfig::base_url`]
pub const ENV_BASE_URL: &str = "A3S_CONSOLE_BASE_URL";
/// Environment variable overriding [`ConsoleConfig::default_user_id`]
pub const ENV_USER_ID: &str = "A3S_CONSOLE_USER_ID";
/// Environment variable overriding [`ConsoleConfig::request_timeout_secs`]
pub const ENV_TIMEOUT_SECS: &str = "A3S_CONSOLE_TIMEOUT_SECS";

/// Top-level console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Origin every endpoint is resolved against
    pub base_url: String,

    /// User id the chat session starts with
    pub default_user_id: String,

    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Text shown when a loaded transcript is empty
    pub welcome_message: String,

    /// Banner timings
    pub notifications: NotificationConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            default_user_id: "user1".to_string(),
            request_timeout_secs: None,
            welcome_message: "Welcome! How can I help you today?".to_string(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConsoleError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: ConsoleConfig = serde_json::from_str(&json).map_err(|e| {
            ConsoleError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Apply `A3S_CONSOLE_*` environment overrides
    pub fn from_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(user) = lookup(ENV_USER_ID) {
            self.default_user_id = user;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                ConsoleError::Config(format!("{} must be a whole number: {}", ENV_TIMEOUT_SECS, e))
            })?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(self)
    }

    /// Reject configurations no panel can work with
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConsoleError::Config("baseUrl must not be empty".to_string()));
        }
        if self.default_user_id.trim().is_empty() {
            return Err(ConsoleError::Config(
                "defaultUserId must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConsoleError::Config(
                "requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Banner lifecycle timings, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationConfig {
    /// Delay before a new banner becomes visible (transition-in)
    pub show_delay_ms: u64,
    /// Delay between hiding a banner and removing it (transition-out)
    pub transition_ms: u64,
    pub error_display_ms: u64,
    pub success_display_ms: u64,
    pub info_display_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show_delay_ms: 100,
            transition_ms: 300,
            error_display_ms: 5_000,
            success_display_ms: 3_000,
            info_display_ms: 3_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.default_user_id, "user1");
        assert!(config.request_timeout().is_none());
        assert_eq!(config.notifications.error_display_ms, 5_000);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ConsoleConfig = serde_json::from_str(
            r#"{"baseUrl": "http://agent.local", "notifications": {"errorDisplayMs": 10}}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://agent.local");
        assert_eq!(config.default_user_id, "user1");
        assert_eq!(config.notifications.error_display_ms, 10);
        assert_eq!(config.notifications.show_delay_ms, 100);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://10.0.0.5:9000"),
            (ENV_USER_ID, "ops"),
            (ENV_TIMEOUT_SECS, " 30 "),
        ]
        .into_iter()
        .collect();

        let config = ConsoleConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.default_user_id, "ops");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_bad_timeout_override() {
        let result = ConsoleConfig::default().with_overrides(|k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut config = ConsoleConfig::default();
        config.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = ConsoleConfig::default();
        config.default_user_id = String::new();
        assert!(config.validate().is_err());

        let mut config = ConsoleConfig::default();
        config.request_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        std::fs::write(&path, r#"{"defaultUserId": "alice"}"#).unwrap();
        let config = ConsoleConfig::from_file(&path).unwrap();
        assert_eq!(config.default_user_id, "alice");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConsoleConfig::from_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConsoleError::Config(_))));
    }
}
