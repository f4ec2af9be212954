// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor configuration.
//!
//! Settings are fixed at startup. They can be built in code with the
//! `with_*` methods or loaded from a JSON file:
//!
//! ```json
//! {
//!   "threshold_secs": 600,
//!   "tick_interval_ms": 1000,
//!   "topic_prefix": "projeto/smart-palafita",
//!   "rooms": ["sala", "quarto"],
//!   "broker_url": "mqtt://localhost:1883",
//!   "webhook_url": "http://localhost:3000/api/alerta/email"
//! }
//! ```
//!
//! Every key is optional; missing keys keep their default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::protocol::TopicLayout;
use crate::types::RoomId;

/// Directory name used under the platform data directory.
const APP_DIR_NAME: &str = "light-watchdog";

/// Runtime settings of the light watchdog.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use light_watchdog::MonitorConfig;
///
/// let config = MonitorConfig::default()
///     .with_threshold(Duration::from_secs(600))
///     .with_webhook_url("http://localhost:3000/api/alerta/email");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.rooms().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    threshold: Duration,
    tick_interval: Duration,
    topic_prefix: String,
    rooms: Vec<RoomId>,
    state_dir: Option<PathBuf>,
    broker_url: String,
    broker_credentials: Option<(String, String)>,
    webhook_url: Option<String>,
    webhook_timeout: Duration,
    log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let rooms = ["sala", "quarto"]
            .into_iter()
            .filter_map(|name| RoomId::new(name).ok())
            .collect();

        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            topic_prefix: TopicLayout::DEFAULT_PREFIX.to_string(),
            rooms,
            state_dir: None,
            broker_url: "mqtt://localhost:1883".to_string(),
            broker_credentials: None,
            webhook_url: None,
            webhook_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
        }
    }
}

/// On-disk shape of [`MonitorConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    threshold_secs: Option<u64>,
    tick_interval_ms: Option<u64>,
    topic_prefix: Option<String>,
    rooms: Option<Vec<String>>,
    state_dir: Option<PathBuf>,
    broker_url: Option<String>,
    broker_username: Option<String>,
    broker_password: Option<String>,
    webhook_url: Option<String>,
    webhook_timeout_secs: Option<u64>,
    log_level: Option<String>,
}

impl MonitorConfig {
    /// Default time a light may stay on before alerting.
    pub const DEFAULT_THRESHOLD: Duration = Duration::from_secs(10);
    /// Default time between reconciliation ticks.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid JSON
    /// for this schema, or holds out-of-range values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let mut config = Self::default();

        if let Some(secs) = raw.threshold_secs {
            config.threshold = Duration::from_secs(secs);
        }
        if let Some(ms) = raw.tick_interval_ms {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(prefix) = raw.topic_prefix {
            config.topic_prefix = prefix;
        }
        if let Some(rooms) = raw.rooms {
            config.rooms = rooms
                .into_iter()
                .map(RoomId::new)
                .collect::<Result<_, _>>()?;
        }
        config.state_dir = raw.state_dir;
        if let Some(url) = raw.broker_url {
            config.broker_url = url;
        }
        config.broker_credentials = match (raw.broker_username, raw.broker_password) {
            (Some(user), password) => Some((user, password.unwrap_or_default())),
            (None, Some(_)) => {
                return Err(ConfigError::Invalid {
                    field: "broker_password",
                    message: "set without broker_username".to_string(),
                });
            }
            (None, None) => None,
        };
        config.webhook_url = raw.webhook_url;
        if let Some(secs) = raw.webhook_timeout_secs {
            config.webhook_timeout = Duration::from_secs(secs);
        }
        if let Some(level) = raw.log_level {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold.is_zero() {
            return Err(invalid("threshold", "must be greater than zero"));
        }
        if self.tick_interval.is_zero() {
            return Err(invalid("tick_interval", "must be greater than zero"));
        }
        if self.topic_prefix.trim_matches('/').is_empty() {
            return Err(invalid("topic_prefix", "must not be empty"));
        }
        if self.topic_prefix.contains(['+', '#']) {
            return Err(invalid("topic_prefix", "must not contain MQTT wildcards"));
        }
        if self.broker_url.trim().is_empty() {
            return Err(invalid("broker_url", "must not be empty"));
        }
        if self.webhook_timeout.is_zero() {
            return Err(invalid("webhook_timeout", "must be greater than zero"));
        }
        Ok(())
    }

    /// Sets the alert threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the reconciliation tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sets the MQTT topic prefix.
    #[must_use]
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Replaces the rooms tracked from startup.
    #[must_use]
    pub fn with_rooms(mut self, rooms: impl IntoIterator<Item = RoomId>) -> Self {
        self.rooms = rooms.into_iter().collect();
        self
    }

    /// Sets the directory holding the persisted room state.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// Sets the MQTT broker URL.
    #[must_use]
    pub fn with_broker_url(mut self, url: impl Into<String>) -> Self {
        self.broker_url = url.into();
        self
    }

    /// Sets the MQTT broker credentials.
    #[must_use]
    pub fn with_broker_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.broker_credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the alert webhook. Without one, alerts are only logged.
    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Sets the default log filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Returns the alert threshold.
    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Returns the reconciliation tick interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Returns the MQTT topic layout.
    #[must_use]
    pub fn layout(&self) -> TopicLayout {
        TopicLayout::new(self.topic_prefix.as_str())
    }

    /// Returns the rooms tracked from startup.
    #[must_use]
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }

    /// Returns the MQTT broker URL.
    #[must_use]
    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }

    /// Returns the MQTT broker credentials, if set.
    #[must_use]
    pub fn broker_credentials(&self) -> Option<(&str, &str)> {
        self.broker_credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the alert webhook, if set.
    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    /// Returns the webhook request timeout.
    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        self.webhook_timeout
    }

    /// Returns the default log filter.
    #[must_use]
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Returns the state directory: the configured one, or
    /// `<data dir>/light-watchdog`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if no directory is configured and the
    /// platform has no data directory.
    pub fn state_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| invalid("state_dir", "could not determine data directory"))
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_firmware_setup() {
        let config = MonitorConfig::default();
        assert_eq!(config.threshold(), Duration::from_secs(10));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.layout(), TopicLayout::default());
        assert_eq!(
            config.rooms(),
            &[RoomId::new("sala").unwrap(), RoomId::new("quarto").unwrap()]
        );
        assert!(config.webhook_url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_keeps_defaults() {
        assert_eq!(MonitorConfig::from_json("{}").unwrap(), MonitorConfig::default());
    }

    #[test]
    fn full_document() {
        let config = MonitorConfig::from_json(
            r#"{
                "threshold_secs": 600,
                "tick_interval_ms": 250,
                "topic_prefix": "casa",
                "rooms": ["cozinha"],
                "state_dir": "/var/lib/lw",
                "broker_url": "mqtt://broker:1884",
                "broker_username": "lw",
                "broker_password": "secret",
                "webhook_url": "http://localhost/hook",
                "webhook_timeout_secs": 3,
                "log_level": "debug"
            }"#,
        )
        .unwrap();

        assert_eq!(config.threshold(), Duration::from_secs(600));
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.layout().prefix(), "casa");
        assert_eq!(config.rooms(), &[RoomId::new("cozinha").unwrap()]);
        assert_eq!(config.state_dir().unwrap(), PathBuf::from("/var/lib/lw"));
        assert_eq!(config.broker_url(), "mqtt://broker:1884");
        assert_eq!(config.broker_credentials(), Some(("lw", "secret")));
        assert_eq!(config.webhook_url(), Some("http://localhost/hook"));
        assert_eq!(config.webhook_timeout(), Duration::from_secs(3));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"threshold_secs": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "threshold", .. }));
    }

    #[test]
    fn wildcard_prefix_is_rejected() {
        let err = MonitorConfig::default()
            .with_topic_prefix("casa/#")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "topic_prefix", .. }));
    }

    #[test]
    fn invalid_room_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"rooms": ["sala/1"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Room(_)));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"treshold_secs": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn password_without_username_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"broker_password": "x"}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "broker_password",
                ..
            }
        ));
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"threshold_secs": 42}"#).unwrap();

        let config = MonitorConfig::from_file(&path).unwrap();
        assert_eq!(config.threshold(), Duration::from_secs(42));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = MonitorConfig::from_file("/nonexistent/light-watchdog.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn builder_overrides() {
        let config = MonitorConfig::default()
            .with_tick_interval(Duration::from_millis(100))
            .with_rooms([RoomId::new("varanda").unwrap()])
            .with_state_dir("/tmp/lw")
            .with_broker_url("tcp://10.0.0.2")
            .with_broker_credentials("u", "p")
            .with_log_level("warn");

        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.rooms().len(), 1);
        assert_eq!(config.state_dir().unwrap(), PathBuf::from("/tmp/lw"));
        assert_eq!(config.broker_url(), "tcp://10.0.0.2");
        assert_eq!(config.broker_credentials(), Some(("u", "p")));
        assert_eq!(config.log_level(), "warn");
    }
}
