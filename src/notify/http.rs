// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Webhook notifier.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::NotifyError;
use crate::state::LightAlert;

use super::Notifier;

/// Configuration for an [`HttpNotifier`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use light_watchdog::notify::HttpNotifierConfig;
///
/// let config = HttpNotifierConfig::new("http://localhost:3000/api/alerta/email")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpNotifierConfig {
    url: String,
    timeout: Duration,
    bearer_token: Option<String>,
}

impl HttpNotifierConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            bearer_token: None,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates the notifier.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be created.
    pub fn into_notifier(self) -> Result<HttpNotifier, NotifyError> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(HttpNotifier {
            url: self.url,
            client,
            bearer_token: self.bearer_token,
        })
    }
}

/// Posts each alert as JSON to a webhook.
///
/// The body is `{"message": ..., "comodo": ..., "elapsed_secs": ...}`, where
/// `comodo` is the room identifier expected by the dashboard's alert route.
/// Any non-2xx answer is reported as [`NotifyError::Rejected`].
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    url: String,
    client: Client,
    bearer_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    message: String,
    comodo: &'a str,
    elapsed_secs: u64,
}

impl HttpNotifier {
    /// Creates a notifier posting to `url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be created.
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        HttpNotifierConfig::new(url).into_notifier()
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for HttpNotifier {
    async fn send(&self, alert: LightAlert) -> Result<(), NotifyError> {
        let payload = AlertPayload {
            message: alert.message(),
            comodo: alert.room().as_str(),
            elapsed_secs: alert.elapsed().as_secs(),
        };

        tracing::debug!(url = %self.url, room = %alert.room(), "Posting alert");

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(room = %alert.room(), status = status.as_u16(), "Alert delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = HttpNotifierConfig::new("http://localhost/hook");
        assert_eq!(config.url(), "http://localhost/hook");
        assert_eq!(config.timeout(), HttpNotifierConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn new_keeps_url() {
        let notifier = HttpNotifier::new("http://localhost/hook").unwrap();
        assert_eq!(notifier.url(), "http://localhost/hook");
    }

    #[test]
    fn payload_shape() {
        let payload = AlertPayload {
            message: "hello".to_string(),
            comodo: "sala",
            elapsed_secs: 12,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "hello", "comodo": "sala", "elapsed_secs": 12})
        );
    }
}
