// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT event source for the LED controllers.
//!
//! [`MqttEventSource`] keeps one broker connection open, subscribes to every
//! room's state topic and forwards decoded [`LightEvent`]s over an `mpsc`
//! channel. Malformed messages are logged and dropped here so that nothing
//! downstream ever sees a loosely typed payload.
//!
//! # Examples
//!
//! ```no_run
//! use light_watchdog::protocol::MqttEventSource;
//!
//! # async fn example() -> light_watchdog::Result<()> {
//! let (source, mut events) = MqttEventSource::builder()
//!     .url("mqtt://192.168.1.50:1883")?
//!     .build()
//!     .await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{} is now {}", event.room(), event.kind());
//! }
//!
//! source.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::{mpsc, oneshot};

use crate::error::ProtocolError;
use crate::event::LightEvent;
use crate::types::{RgbColor, RoomId};

use super::TopicLayout;

/// Global counter for generating unique client IDs.
static SOURCE_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for an MQTT event source.
#[derive(Debug, Clone)]
pub(crate) struct MqttSourceConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
    channel_capacity: usize,
    layout: TopicLayout,
}

impl Default for MqttSourceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(3),
            channel_capacity: 64,
            layout: TopicLayout::default(),
        }
    }
}

/// A broker connection feeding light events into the monitor.
///
/// Cheaply cloneable; every clone shares the same connection.
#[derive(Clone)]
pub struct MqttEventSource {
    inner: Arc<MqttSourceInner>,
}

struct MqttSourceInner {
    /// The MQTT async client for publishing.
    client: AsyncClient,
    /// Client identifier presented to the broker.
    client_id: String,
    /// Configuration used for this connection.
    config: MqttSourceConfig,
    /// Connection status.
    connected: AtomicBool,
    /// Set once `disconnect` was requested.
    stopping: AtomicBool,
}

impl MqttEventSource {
    /// Creates a new builder for configuring the event source.
    #[must_use]
    pub fn builder() -> MqttEventSourceBuilder {
        MqttEventSourceBuilder::default()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the client identifier presented to the broker.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Returns the topic layout in use.
    #[must_use]
    pub fn layout(&self) -> &TopicLayout {
        &self.inner.config.layout
    }

    /// Sets the color of a room's LED strip.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Mqtt`] if the request cannot be queued.
    pub async fn publish_color(&self, room: &RoomId, color: RgbColor) -> Result<(), ProtocolError> {
        let topic = self.layout().command_topic(room);
        let payload = color.to_payload();

        tracing::debug!(topic = %topic, payload = %payload, "Publishing LED command");

        self.inner
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }

    /// Switches a room's LED strip off.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Mqtt`] if the request cannot be queued.
    pub async fn turn_off(&self, room: &RoomId) -> Result<(), ProtocolError> {
        self.publish_color(room, RgbColor::black()).await
    }

    /// Disconnects from the broker and stops forwarding events.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.stopping.store(true, Ordering::Release);
        self.inner.client.disconnect().await?;
        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn subscribe_state_topics(&self) {
        let filter = self.layout().state_filter();
        // try_subscribe: the event loop task must never wait on its own queue
        match self.inner.client.try_subscribe(&filter, QoS::AtLeastOnce) {
            Ok(()) => tracing::debug!(filter = %filter, "Subscribed to light state topics"),
            Err(e) => tracing::warn!(filter = %filter, error = %e, "Failed to subscribe"),
        }
    }
}

impl std::fmt::Debug for MqttEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttEventSource")
            .field("client_id", &self.inner.client_id)
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("prefix", &self.inner.config.layout.prefix())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for an [`MqttEventSource`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use light_watchdog::protocol::{MqttEventSource, TopicLayout};
///
/// # async fn example() -> light_watchdog::Result<()> {
/// let (source, events) = MqttEventSource::builder()
///     .host("192.168.1.50")
///     .port(1883)
///     .credentials("user", "password")
///     .layout(TopicLayout::new("casa"))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttEventSourceBuilder {
    config: MqttSourceConfig,
}

impl MqttEventSourceBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets host and port from a `mqtt://host:port` style URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] if the port is not a number.
    pub fn url(mut self, url: &str) -> Result<Self, ProtocolError> {
        let (host, port) = parse_broker_url(url)?;
        self.config.host = host;
        self.config.port = port;
        Ok(self)
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the pause before reconnecting after a lost connection
    /// (default: 3 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Sets how many decoded events may wait for the consumer (default: 64).
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    /// Sets the topic layout (default: [`TopicLayout::default`]).
    #[must_use]
    pub fn layout(mut self, layout: TopicLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Connects to the broker and starts forwarding light events.
    ///
    /// The returned receiver yields one [`LightEvent`] per valid state
    /// message. Dropping it stops the background task.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> Result<(MqttEventSource, mpsc::Receiver<LightEvent>), ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let counter = SOURCE_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("light_watchdog_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity);

        let source = MqttEventSource {
            inner: Arc::new(MqttSourceInner {
                client,
                client_id,
                config: self.config.clone(),
                connected: AtomicBool::new(false),
                stopping: AtomicBool::new(false),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();

        let source_clone = source.clone();
        tokio::spawn(async move {
            handle_source_events(event_loop, source_clone, event_tx, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    filter = %self.config.layout.state_filter(),
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                source.inner.stopping.store(true, Ordering::Release);
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        Ok((source, event_rx))
    }
}

/// Parses a broker URL into host and port.
///
/// Accepts `mqtt://`, `tcp://` or no scheme; the port defaults to 1883.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidAddress`] if the host is empty or the port
/// is not a number.
pub fn parse_broker_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url)
        .trim_end_matches('/');

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress(
            "MQTT broker host is required".to_string(),
        ));
    }

    Ok((host, port))
}

/// Drives the MQTT event loop until the source is dropped or disconnected.
async fn handle_source_events(
    mut event_loop: EventLoop,
    source: MqttEventSource,
    event_tx: mpsc::Sender<LightEvent>,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                source.inner.connected.store(true, Ordering::Release);
                // Clean sessions drop subscriptions, so resubscribe on every ConnAck
                source.subscribe_state_topics();
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let decoded = source
                    .layout()
                    .decode(&publish.topic, &publish.payload, Utc::now());
                match decoded {
                    Ok(event) => {
                        tracing::debug!(
                            topic = %publish.topic,
                            room = %event.room(),
                            kind = %event.kind(),
                            "Light event received"
                        );
                        if event_tx.send(event).await.is_err() {
                            tracing::debug!("Light event receiver dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            topic = %publish.topic,
                            error = %e,
                            "Dropping malformed light message"
                        );
                    }
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                source.inner.connected.store(false, Ordering::Release);
            }
            Ok(_) => {}
            Err(e) => {
                source.inner.connected.store(false, Ordering::Release);
                if connack_tx.is_some() || source.inner.stopping.load(Ordering::Acquire) {
                    tracing::debug!(error = %e, "MQTT event loop stopped");
                    break;
                }
                if event_tx.is_closed() {
                    break;
                }
                tracing::warn!(error = %e, "MQTT connection lost, reconnecting");
                tokio::time::sleep(source.inner.config.reconnect_delay).await;
            }
        }
    }
}
