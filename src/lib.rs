// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light Watchdog - alerts when a room's light is left on.
//!
//! Each room's LED controller reports `ON` and `OFF` over MQTT. The watchdog
//! keeps a small state machine per room, mirrors it into a durable store so
//! restarts do not lose open on-periods, and raises exactly one alert per
//! on-period once the light has been on for longer than a threshold.
//!
//! # Architecture
//!
//! - [`RoomLightTracker`]: per-room state machine with durable persistence
//! - [`store`]: the [`DurableStore`](store::DurableStore) contract and adapters
//! - [`LightMonitor`]: owns all trackers, routes events, publishes
//!   [`MonitorEvent`](event::MonitorEvent)s
//! - [`ReconciliationLoop`](manager::ReconciliationLoop): ticks the monitor and
//!   dispatches alerts to a [`Notifier`](notify::Notifier)
//! - [`protocol`]: MQTT topic layout and the broker event source
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use light_watchdog::{LightMonitor, MonitorConfig};
//! use light_watchdog::manager::ReconciliationLoop;
//! use light_watchdog::notify::LogNotifier;
//! use light_watchdog::protocol::MqttEventSource;
//! use light_watchdog::store::JsonFileStore;
//!
//! #[tokio::main]
//! async fn main() -> light_watchdog::Result<()> {
//!     let config = MonitorConfig::default();
//!     let store = Arc::new(JsonFileStore::open(config.state_dir()?)?);
//!     let monitor = LightMonitor::new(store, config.threshold());
//!
//!     let (_source, mut events) = MqttEventSource::builder()
//!         .url(config.broker_url())?
//!         .build()
//!         .await?;
//!
//!     let _loop = ReconciliationLoop::new(monitor.clone(), LogNotifier).spawn();
//!
//!     while let Some(event) = events.recv().await {
//!         let _ = monitor.handle_event(&event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Driving a Tracker Directly
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chrono::{TimeZone, Utc};
//! use light_watchdog::RoomLightTracker;
//! use light_watchdog::state::AlertDecision;
//! use light_watchdog::store::MemoryStore;
//! use light_watchdog::types::{LightKind, RoomId};
//!
//! let t = |s| Utc.timestamp_opt(s, 0).unwrap();
//! let threshold = Duration::from_secs(10);
//! let mut tracker = RoomLightTracker::new(RoomId::new("sala").unwrap(), Arc::new(MemoryStore::new()));
//!
//! let _ = tracker.on_event(LightKind::On, t(0));
//! assert_eq!(tracker.evaluate(t(5), threshold).into_value(), AlertDecision::NoAlert);
//! assert!(tracker.evaluate(t(11), threshold).into_value().should_alert());
//! assert_eq!(tracker.evaluate(t(20), threshold).into_value(), AlertDecision::NoAlert);
//! ```

mod config;
pub mod error;
pub mod event;
pub mod manager;
pub mod notify;
pub mod protocol;
pub mod state;
pub mod store;
mod tracker;
pub mod types;

pub use config::MonitorConfig;
pub use error::{
    ConfigError, Error, NotifyError, ParseError, ProtocolError, Result, StoreError, ValueError,
};
pub use manager::{LightMonitor, ReconcilerHandle, ReconciliationLoop};
pub use tracker::RoomLightTracker;
pub use types::{LightKind, RgbColor, RoomId, Timestamp};
