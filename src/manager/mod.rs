// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room coordination and the reconciliation loop.
//!
//! [`LightMonitor`] owns one tracker per room and is fed decoded
//! [`LightEvent`](crate::event::LightEvent)s. [`ReconciliationLoop`] ticks the
//! monitor on a fixed interval and hands due alerts to a
//! [`Notifier`](crate::notify::Notifier).
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use light_watchdog::manager::{LightMonitor, ReconciliationLoop};
//! use light_watchdog::event::MonitorEvent;
//! use light_watchdog::notify::LogNotifier;
//! use light_watchdog::store::MemoryStore;
//!
//! # async fn example() {
//! let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), Duration::from_secs(10));
//!
//! let mut events = monitor.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let MonitorEvent::AlertRaised { alert } = event {
//!             println!("{}", alert.message());
//!         }
//!     }
//! });
//!
//! let handle = ReconciliationLoop::new(monitor.clone(), LogNotifier).spawn();
//! # handle.shutdown().await;
//! # }
//! ```

mod monitor;
mod reconciler;

pub use monitor::LightMonitor;
pub use reconciler::{ReconcilerHandle, ReconciliationLoop};
