// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alert delivery.
//!
//! A [`Notifier`] receives each [`LightAlert`] exactly once. The
//! reconciliation loop spawns every send and only logs failures; a notifier
//! never has to worry about retries or deduplication.

#[cfg(feature = "http")]
mod http;
mod log;

#[cfg(feature = "http")]
pub use http::{HttpNotifier, HttpNotifierConfig};
pub use log::LogNotifier;

use std::future::Future;

use crate::error::NotifyError;
use crate::state::LightAlert;

/// Delivers "light left on" alerts to the outside world.
///
/// # Examples
///
/// ```
/// use light_watchdog::error::NotifyError;
/// use light_watchdog::notify::Notifier;
/// use light_watchdog::state::LightAlert;
///
/// struct Stdout;
///
/// impl Notifier for Stdout {
///     async fn send(&self, alert: LightAlert) -> Result<(), NotifyError> {
///         println!("{}", alert.message());
///         Ok(())
///     }
/// }
/// ```
pub trait Notifier: Send + Sync + 'static {
    /// Sends one alert.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the alert could not be delivered.
    fn send(&self, alert: LightAlert) -> impl Future<Output = Result<(), NotifyError>> + Send;
}
