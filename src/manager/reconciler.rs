// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic evaluation of every room.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::notify::Notifier;
use crate::types::Timestamp;

use super::LightMonitor;

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Ticks a [`LightMonitor`] on a fixed interval and dispatches its alerts.
///
/// Each tick evaluates every room under that room's lock and then spawns one
/// [`Notifier::send`] per alert. Send failures are logged and never retried;
/// the alert flag is already persisted at that point. Sends still in flight
/// when the loop stops are awaited for up to the drain timeout.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use light_watchdog::LightMonitor;
/// use light_watchdog::manager::ReconciliationLoop;
/// use light_watchdog::notify::LogNotifier;
/// use light_watchdog::store::MemoryStore;
///
/// # async fn example() {
/// let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), Duration::from_secs(10));
/// let handle = ReconciliationLoop::new(monitor, LogNotifier)
///     .with_tick_interval(Duration::from_secs(1))
///     .spawn();
///
/// // ... feed events into the monitor ...
///
/// handle.shutdown().await;
/// # }
/// ```
pub struct ReconciliationLoop<N> {
    monitor: LightMonitor,
    notifier: Arc<N>,
    tick_interval: Duration,
    drain_timeout: Duration,
    clock: Clock,
    pending: Mutex<JoinSet<()>>,
}

impl<N: Notifier> ReconciliationLoop<N> {
    /// Default time between ticks.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

    /// Shortest accepted time between ticks.
    pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

    /// Default time to wait for in-flight sends when the loop stops.
    pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a loop over `monitor` that reports through `notifier`.
    #[must_use]
    pub fn new(monitor: LightMonitor, notifier: N) -> Self {
        Self {
            monitor,
            notifier: Arc::new(notifier),
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            drain_timeout: Self::DEFAULT_DRAIN_TIMEOUT,
            clock: Arc::new(Utc::now),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Sets the time between ticks, raised to [`MIN_TICK_INTERVAL`](Self::MIN_TICK_INTERVAL)
    /// if shorter.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        if interval < Self::MIN_TICK_INTERVAL {
            tracing::warn!(?interval, "Tick interval too short, using minimum");
        }
        self.tick_interval = interval.max(Self::MIN_TICK_INTERVAL);
        self
    }

    /// Sets how long stopping the loop waits for in-flight sends.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Replaces the wall clock used to timestamp ticks.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> Timestamp + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the time between ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Runs one evaluation pass at `now` and returns how many alerts were
    /// dispatched.
    ///
    /// Must be called from within a Tokio runtime, since sends are spawned.
    /// Sends are owned by the loop: await [`drain`](Self::drain) before
    /// dropping it, or unfinished sends are aborted.
    pub fn run_tick(&self, now: Timestamp) -> usize {
        let alerts = self.monitor.evaluate_all(now);
        let count = alerts.len();

        let mut pending = self.pending.lock();
        while let Some(result) = pending.try_join_next() {
            log_join_error(result);
        }
        for alert in alerts {
            let notifier = Arc::clone(&self.notifier);
            pending.spawn(async move {
                let room = alert.room().clone();
                match notifier.send(alert).await {
                    Ok(()) => tracing::debug!(room = %room, "Alert sent"),
                    Err(e) => tracing::warn!(room = %room, error = %e, "Failed to send alert"),
                }
            });
        }
        count
    }

    /// Waits up to the drain timeout for in-flight sends and returns how
    /// many were abandoned.
    pub async fn drain(&self) -> usize {
        let mut pending = std::mem::take(&mut *self.pending.lock());
        if pending.is_empty() {
            return 0;
        }

        let drained = tokio::time::timeout(self.drain_timeout, async {
            while let Some(result) = pending.join_next().await {
                log_join_error(result);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                abandoned = pending.len(),
                timeout = ?self.drain_timeout,
                "Gave up waiting for alert delivery"
            );
        }
        pending.len()
    }

    /// Starts ticking in a background task.
    ///
    /// The first tick runs immediately, so on-periods restored from the store
    /// that are already past the threshold alert right away.
    #[must_use]
    pub fn spawn(self) -> ReconcilerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::debug!(interval = ?self.tick_interval, "Reconciliation loop started");

            let mut interval = tokio::time::interval(self.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        let now = (self.clock)();
                        self.run_tick(now);
                    }
                }
            }

            self.drain().await;
            tracing::debug!("Reconciliation loop stopped");
        });

        ReconcilerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Alert delivery task failed");
    }
}

impl<N> fmt::Debug for ReconciliationLoop<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationLoop")
            .field("monitor", &self.monitor)
            .field("tick_interval", &self.tick_interval)
            .field("drain_timeout", &self.drain_timeout)
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

/// Handle to a running [`ReconciliationLoop`].
///
/// Dropping the handle also stops the loop, at the next tick boundary.
#[derive(Debug)]
pub struct ReconcilerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Stops the loop and waits for the current tick and any in-flight
    /// alert sends, bounded by the drain timeout.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Reconciliation loop ended abnormally");
        }
    }

    /// Returns `true` once the loop task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
