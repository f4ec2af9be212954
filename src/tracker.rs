// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable per-room light tracker.
//!
//! [`RoomLightTracker`] wraps a [`RoomLightState`] and mirrors every state
//! change into a [`DurableStore`]. The write is attempted before the change is
//! committed in memory; if it fails the change still applies and the failure
//! is handed back as a warning in [`Applied`].
//!
//! The tracker never talks to a notifier. [`RoomLightTracker::evaluate`] only
//! decides whether an alert is due; dispatching it is the caller's job.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::state::{AlertDecision, Applied, RoomLightState, StoredRecord, Transition};
use crate::store::DurableStore;
use crate::types::{LightKind, RoomId, Timestamp};

/// Light-duration tracker for one room, backed by a durable store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use light_watchdog::RoomLightTracker;
/// use light_watchdog::store::MemoryStore;
/// use light_watchdog::types::{LightKind, RoomId};
///
/// let t = |s| Utc.timestamp_opt(s, 0).unwrap();
/// let store = Arc::new(MemoryStore::new());
/// let mut tracker = RoomLightTracker::new(RoomId::new("sala").unwrap(), store.clone());
///
/// let applied = tracker.on_event(LightKind::On, t(0));
/// assert!(applied.is_persisted());
/// assert_eq!(store.len(), 1);
///
/// let decision = tracker.evaluate(t(11), Duration::from_secs(10)).into_value();
/// assert!(decision.should_alert());
/// ```
#[derive(Debug)]
pub struct RoomLightTracker {
    state: RoomLightState,
    store: Arc<dyn DurableStore>,
}

impl RoomLightTracker {
    /// Creates an OFF tracker without touching the store.
    #[must_use]
    pub fn new(room: RoomId, store: Arc<dyn DurableStore>) -> Self {
        Self {
            state: RoomLightState::new(room),
            store,
        }
    }

    /// Creates a tracker from whatever the store holds for `room`.
    ///
    /// A missing, corrupt or unreadable record yields an OFF tracker; the
    /// latter two are logged.
    #[must_use]
    pub fn restore(room: RoomId, store: Arc<dyn DurableStore>) -> Self {
        let raw = match store.get(&room) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(room = %room, error = %e, "Could not restore light state, assuming off");
                None
            }
        };

        let mut tracker = Self::new(room, store);
        tracker.reconcile_from_store(raw);
        tracker
    }

    /// Replaces the in-memory state with a persisted record.
    ///
    /// `None` initializes the room as OFF. Never raises an alert: a restored
    /// on-period that is already past the threshold is picked up by the next
    /// [`evaluate`](Self::evaluate).
    pub fn reconcile_from_store(&mut self, raw: Option<StoredRecord>) {
        let room = self.state.room().clone();
        self.state = match raw {
            Some(record) => {
                if let Err(e) = record.validate(&room) {
                    tracing::warn!(room = %room, error = %e, "Ignoring inconsistent stored state");
                }
                RoomLightState::from_record(room, &record)
            }
            None => RoomLightState::new(room),
        };

        tracing::debug!(
            room = %self.state.room(),
            phase = %self.state.phase(),
            "Reconciled light state from store"
        );
    }

    /// Applies an ON/OFF observation and persists the result.
    ///
    /// Duplicates are ignored without a store write.
    pub fn on_event(&mut self, kind: LightKind, observed_at: Timestamp) -> Applied<Transition> {
        let mut next = self.state.clone();
        let transition = next.apply(kind, observed_at);
        if !transition.changed_state() {
            tracing::trace!(room = %self.state.room(), %kind, "Duplicate light event ignored");
            return Applied::persisted(transition);
        }

        let result = self.persist(&next);
        self.state = next;
        tracing::debug!(room = %self.state.room(), ?transition, "Light state changed");
        Applied::with_store_result(transition, result)
    }

    /// Checks whether the alert for the current on-period is due.
    ///
    /// Returns [`AlertDecision::ShouldAlert`] at most once per on-period and
    /// persists the flipped `alert_sent` flag when it does.
    pub fn evaluate(&mut self, now: Timestamp, threshold: Duration) -> Applied<AlertDecision> {
        let mut next = self.state.clone();
        let decision = next.check_alert(now, threshold);
        if !decision.should_alert() {
            return Applied::persisted(decision);
        }

        let result = self.persist(&next);
        self.state = next;
        Applied::with_store_result(decision, result)
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &RoomLightState {
        &self.state
    }

    /// Returns the tracked room.
    #[must_use]
    pub fn room(&self) -> &RoomId {
        self.state.room()
    }

    /// Removes the room's durable record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record could not be deleted.
    pub fn purge(&self) -> Result<(), StoreError> {
        self.store.delete(self.state.room())
    }

    fn persist(&self, next: &RoomLightState) -> Result<(), StoreError> {
        let room = next.room();
        let result = match next.to_record() {
            Some(record) => self.store.set(room, &record),
            None => self.store.delete(room),
        };

        if let Err(e) = &result {
            tracing::warn!(room = %room, error = %e, "Failed to persist light state");
        }
        result
    }
}
