// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light monitor coordinating the trackers of every room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::error::{Error, StoreError};
use crate::event::{EventBus, LightEvent, MonitorEvent};
use crate::state::{AlertDecision, Applied, LightAlert, RoomLightState, Transition};
use crate::store::DurableStore;
use crate::tracker::RoomLightTracker;
use crate::types::{RoomId, Timestamp};

type SharedTracker = Arc<Mutex<RoomLightTracker>>;

/// Owns one [`RoomLightTracker`] per room and routes events to them.
///
/// Each tracker sits behind its own mutex, so an event and a tick for the
/// same room are serialized while different rooms never wait on each other.
/// No lock is held across an `.await`; every method here is synchronous.
///
/// Cloning is cheap and yields a handle to the same rooms.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use light_watchdog::LightMonitor;
/// use light_watchdog::event::LightEvent;
/// use light_watchdog::store::MemoryStore;
/// use light_watchdog::types::{LightKind, RoomId};
///
/// let t = |s| Utc.timestamp_opt(s, 0).unwrap();
/// let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), Duration::from_secs(10));
/// let sala = RoomId::new("sala").unwrap();
///
/// let _ = monitor.handle_event(&LightEvent::new(sala.clone(), LightKind::On, t(0)));
///
/// assert!(monitor.evaluate_all(t(5)).is_empty());
/// let alerts = monitor.evaluate_all(t(11));
/// assert_eq!(alerts.len(), 1);
/// assert_eq!(alerts[0].room(), &sala);
/// ```
#[derive(Debug, Clone)]
pub struct LightMonitor {
    /// Trackers, keyed by room.
    rooms: Arc<RwLock<HashMap<RoomId, SharedTracker>>>,
    /// Store shared by every tracker.
    store: Arc<dyn DurableStore>,
    /// How long a light may stay on before an alert is raised.
    threshold: Duration,
    /// Event bus for broadcasting monitor events.
    event_bus: EventBus,
}

impl LightMonitor {
    /// Creates a monitor with no rooms.
    #[must_use]
    pub fn new(store: Arc<dyn DurableStore>, threshold: Duration) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            store,
            threshold,
            event_bus: EventBus::new(),
        }
    }

    /// Replaces the event bus with one of the given capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_bus = EventBus::with_capacity(capacity);
        self
    }

    /// Subscribes to monitor events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the alert threshold.
    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    // =========================================================================
    // Room Management
    // =========================================================================

    /// Starts tracking `room`, restoring its state from the store.
    ///
    /// Returns `false` if the room was already tracked.
    pub fn add_room(&self, room: RoomId) -> bool {
        if self.rooms.read().contains_key(&room) {
            return false;
        }
        self.insert_restored(room).1
    }

    /// Stops tracking `room`. Its durable record is left in place.
    ///
    /// Returns `true` if the room was tracked.
    pub fn remove_room(&self, room: &RoomId) -> bool {
        let removed = self.rooms.write().remove(room).is_some();
        if removed {
            tracing::debug!(room = %room, "Room removed");
            self.event_bus.publish(MonitorEvent::room_removed(room.clone()));
        }
        removed
    }

    /// Stops tracking `room` and deletes its durable record.
    ///
    /// Returns `true` if the room was tracked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record could not be deleted. The room
    /// is untracked either way.
    pub fn purge_room(&self, room: &RoomId) -> Result<bool, StoreError> {
        let removed = self.remove_room(room);
        self.store.delete(room)?;
        Ok(removed)
    }

    /// Returns the tracked rooms in sorted order.
    #[must_use]
    pub fn rooms(&self) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self.rooms.read().keys().cloned().collect();
        rooms.sort();
        rooms
    }

    /// Returns the number of tracked rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Returns a snapshot of a room's state.
    #[must_use]
    pub fn room_state(&self, room: &RoomId) -> Option<RoomLightState> {
        let tracker = self.rooms.read().get(room).cloned()?;
        let state = tracker.lock().state().clone();
        Some(state)
    }

    // =========================================================================
    // Events and Evaluation
    // =========================================================================

    /// Applies a light observation to its room.
    ///
    /// A room seen for the first time is restored from the store before the
    /// event is applied, whether or not it was added up front. Such rooms are
    /// logged at `info` and announced with [`MonitorEvent::RoomAdded`]; any
    /// publisher on the state topics can therefore add rooms, and
    /// [`remove_room`](Self::remove_room) drops them again. Publishes
    /// [`MonitorEvent::LightChanged`] unless the event was a duplicate.
    pub fn handle_event(&self, event: &LightEvent) -> Applied<Transition> {
        let tracker = self.tracker_for(event.room());

        let (applied, state) = {
            let mut tracker = tracker.lock();
            let applied = tracker.on_event(event.kind(), event.observed_at());
            (applied, tracker.state().clone())
        };

        let transition = *applied.value();
        if let (Transition::TurnedOff { on_for }, Some(reported)) =
            (transition, event.reported_duration())
        {
            tracing::debug!(
                room = %event.room(),
                on_for_secs = on_for.as_secs(),
                reported_secs = reported.as_secs(),
                "Light turned off"
            );
        }

        if transition.changed_state() {
            self.event_bus.publish(MonitorEvent::LightChanged {
                room: event.room().clone(),
                transition,
                state,
            });
        }

        applied
    }

    /// Evaluates every room at `now` and returns the alerts that became due.
    ///
    /// Each returned alert is also published as
    /// [`MonitorEvent::AlertRaised`]. A room alerts at most once per
    /// on-period no matter how often this is called.
    pub fn evaluate_all(&self, now: Timestamp) -> Vec<LightAlert> {
        let trackers: Vec<SharedTracker> = self.rooms.read().values().cloned().collect();

        trackers
            .iter()
            .filter_map(|tracker| self.evaluate_tracker(tracker, now))
            .collect()
    }

    /// Evaluates a single room at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoomNotFound`] if the room is not tracked.
    pub fn evaluate_room(&self, room: &RoomId, now: Timestamp) -> Result<Option<LightAlert>, Error> {
        let tracker = self
            .rooms
            .read()
            .get(room)
            .cloned()
            .ok_or_else(|| Error::RoomNotFound(room.clone()))?;
        Ok(self.evaluate_tracker(&tracker, now))
    }

    fn evaluate_tracker(&self, tracker: &SharedTracker, now: Timestamp) -> Option<LightAlert> {
        let (decision, room) = {
            let mut tracker = tracker.lock();
            let decision = tracker.evaluate(now, self.threshold).into_value();
            (decision, tracker.room().clone())
        };

        let AlertDecision::ShouldAlert { elapsed } = decision else {
            return None;
        };

        tracing::info!(room = %room, elapsed_secs = elapsed.as_secs(), "Light left on");
        let alert = LightAlert::new(room, elapsed, now);
        self.event_bus.publish(MonitorEvent::AlertRaised {
            alert: alert.clone(),
        });
        Some(alert)
    }

    fn tracker_for(&self, room: &RoomId) -> SharedTracker {
        if let Some(tracker) = self.rooms.read().get(room) {
            return Arc::clone(tracker);
        }

        let (tracker, inserted) = self.insert_restored(room.clone());
        if inserted {
            tracing::info!(room = %room, "Tracking room first seen in an event");
        }
        tracker
    }

    /// Restores a tracker and inserts it unless another caller won the race.
    fn insert_restored(&self, room: RoomId) -> (SharedTracker, bool) {
        let restored = RoomLightTracker::restore(room.clone(), Arc::clone(&self.store));

        let mut rooms = self.rooms.write();
        if let Some(existing) = rooms.get(&room) {
            return (Arc::clone(existing), false);
        }

        let tracker = Arc::new(Mutex::new(restored));
        rooms.insert(room.clone(), Arc::clone(&tracker));
        drop(rooms);

        tracing::debug!(room = %room, "Room added");
        self.event_bus.publish(MonitorEvent::room_added(room));
        (tracker, true)
    }
}
