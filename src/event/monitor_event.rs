// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor event types.

use crate::state::{LightAlert, RoomLightState, Transition};
use crate::types::RoomId;

/// Events emitted by the [`LightMonitor`](crate::LightMonitor).
///
/// # Examples
///
/// ```
/// use light_watchdog::event::MonitorEvent;
/// use light_watchdog::types::RoomId;
///
/// let room = RoomId::new("sala").unwrap();
/// let event = MonitorEvent::room_added(room.clone());
///
/// assert_eq!(event.room(), &room);
/// assert!(event.is_lifecycle());
/// ```
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A room started being tracked.
    RoomAdded {
        /// The added room.
        room: RoomId,
    },

    /// A room stopped being tracked.
    RoomRemoved {
        /// The removed room.
        room: RoomId,
    },

    /// A light turned on or off.
    ///
    /// Duplicate observations do not produce this event.
    LightChanged {
        /// The room whose light changed.
        room: RoomId,
        /// What happened.
        transition: Transition,
        /// The room's state after the change.
        state: RoomLightState,
    },

    /// A light crossed the alert threshold.
    AlertRaised {
        /// The alert handed to the notifier.
        alert: LightAlert,
    },
}

impl MonitorEvent {
    /// Returns the room associated with this event.
    #[must_use]
    pub fn room(&self) -> &RoomId {
        match self {
            Self::RoomAdded { room }
            | Self::RoomRemoved { room }
            | Self::LightChanged { room, .. } => room,
            Self::AlertRaised { alert } => alert.room(),
        }
    }

    /// Returns `true` if this is a room lifecycle event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::RoomAdded { .. } | Self::RoomRemoved { .. })
    }

    /// Returns `true` if this is an alert.
    #[must_use]
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::AlertRaised { .. })
    }

    /// Creates a room added event.
    #[must_use]
    pub fn room_added(room: RoomId) -> Self {
        Self::RoomAdded { room }
    }

    /// Creates a room removed event.
    #[must_use]
    pub fn room_removed(room: RoomId) -> Self {
        Self::RoomRemoved { room }
    }
}
