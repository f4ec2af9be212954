// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alert decisions and the alert payload handed to notifiers.

use std::time::Duration;

use serde::Serialize;

use crate::types::{RoomId, Timestamp, format_elapsed};

/// Result of evaluating a room against the alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Nothing to do.
    NoAlert,
    /// The threshold was crossed for the first time in this on-period.
    ShouldAlert {
        /// How long the light had been on when the threshold was crossed.
        elapsed: Duration,
    },
}

impl AlertDecision {
    /// Returns `true` for [`AlertDecision::ShouldAlert`].
    #[must_use]
    pub fn should_alert(&self) -> bool {
        matches!(self, Self::ShouldAlert { .. })
    }
}

/// A "light left on" alert for one room.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use light_watchdog::state::LightAlert;
/// use light_watchdog::types::RoomId;
///
/// let alert = LightAlert::new(RoomId::new("sala").unwrap(), Duration::from_secs(75), Utc::now());
/// assert!(alert.message().starts_with("The light in Sala has been on for 1 min 15 s."));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightAlert {
    room: RoomId,
    #[serde(with = "duration_secs")]
    elapsed: Duration,
    raised_at: Timestamp,
}

impl LightAlert {
    /// Creates an alert for `room` after the light was on for `elapsed`.
    #[must_use]
    pub fn new(room: RoomId, elapsed: Duration, raised_at: Timestamp) -> Self {
        Self {
            room,
            elapsed,
            raised_at,
        }
    }

    /// Returns the room the alert is about.
    #[must_use]
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Returns how long the light had been on.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns when the alert was raised.
    #[must_use]
    pub fn raised_at(&self) -> Timestamp {
        self.raised_at
    }

    /// Returns the human-readable alert text.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "The light in {} has been on for {}. Consider switching it off to save energy.",
            self.room.display_name(),
            format_elapsed(self.elapsed)
        )
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)] // signature required by serde(with)
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}
