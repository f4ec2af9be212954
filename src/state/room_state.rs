// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-room light state.

use std::fmt;
use std::time::Duration;

use crate::types::{LightKind, RoomId, Timestamp, elapsed_between};

use super::{AlertDecision, StoredRecord, Transition};

/// Phase of a room's light, derived from [`RoomLightState`].
///
/// ```text
///            ON                    evaluate, elapsed >= threshold
///   Off ──────────► OnPending ─────────────────────────────────► OnAlerted
///    ▲                  │                                           │
///    │       OFF        │                    OFF                    │
///    └──────────────────┴───────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightPhase {
    /// The light is off (or its state is unknown).
    Off,
    /// The light is on and no alert has been sent for this on-period.
    OnPending,
    /// The light is on and the alert for this on-period was sent.
    OnAlerted,
}

impl fmt::Display for LightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::OnPending => "on",
            Self::OnAlerted => "on (alerted)",
        })
    }
}

/// Light-duration state of one room.
///
/// The invariant `alert_sent ⇒ on_since.is_some()` is upheld by every
/// constructor and mutator: an alert always refers to the on-period that is
/// still open.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use light_watchdog::state::{AlertDecision, LightPhase, RoomLightState};
/// use light_watchdog::types::{LightKind, RoomId};
///
/// let t = |s| Utc.timestamp_opt(s, 0).unwrap();
/// let mut state = RoomLightState::new(RoomId::new("sala").unwrap());
///
/// state.apply(LightKind::On, t(0));
/// assert_eq!(state.phase(), LightPhase::OnPending);
///
/// let decision = state.check_alert(t(11), Duration::from_secs(10));
/// assert_eq!(decision, AlertDecision::ShouldAlert { elapsed: Duration::from_secs(11) });
/// assert_eq!(state.phase(), LightPhase::OnAlerted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomLightState {
    room: RoomId,
    on_since: Option<Timestamp>,
    alert_sent: bool,
    last_off_duration: Option<Duration>,
}

impl RoomLightState {
    /// Creates an OFF state for the room.
    #[must_use]
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            on_since: None,
            alert_sent: false,
            last_off_duration: None,
        }
    }

    /// Builds the state described by a persisted record.
    ///
    /// A record claiming an alert without an on-period is normalized to OFF.
    #[must_use]
    pub fn from_record(room: RoomId, record: &StoredRecord) -> Self {
        match record.on_since {
            Some(on_since) => Self {
                room,
                on_since: Some(on_since),
                alert_sent: record.alert_sent,
                last_off_duration: None,
            },
            None => Self::new(room),
        }
    }

    /// Returns the durable mirror of this state, or `None` when OFF.
    #[must_use]
    pub fn to_record(&self) -> Option<StoredRecord> {
        self.on_since.map(|on_since| StoredRecord {
            on_since: Some(on_since),
            alert_sent: self.alert_sent,
        })
    }

    /// Returns the room this state belongs to.
    #[must_use]
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Returns when the current on-period started, if the light is on.
    #[must_use]
    pub fn on_since(&self) -> Option<Timestamp> {
        self.on_since
    }

    /// Returns whether the alert for the current on-period was sent.
    #[must_use]
    pub fn alert_sent(&self) -> bool {
        self.alert_sent
    }

    /// Returns how long the most recently closed on-period lasted.
    #[must_use]
    pub fn last_off_duration(&self) -> Option<Duration> {
        self.last_off_duration
    }

    /// Returns `true` if the light is considered on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on_since.is_some()
    }

    /// Returns the derived state-machine phase.
    #[must_use]
    pub fn phase(&self) -> LightPhase {
        match (self.on_since, self.alert_sent) {
            (None, _) => LightPhase::Off,
            (Some(_), false) => LightPhase::OnPending,
            (Some(_), true) => LightPhase::OnAlerted,
        }
    }

    /// Returns how long the light has been on at `now`, if it is on.
    #[must_use]
    pub fn elapsed(&self, now: Timestamp) -> Option<Duration> {
        self.on_since.map(|since| elapsed_between(since, now))
    }

    /// Applies an ON/OFF observation.
    ///
    /// Repeated observations of the current kind are duplicates and leave the
    /// state untouched; in particular a second ON never restarts the timer.
    pub fn apply(&mut self, kind: LightKind, observed_at: Timestamp) -> Transition {
        match (kind, self.on_since) {
            (LightKind::On, None) => {
                self.on_since = Some(observed_at);
                self.alert_sent = false;
                Transition::TurnedOn { at: observed_at }
            }
            (LightKind::Off, Some(since)) => {
                let on_for = elapsed_between(since, observed_at);
                self.on_since = None;
                self.alert_sent = false;
                self.last_off_duration = Some(on_for);
                Transition::TurnedOff { on_for }
            }
            (LightKind::On, Some(_)) | (LightKind::Off, None) => Transition::DuplicateIgnored,
        }
    }

    /// Checks the alert condition, flipping `alert_sent` when it fires.
    ///
    /// Returns [`AlertDecision::ShouldAlert`] at most once per on-period.
    pub fn check_alert(&mut self, now: Timestamp, threshold: Duration) -> AlertDecision {
        let Some(since) = self.on_since else {
            return AlertDecision::NoAlert;
        };

        let elapsed = elapsed_between(since, now);
        if elapsed >= threshold && !self.alert_sent {
            self.alert_sent = true;
            AlertDecision::ShouldAlert { elapsed }
        } else {
            AlertDecision::NoAlert
        }
    }
}
