// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded light observations.

use std::time::Duration;

use crate::error::ParseError;
use crate::types::{LightKind, RoomId, Timestamp};

/// A single ON/OFF observation for a room.
///
/// Devices publish `ON,<uptime_ms>` when a light turns on and
/// `OFF,<on_for_ms>` when it turns off. The numbers come from the device's
/// own uptime counter, so the observation time is always the moment the
/// payload was received.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use light_watchdog::event::LightEvent;
/// use light_watchdog::types::{LightKind, RoomId};
///
/// let room = RoomId::new("sala").unwrap();
/// let event = LightEvent::parse_payload(room, "OFF,4500", Utc::now()).unwrap();
///
/// assert_eq!(event.kind(), LightKind::Off);
/// assert_eq!(event.reported_duration(), Some(Duration::from_millis(4500)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightEvent {
    room: RoomId,
    kind: LightKind,
    observed_at: Timestamp,
    reported_duration: Option<Duration>,
}

impl LightEvent {
    /// Creates an event without a device-reported duration.
    #[must_use]
    pub fn new(room: RoomId, kind: LightKind, observed_at: Timestamp) -> Self {
        Self {
            room,
            kind,
            observed_at,
            reported_duration: None,
        }
    }

    /// Decodes a `KIND[,NUMBER]` payload received at `received_at`.
    ///
    /// `KIND` is `ON` or `OFF` in any case. The optional number must be a
    /// non-negative integer; for `OFF` it is the device's own measurement of
    /// the on-period in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for empty payloads, unknown kinds, extra fields
    /// and non-numeric values.
    pub fn parse_payload(
        room: RoomId,
        payload: &str,
        received_at: Timestamp,
    ) -> Result<Self, ParseError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(ParseError::EmptyPayload);
        }

        let mut fields = payload.split(',').map(str::trim);
        let kind_field = fields.next().unwrap_or_default();
        let number_field = fields.next();
        if fields.next().is_some() {
            return Err(ParseError::UnexpectedFormat(payload.to_string()));
        }

        let kind = match kind_field.to_ascii_uppercase().as_str() {
            "ON" => LightKind::On,
            "OFF" => LightKind::Off,
            _ => return Err(ParseError::UnexpectedFormat(payload.to_string())),
        };

        let millis = number_field
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| ParseError::InvalidValue {
                    field: "millis".to_string(),
                    message: format!("{raw:?}: {e}"),
                })
            })
            .transpose()?;

        Ok(Self {
            room,
            kind,
            observed_at: received_at,
            reported_duration: match kind {
                LightKind::Off => millis.map(Duration::from_millis),
                LightKind::On => None,
            },
        })
    }

    /// Returns the room the observation is about.
    #[must_use]
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Returns whether the light turned on or off.
    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Returns when the observation was made.
    #[must_use]
    pub fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    /// Returns the on-period length measured by the device, for OFF events.
    #[must_use]
    pub fn reported_duration(&self) -> Option<Duration> {
        self.reported_duration
    }
}
