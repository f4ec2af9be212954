// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted mirror of a room's light state.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{RoomId, Timestamp};

/// The durable mirror of a [`RoomLightState`](super::RoomLightState).
///
/// Serialized as JSON, e.g.
/// `{"on_since":"2024-05-01T18:30:00Z","alert_sent":false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Start of the open on-period, if the light is on.
    pub on_since: Option<Timestamp>,
    /// Whether the alert for the open on-period was already dispatched.
    #[serde(default)]
    pub alert_sent: bool,
}

impl StoredRecord {
    /// Creates a record for a light that turned on at `since`.
    #[must_use]
    pub fn on(since: Timestamp) -> Self {
        Self {
            on_since: Some(since),
            alert_sent: false,
        }
    }

    /// Returns the same record with the alert flag set.
    #[must_use]
    pub fn alerted(mut self) -> Self {
        self.alert_sent = true;
        self
    }

    /// Checks the record against the state invariants.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadCorrupt`] if the record claims an alert was
    /// sent while no on-period is open.
    pub fn validate(&self, room: &RoomId) -> Result<(), StoreError> {
        if self.alert_sent && self.on_since.is_none() {
            return Err(StoreError::ReadCorrupt {
                room: room.clone(),
                message: "alert_sent is set without on_since".to_string(),
            });
        }
        Ok(())
    }

    /// Decodes and validates a JSON record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadCorrupt`] if the JSON is malformed or the
    /// record violates the state invariants.
    pub fn from_json(room: &RoomId, json: &str) -> Result<Self, StoreError> {
        let record: Self = serde_json::from_str(json).map_err(|e| StoreError::ReadCorrupt {
            room: room.clone(),
            message: e.to_string(),
        })?;
        record.validate(room)?;
        Ok(record)
    }

    /// Encodes the record as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }
}
