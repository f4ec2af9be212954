// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Stable identifier for a monitored room (e.g. `"sala"`, `"quarto"`).
///
/// Room ids double as MQTT topic segments and store keys, so they must be
/// non-empty and free of `/`, `+`, `#` and whitespace.
///
/// # Examples
///
/// ```
/// use light_watchdog::types::RoomId;
///
/// let room = RoomId::new("quarto").unwrap();
/// assert_eq!(room.to_string(), "quarto");
///
/// assert!(RoomId::new("").is_err());
/// assert!(RoomId::new("led/+").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room id, validating its characters.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidRoomId`] if the id is empty or contains
    /// characters that cannot appear in a single topic segment.
    pub fn new(id: impl Into<String>) -> Result<Self, ValueError> {
        let id = id.into();
        let valid = !id.is_empty()
            && !id
                .chars()
                .any(|c| matches!(c, '/' | '+' | '#') || c.is_whitespace() || c.is_control());

        if valid {
            Ok(Self(id))
        } else {
            Err(ValueError::InvalidRoomId(id))
        }
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a display name with the first letter capitalized.
    ///
    /// ```
    /// use light_watchdog::types::RoomId;
    ///
    /// assert_eq!(RoomId::new("sala").unwrap().display_name(), "Sala");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(room: RoomId) -> Self {
        room.0
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
