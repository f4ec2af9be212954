// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic layout of the LED controllers.

use crate::error::ParseError;
use crate::event::LightEvent;
use crate::types::{RoomId, Timestamp};

/// Topic names used by the LED controllers.
///
/// Under a common prefix each room has:
///
/// | Topic                         | Direction  | Payload                  |
/// |-------------------------------|------------|--------------------------|
/// | `<prefix>/led/<room>/estado`  | device out | `ON,<ms>` / `OFF,<ms>`   |
/// | `<prefix>/led/<room>`         | device in  | `R,G,B` (`0,0,0` is off) |
///
/// # Examples
///
/// ```
/// use light_watchdog::protocol::TopicLayout;
/// use light_watchdog::types::RoomId;
///
/// let layout = TopicLayout::default();
/// let sala = RoomId::new("sala").unwrap();
///
/// assert_eq!(layout.state_filter(), "projeto/smart-palafita/led/+/estado");
/// assert_eq!(layout.command_topic(&sala), "projeto/smart-palafita/led/sala");
/// assert_eq!(
///     layout.parse_state_topic("projeto/smart-palafita/led/sala/estado").unwrap(),
///     sala
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLayout {
    prefix: String,
}

impl TopicLayout {
    /// Prefix used by the stock firmware.
    pub const DEFAULT_PREFIX: &'static str = "projeto/smart-palafita";

    /// Creates a layout rooted at `prefix`. Trailing slashes are ignored.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the topic prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the wildcard filter matching every room's state topic.
    #[must_use]
    pub fn state_filter(&self) -> String {
        format!("{}/led/+/estado", self.prefix)
    }

    /// Returns the state topic of `room`.
    #[must_use]
    pub fn state_topic(&self, room: &RoomId) -> String {
        format!("{}/led/{room}/estado", self.prefix)
    }

    /// Returns the color command topic of `room`.
    #[must_use]
    pub fn command_topic(&self, room: &RoomId) -> String {
        format!("{}/led/{room}", self.prefix)
    }

    /// Extracts the room from a state topic.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownTopic`] if `topic` is not a state topic
    /// of this layout.
    pub fn parse_state_topic(&self, topic: &str) -> Result<RoomId, ParseError> {
        let unknown = || ParseError::UnknownTopic(topic.to_string());

        let room = topic
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix("/led/"))
            .and_then(|rest| rest.strip_suffix("/estado"))
            .ok_or_else(unknown)?;

        RoomId::new(room).map_err(|_| unknown())
    }

    /// Decodes a message received on a state topic.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the topic is foreign, the payload is not
    /// UTF-8, or the payload is not a valid light state.
    pub fn decode(
        &self,
        topic: &str,
        payload: &[u8],
        received_at: Timestamp,
    ) -> Result<LightEvent, ParseError> {
        let room = self.parse_state_topic(topic)?;
        let payload = std::str::from_utf8(payload).map_err(|e| ParseError::InvalidValue {
            field: "payload".to_string(),
            message: e.to_string(),
        })?;
        LightEvent::parse_payload(room, payload, received_at)
    }
}

impl Default for TopicLayout {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}
