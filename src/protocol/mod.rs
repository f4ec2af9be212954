// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the LED controllers.
//!
//! [`TopicLayout`] describes the topic names and decodes incoming state
//! messages; it has no dependency on an MQTT client. With the `mqtt`
//! feature, [`MqttEventSource`] connects to a broker and turns those
//! messages into a stream of [`LightEvent`](crate::event::LightEvent)s.

#[cfg(feature = "mqtt")]
mod mqtt;
mod topic;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttEventSource, MqttEventSourceBuilder, parse_broker_url};
pub use topic::TopicLayout;
