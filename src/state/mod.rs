// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room light state and the values derived from it.
//!
//! [`RoomLightState`] is the pure state machine: it knows nothing about
//! storage or notification. [`StoredRecord`] is its durable mirror,
//! [`Transition`] and [`AlertDecision`] describe what an operation did, and
//! [`LightAlert`] is what gets handed to a notifier.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use chrono::{TimeZone, Utc};
//! use light_watchdog::state::{RoomLightState, Transition};
//! use light_watchdog::types::{LightKind, RoomId};
//!
//! let t = |s| Utc.timestamp_opt(s, 0).unwrap();
//! let mut state = RoomLightState::new(RoomId::new("sala").unwrap());
//!
//! assert!(state.apply(LightKind::On, t(0)).changed_state());
//! assert_eq!(state.apply(LightKind::On, t(3)), Transition::DuplicateIgnored);
//! assert_eq!(state.elapsed(t(7)), Some(Duration::from_secs(7)));
//! ```

mod alert;
mod room_state;
mod stored_record;
mod transition;

pub use alert::{AlertDecision, LightAlert};
pub use room_state::{LightPhase, RoomLightState};
pub use stored_record::StoredRecord;
pub use transition::{Applied, Transition};
