// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the watchdog.
//!
//! These types provide validated representations of the values that flow
//! between the event source, the trackers and the notifier.
//!
//! # Examples
//!
//! ```
//! use light_watchdog::types::{LightKind, RgbColor, RoomId};
//!
//! let room = RoomId::new("sala").unwrap();
//! let kind: LightKind = "on".parse().unwrap();
//! let color = RgbColor::new(255, 128, 0);
//!
//! assert_eq!(room.as_str(), "sala");
//! assert_eq!(kind, LightKind::On);
//! assert_eq!(color.to_payload(), "255,128,0");
//! ```

mod elapsed;
mod light_kind;
mod rgb_color;
mod room_id;

pub use elapsed::{elapsed_between, format_clock, format_elapsed};
pub use light_kind::LightKind;
pub use rgb_color::RgbColor;
pub use room_id::RoomId;

/// Wall-clock instant used for on-since and observation times.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
