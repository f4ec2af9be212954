// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED color sent on a room's command topic.

use std::fmt;

/// Color for a room LED, published as `R,G,B`.
///
/// Black (`0,0,0`) switches the LED off.
///
/// ```
/// use light_watchdog::types::RgbColor;
///
/// assert_eq!(RgbColor::new(255, 87, 51).to_payload(), "255,87,51");
/// assert_eq!(RgbColor::black().to_payload(), "0,0,0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// The color that turns a LED off.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the command payload.
    #[must_use]
    pub fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}
