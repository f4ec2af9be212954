// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light on/off event kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The kind of a light state-change event.
///
/// # Examples
///
/// ```
/// use light_watchdog::types::LightKind;
///
/// assert_eq!("ON".parse::<LightKind>().unwrap(), LightKind::On);
/// assert_eq!("off".parse::<LightKind>().unwrap(), LightKind::Off);
/// assert_eq!(LightKind::On.as_str(), "ON");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightKind {
    /// The light was reported on.
    On,
    /// The light was reported off.
    Off,
}

impl LightKind {
    /// Returns the wire keyword for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// Returns `true` for [`LightKind::On`].
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ON" | "1" => Ok(Self::On),
            "OFF" | "0" => Ok(Self::Off),
            _ => Err(ValueError::InvalidLightKind(s.to_string())),
        }
    }
}

impl From<bool> for LightKind {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("On".parse::<LightKind>().unwrap(), LightKind::On);
        assert_eq!(" OFF ".parse::<LightKind>().unwrap(), LightKind::Off);
        assert_eq!("1".parse::<LightKind>().unwrap(), LightKind::On);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "TOGGLE".parse::<LightKind>().unwrap_err();
        assert_eq!(err, ValueError::InvalidLightKind("TOGGLE".to_string()));
    }

    #[test]
    fn from_bool() {
        assert_eq!(LightKind::from(true), LightKind::On);
        assert!(!LightKind::from(false).is_on());
    }
}
