// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elapsed-time arithmetic and formatting.

use std::time::Duration;

use super::Timestamp;

/// Returns the span from `since` to `until`.
///
/// A negative span (clock skew, or an event stamped after `until`) is
/// clamped to zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use light_watchdog::types::elapsed_between;
///
/// let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
/// let t1 = Utc.timestamp_opt(1_011, 0).unwrap();
///
/// assert_eq!(elapsed_between(t0, t1), Duration::from_secs(11));
/// assert_eq!(elapsed_between(t1, t0), Duration::ZERO);
/// ```
#[must_use]
pub fn elapsed_between(since: Timestamp, until: Timestamp) -> Duration {
    (until - since).to_std().unwrap_or(Duration::ZERO)
}

/// Formats a duration as `"<m> min <s> s"`, omitting minutes when zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use light_watchdog::types::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_secs(11)), "11 s");
/// assert_eq!(format_elapsed(Duration::from_secs(125)), "2 min 5 s");
/// ```
#[must_use]
pub fn format_elapsed(duration: Duration) -> String {
    let total = duration.as_secs();
    let minutes = total / 60;
    let seconds = total % 60;

    if minutes > 0 {
        format!("{minutes} min {seconds} s")
    } else {
        format!("{seconds} s")
    }
}

/// Formats a duration as a zero-padded `MM:SS` clock.
///
/// Minutes keep growing past 59 rather than rolling into hours.
///
/// ```
/// use std::time::Duration;
/// use light_watchdog::types::format_clock;
///
/// assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
/// assert_eq!(format_clock(Duration::from_secs(3_600)), "60:00");
/// ```
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn elapsed_keeps_sub_second_precision() {
        let t0 = chrono::Utc.timestamp_millis_opt(0).unwrap();
        let t1 = chrono::Utc.timestamp_millis_opt(10_500).unwrap();
        assert_eq!(elapsed_between(t0, t1), Duration::from_millis(10_500));
    }

    #[test]
    fn format_elapsed_truncates_fractions() {
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "59 s");
        assert_eq!(format_elapsed(Duration::from_secs(60)), "1 min 0 s");
        assert_eq!(format_elapsed(Duration::ZERO), "0 s");
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(Duration::from_secs(9)), "00:09");
        assert_eq!(format_clock(Duration::from_secs(600)), "10:00");
    }
}
