// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifier that only logs.

use crate::error::NotifyError;
use crate::state::LightAlert;

use super::Notifier;

/// Writes every alert to the log at `info` level.
///
/// Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, alert: LightAlert) -> Result<(), NotifyError> {
        tracing::info!(
            room = %alert.room(),
            elapsed_secs = alert.elapsed().as_secs(),
            raised_at = %alert.raised_at(),
            "{}",
            alert.message()
        );
        Ok(())
    }
}
