// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outcomes of tracker operations.

use std::time::Duration;

use crate::error::StoreError;
use crate::types::Timestamp;

/// What an ON/OFF observation did to a room's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new on-period started.
    TurnedOn {
        /// Start of the on-period.
        at: Timestamp,
    },

    /// The open on-period ended.
    TurnedOff {
        /// How long the light was on.
        on_for: Duration,
    },

    /// The observation repeated the current state and was ignored.
    DuplicateIgnored,
}

impl Transition {
    /// Returns `true` unless the observation was a duplicate.
    #[must_use]
    pub fn changed_state(&self) -> bool {
        !matches!(self, Self::DuplicateIgnored)
    }
}

/// A tracker result paired with the outcome of persisting it.
///
/// In-memory state always advances; a failed store write is carried here as
/// a warning so the caller can surface it without treating it as fatal.
#[derive(Debug)]
#[must_use]
pub struct Applied<T> {
    value: T,
    store_error: Option<StoreError>,
}

impl<T> Applied<T> {
    /// Wraps a value whose state change reached the store (or needed no write).
    pub fn persisted(value: T) -> Self {
        Self {
            value,
            store_error: None,
        }
    }

    /// Wraps a value together with the result of the store write.
    pub fn with_store_result(value: T, result: Result<(), StoreError>) -> Self {
        Self {
            value,
            store_error: result.err(),
        }
    }

    /// Returns the operation's result.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the store failure, if the write did not go through.
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        self.store_error.as_ref()
    }

    /// Returns `true` if the durable mirror reflects the new state.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.store_error.is_none()
    }

    /// Discards the persistence outcome.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Splits into the value and the optional store failure.
    #[must_use]
    pub fn into_parts(self) -> (T, Option<StoreError>) {
        (self.value, self.store_error)
    }
}
