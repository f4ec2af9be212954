// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable storage for room light state.
//!
//! The tracker only depends on the [`DurableStore`] contract: a string-keyed
//! store of [`StoredRecord`]s that survives restarts. Two adapters ship with
//! the crate:
//!
//! - [`MemoryStore`]: process-local, for tests and ephemeral runs
//! - [`JsonFileStore`]: one JSON file per room in a state directory
//!
//! Writes are keyed per room, so trackers never contend with each other.
//! Several processes sharing a directory get last-write-wins semantics.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use light_watchdog::state::StoredRecord;
//! use light_watchdog::store::{DurableStore, MemoryStore};
//! use light_watchdog::types::RoomId;
//!
//! let store = MemoryStore::new();
//! let room = RoomId::new("sala").unwrap();
//!
//! store.set(&room, &StoredRecord::on(Utc::now())).unwrap();
//! assert!(store.get(&room).unwrap().is_some());
//!
//! store.delete(&room).unwrap();
//! assert!(store.get(&room).unwrap().is_none());
//! ```

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::fmt;

use crate::error::StoreError;
use crate::state::StoredRecord;
use crate::types::RoomId;

/// A persistent, room-keyed store of light state records.
///
/// Implementations must be safe to share between threads; the monitor holds
/// one store behind an `Arc` and every tracker writes through it.
pub trait DurableStore: Send + Sync + fmt::Debug {
    /// Reads the record for `room`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadCorrupt`] if a record exists but cannot be
    /// decoded, or another [`StoreError`] if the store is unreachable.
    fn get(&self, room: &RoomId) -> Result<Option<StoredRecord>, StoreError>;

    /// Writes the record for `room`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record could not be written.
    fn set(&self, room: &RoomId, record: &StoredRecord) -> Result<(), StoreError>;

    /// Removes the record for `room`. Removing a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record could not be removed.
    fn delete(&self, room: &RoomId) -> Result<(), StoreError>;
}
