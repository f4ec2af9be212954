// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::state::StoredRecord;
use crate::types::RoomId;

use super::DurableStore;

/// Process-local [`DurableStore`].
///
/// Records are kept as JSON strings so that reads go through the same
/// decoding and validation path as the file store. [`insert_raw`] lets tests
/// plant corrupt records and [`fail_writes`] simulates an unreachable store.
///
/// [`insert_raw`]: MemoryStore::insert_raw
/// [`fail_writes`]: MemoryStore::fail_writes
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RoomId, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw, unvalidated payload for `room`.
    pub fn insert_raw(&self, room: RoomId, raw: impl Into<String>) {
        self.records.write().insert(room, raw.into());
    }

    /// Makes every subsequent `set` and `delete` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, room: &RoomId) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                room: room.clone(),
                message: "store is read-only".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, room: &RoomId) -> Result<Option<StoredRecord>, StoreError> {
        let records = self.records.read();
        records
            .get(room)
            .map(|raw| StoredRecord::from_json(room, raw))
            .transpose()
    }

    fn set(&self, room: &RoomId, record: &StoredRecord) -> Result<(), StoreError> {
        self.check_writable(room)?;
        let json = record.to_json()?;
        self.records.write().insert(room.clone(), json);
        Ok(())
    }

    fn delete(&self, room: &RoomId) -> Result<(), StoreError> {
        self.check_writable(room)?;
        self.records.write().remove(room);
        Ok(())
    }
}
