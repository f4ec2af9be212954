// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-backed store: one JSON document per room.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::state::StoredRecord;
use crate::types::RoomId;

use super::DurableStore;

/// [`DurableStore`] that keeps `<dir>/<room>.json` per room.
///
/// Writes go to a uniquely named temporary file in the same directory and
/// are renamed into place, so a crash mid-write leaves either the old or the
/// new record on disk. Several stores may share a directory; the last
/// rename wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Opened state directory");
        Ok(Self { dir })
    }

    /// Returns the state directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, room: &RoomId) -> PathBuf {
        self.dir.join(format!("{room}.json"))
    }

    fn write_failed(room: &RoomId, e: &io::Error) -> StoreError {
        StoreError::WriteFailed {
            room: room.clone(),
            message: e.to_string(),
        }
    }
}

impl DurableStore for JsonFileStore {
    fn get(&self, room: &RoomId) -> Result<Option<StoredRecord>, StoreError> {
        let path = self.record_path(room);
        match fs::read_to_string(&path) {
            Ok(contents) => StoredRecord::from_json(room, &contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn set(&self, room: &RoomId, record: &StoredRecord) -> Result<(), StoreError> {
        let path = self.record_path(room);
        let contents = record.to_json()?;

        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| Self::write_failed(room, &e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| Self::write_failed(room, &e))?;
        tmp.flush().map_err(|e| Self::write_failed(room, &e))?;
        tmp.persist(&path)
            .map_err(|e| Self::write_failed(room, &e.error))?;

        tracing::trace!(room = %room, path = %path.display(), "Stored light state");
        Ok(())
    }

    fn delete(&self, room: &RoomId) -> Result<(), StoreError> {
        match fs::remove_file(self.record_path(room)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::write_failed(room, &e)),
        }
    }
}
