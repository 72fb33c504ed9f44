// Copyright 2026 The HugeSCM Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The backend store (C2): an on-disk, content-addressed object store
//! sharded by hex prefix, written via a temp-then-link-then-rename
//! protocol so concurrent writers of the same OID race safely and at most
//! one writer's bytes ever become observable (§4.1, §5).

use std::fs;
use std::fs::File;
use std::io::Read as _;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;
use tracing::trace;

use crate::error::Error;
use crate::error::Result;
use crate::object::ObjectKind;
use crate::oid::Oid;

const METADATA_DIR: &str = "metadata";
const BLOB_DIR: &str = "blob";
const TEMP_DIR: &str = "temp";

/// A handle onto a persisted object's bytes, plus the metadata the caller
/// needed to avoid a second round-trip.
pub struct ReadableObject {
    pub size: u64,
    pub kind: ObjectKind,
    pub reader: File,
}

impl ReadableObject {
    pub fn read_to_end(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size as usize);
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// An in-progress streamed write. The caller writes bytes directly to
/// `file`; calling [`Store::validate_fd`] hashes what was written,
/// finalizes it into place on a match, and unlinks it otherwise.
pub struct PendingWrite {
    pub file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl PendingWrite {
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

/// The on-disk, content-addressed object store.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Creates the on-disk directory skeleton for a fresh repository.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [METADATA_DIR, BLOB_DIR, TEMP_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self { root })
    }

    /// Opens an existing repository's store without touching its layout.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir_for(&self, is_metadata: bool) -> &'static str {
        if is_metadata { METADATA_DIR } else { BLOB_DIR }
    }

    fn object_path(&self, is_metadata: bool, oid: &Oid) -> PathBuf {
        let hex = oid.hex();
        self.root
            .join(self.dir_for(is_metadata))
            .join(&hex[..2])
            .join(&hex[2..])
    }

    /// Whether an object is present. `kind_hint` narrows the search to one
    /// of the metadata/blob trees; without a hint both are checked.
    pub fn exists(&self, oid: &Oid, kind_hint: Option<ObjectKind>) -> bool {
        match kind_hint {
            Some(kind) => self.object_path(kind.is_metadata(), oid).exists(),
            None => {
                self.object_path(true, oid).exists() || self.object_path(false, oid).exists()
            }
        }
    }

    pub fn size(&self, oid: &Oid, is_metadata: bool) -> Result<u64> {
        let path = self.object_path(is_metadata, oid);
        let meta = fs::metadata(&path).map_err(|err| map_missing(err, *oid))?;
        Ok(meta.len())
    }

    pub fn open_read(&self, oid: &Oid, kind: ObjectKind) -> Result<ReadableObject> {
        let path = self.object_path(kind.is_metadata(), oid);
        let file = File::open(&path).map_err(|err| map_missing(err, *oid))?;
        let size = file.metadata()?.len();
        trace!(oid = %oid, kind = %kind, "opened object for read");
        Ok(ReadableObject {
            size,
            kind,
            reader: file,
        })
    }

    /// Hashes `encoded_bytes` and writes it into place if absent.
    /// Re-writing the same OID is a silent no-op (§3 "At-most-once").
    pub fn write(&self, encoded_bytes: &[u8], declared_kind: ObjectKind) -> Result<Oid> {
        let oid = self.write_with_metadata_flag(encoded_bytes, declared_kind.is_metadata())?;
        debug!(oid = %oid, kind = %declared_kind, "wrote object");
        Ok(oid)
    }

    /// Lower-level write for callers (the pack-stream unpacker) that only
    /// know whether a frame is metadata or a blob, not its precise kind —
    /// on-disk placement depends only on that flag (§4.1).
    pub fn write_with_metadata_flag(&self, encoded_bytes: &[u8], is_metadata: bool) -> Result<Oid> {
        let oid = Oid::hash(encoded_bytes);
        let final_path = self.object_path(is_metadata, &oid);
        if final_path.exists() {
            trace!(oid = %oid, "write deduplicated, object already present");
            return Ok(oid);
        }

        let mut temp = NamedTempFile::new_in(self.root.join(TEMP_DIR))?;
        temp.write_all(encoded_bytes)?;
        temp.as_file().sync_all()?;
        self.link_into_place(temp, &final_path)?;
        Ok(oid)
    }

    /// Opens a temp file for a streamed write whose final hash must match
    /// `oid` once the caller is done writing to it.
    pub fn new_fd(&self, oid: Oid, is_metadata: bool) -> Result<PendingWrite> {
        let temp = NamedTempFile::new_in(self.root.join(TEMP_DIR))?;
        let (file, temp_path) = temp.keep().map_err(|e| Error::Io(e.error))?;
        Ok(PendingWrite {
            file,
            temp_path,
            final_path: self.object_path(is_metadata, &oid),
        })
    }

    /// Hashes the bytes written to `pending`, finalizing it into the store
    /// on a match and unlinking the partial file otherwise.
    pub fn validate_fd(&self, mut pending: PendingWrite, expected_oid: Oid) -> Result<()> {
        pending.file.flush()?;
        pending.file.sync_all()?;
        let bytes = fs::read(&pending.temp_path)?;
        let got = Oid::hash(&bytes);
        if got != expected_oid {
            let _ = fs::remove_file(&pending.temp_path);
            return Err(Error::HashMismatch {
                expected: expected_oid,
                got,
            });
        }
        self.link_temp_path_into_place(&pending.temp_path, &pending.final_path)?;
        Ok(())
    }

    /// Path of the stable, resumable under-construction file for `oid`.
    /// Unlike [`Store::new_fd`]'s random temp names, this name is a
    /// deterministic function of `oid` so a retried transfer can reopen
    /// and resume the same file (§4.5).
    fn partial_path(&self, oid: &Oid) -> PathBuf {
        self.root.join(TEMP_DIR).join(format!("{}.partial", oid.hex()))
    }

    /// Opens (creating if absent) the partial file for a resumable
    /// download, returning it positioned for appends plus its current
    /// size — the resume offset the caller should request from the peer.
    pub fn open_partial_for_append(&self, oid: &Oid) -> Result<(File, u64)> {
        fs::create_dir_all(self.root.join(TEMP_DIR))?;
        let path = self.partial_path(oid);
        let file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let size = file.metadata()?.len();
        Ok((file, size))
    }

    /// Discards any existing bytes and reopens the partial file empty,
    /// for the truncate-and-restart fallback path.
    pub fn truncate_partial(&self, oid: &Oid) -> Result<File> {
        fs::create_dir_all(self.root.join(TEMP_DIR))?;
        let path = self.partial_path(oid);
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .read(true)
            .open(&path)?;
        Ok(file)
    }

    /// Validates the partial file's hash and, on a match, finalizes it
    /// into the store; on mismatch, unlinks the partial file and reports
    /// `HashMismatch`.
    pub fn finalize_partial(&self, oid: &Oid, is_metadata: bool) -> Result<()> {
        let path = self.partial_path(oid);
        let bytes = fs::read(&path)?;
        let got = Oid::hash(&bytes);
        if got != *oid {
            let _ = fs::remove_file(&path);
            return Err(Error::HashMismatch {
                expected: *oid,
                got,
            });
        }
        let final_path = self.object_path(is_metadata, oid);
        self.link_temp_path_into_place(&path, &final_path)?;
        Ok(())
    }

    fn link_into_place(&self, temp: NamedTempFile, final_path: &Path) -> Result<()> {
        let (_file, temp_path) = temp.keep().map_err(|e| Error::Io(e.error))?;
        self.link_temp_path_into_place(&temp_path, final_path)
    }

    fn link_temp_path_into_place(&self, temp_path: &Path, final_path: &Path) -> Result<()> {
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::hard_link(temp_path, final_path) {
            Ok(()) => {
                let _ = fs::remove_file(temp_path);
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                // Another writer won the race; this is a successful
                // deduplication, not a failure (§4.1).
                let _ = fs::remove_file(temp_path);
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(temp_path);
                Err(Error::Io(err))
            }
        }
    }
}

fn map_missing(err: std::io::Error, oid: Oid) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::NoSuchObject(oid)
    } else {
        Error::Io(err)
    }
}
