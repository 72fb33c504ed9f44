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

//! The reference store (C7): loose and special refs, atomic updates, and
//! advisory per-name locking.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::oid::Oid;

/// The fixed whitelist of names writable directly at the repository
/// root rather than under `refs/` (§3, §4.6).
pub const SPECIAL_REFS: &[&str] = &[
    "HEAD",
    "MERGE_HEAD",
    "FETCH_HEAD",
    "CHERRY_PICK_HEAD",
    "AUTO_MERGE",
    "MERGE_AUTOSTASH",
];

/// An advisory, per-name lock acquired via `open(excl|create)`. Released
/// on every exit path, including early returns via `?`, by `Drop`.
struct RefLock {
    path: PathBuf,
}

impl RefLock {
    fn acquire(path: &Path, display_name: &str) -> Result<Self> {
        match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Self {
                path: path.to_path_buf(),
            }),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(Error::ResourceLocked(display_name.to_string()))
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn write_pending(&self, value: &str) -> Result<()> {
        fs::write(&self.path, value)?;
        Ok(())
    }

    /// Renames the lock file over `target`, consuming the lock without
    /// triggering its `Drop` cleanup (the file no longer lives at the
    /// lock path once renamed).
    fn commit(self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&self.path, target)?;
        std::mem::forget(self);
        Ok(())
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// The on-disk loose/special reference store.
#[derive(Debug, Clone)]
pub struct RefStore {
    root: PathBuf,
}

impl RefStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.lock"))
    }

    pub fn read(&self, name: &str) -> Result<Oid> {
        validate_ref_name(name)?;
        read_oid_file(&self.ref_path(name), name)
    }

    /// Updates `name` to `new`, provided its current value matches
    /// `old_expected` (a compare-and-swap; `None` means "must not yet
    /// exist"). Writes the candidate value into the lock file, then
    /// renames it over the reference file (§4.6 "Atomicity").
    pub fn update(&self, name: &str, old_expected: Option<Oid>, new: Oid) -> Result<()> {
        validate_ref_name(name)?;
        let lock = RefLock::acquire(&self.lock_path(name), name)?;
        self.check_expected(name, old_expected)?;
        lock.write_pending(&new.hex())?;
        lock.commit(&self.ref_path(name))?;
        debug!(name, new = %new, "updated reference");
        Ok(())
    }

    pub fn delete(&self, name: &str, old_expected: Option<Oid>) -> Result<()> {
        validate_ref_name(name)?;
        let lock = RefLock::acquire(&self.lock_path(name), name)?;
        self.check_expected(name, old_expected)?;
        fs::remove_file(self.ref_path(name))?;
        drop(lock);
        debug!(name, "deleted reference");
        Ok(())
    }

    /// Renames `old` to `new`, holding both names' locks for the
    /// duration so no partial state is observable.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        validate_ref_name(old)?;
        validate_ref_name(new)?;
        // Acquire in a fixed order so two concurrent renames of the same
        // pair never deadlock against each other.
        let (first, second) = if old <= new { (old, new) } else { (new, old) };
        let lock_first = RefLock::acquire(&self.lock_path(first), first)?;
        let lock_second = RefLock::acquire(&self.lock_path(second), second)?;
        let (lock_old, lock_new) = if first == old {
            (lock_first, lock_second)
        } else {
            (lock_second, lock_first)
        };

        let value = read_oid_file(&self.ref_path(old), old)?;
        lock_new.write_pending(&value.hex())?;
        lock_new.commit(&self.ref_path(new))?;
        fs::remove_file(self.ref_path(old))?;
        drop(lock_old);
        debug!(old, new, "renamed reference");
        Ok(())
    }

    pub fn read_special(&self, name: &str) -> Result<Oid> {
        validate_special_name(name)?;
        read_oid_file(&self.root.join(name), name)
    }

    pub fn write_special(&self, name: &str, oid: Oid) -> Result<()> {
        validate_special_name(name)?;
        let lock = RefLock::acquire(&self.lock_path(name), name)?;
        lock.write_pending(&oid.hex())?;
        lock.commit(&self.root.join(name))?;
        debug!(name, oid = %oid, "wrote special reference");
        Ok(())
    }

    pub fn remove_special(&self, name: &str) -> Result<()> {
        validate_special_name(name)?;
        let lock = RefLock::acquire(&self.lock_path(name), name)?;
        match fs::remove_file(self.root.join(name)) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(Error::Io(err)),
        }
        drop(lock);
        Ok(())
    }

    fn check_expected(&self, name: &str, old_expected: Option<Oid>) -> Result<()> {
        let current = self.read(name).ok();
        if current != old_expected {
            return Err(Error::Other(format!(
                "reference {name} changed concurrently (expected {old_expected:?}, found {current:?})"
            )));
        }
        Ok(())
    }
}

fn read_oid_file(path: &Path, display_name: &str) -> Result<Oid> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(Error::Other(format!("reference {display_name} not found")));
        }
        Err(err) => return Err(Error::Io(err)),
    };
    Oid::from_hex(content.trim())
        .ok_or_else(|| Error::Other(format!("reference {display_name} has corrupt content")))
}

/// Checks a refname is legal: non-empty, no empty path segments, no
/// `..` component, no leading/trailing `/`, and not itself a lock file.
fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('/') || name.ends_with('/') || name.ends_with(".lock") {
        return Err(Error::BadReferenceName(name.to_string()));
    }
    if name.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(Error::BadReferenceName(name.to_string()));
    }
    if name.contains(char::is_control) {
        return Err(Error::BadReferenceName(name.to_string()));
    }
    Ok(())
}

fn validate_special_name(name: &str) -> Result<()> {
    if !SPECIAL_REFS.contains(&name) {
        return Err(Error::BadReferenceName(name.to_string()));
    }
    Ok(())
}
