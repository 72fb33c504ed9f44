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

//! Tree objects: canonically-ordered sets of named entries.

use crate::error::Error;
use crate::error::Result;
use crate::oid::Oid;
use crate::oid::OID_RAW_LEN;

/// The kind of thing a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileMode {
    Regular,
    Executable,
    Symlink,
    Directory,
    FragmentsPointer,
    Submodule,
}

impl FileMode {
    /// Octal mode used in the canonical tree-entry encoding (§4.2). These
    /// values are an implementer's choice (the spec does not mandate
    /// git-compatible codes): regular/executable/symlink/directory follow
    /// common convention, `FragmentsPointer` and `Submodule` are given
    /// otherwise-unused codes so every mode round-trips unambiguously.
    pub fn octal(self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::FragmentsPointer => 0o100777,
            Self::Submodule => 0o160000,
        }
    }

    pub fn from_octal(mode: u32) -> Option<Self> {
        Some(match mode {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o040000 => Self::Directory,
            0o100777 => Self::FragmentsPointer,
            0o160000 => Self::Submodule,
            _ => return None,
        })
    }

    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A single named entry in a [`Tree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub mode: FileMode,
    pub hash: Oid,
    /// Logical uncompressed payload size for leaves; informational for
    /// subtrees.
    pub size: u64,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, mode: FileMode, hash: Oid, size: u64) -> Result<Self> {
        let name = name.into();
        validate_entry_name(&name)?;
        Ok(Self {
            name,
            mode,
            hash,
            size,
        })
    }

    /// Compares path, mode, size and hash for equality (distinct from
    /// `PartialEq` only in name, which this type already derives).
    pub fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// The name used for canonical ordering: subtree names sort as if
    /// suffixed with `/`, so `"foo"` (a file) sorts before `"foo.txt"` but
    /// `"foo/"` (a directory) sorts after it, matching the byte-order a
    /// flat path listing would produce.
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.name.as_bytes().to_vec();
        if self.mode.is_dir() {
            key.push(b'/');
        }
        key
    }
}

fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('\0') || name.contains('/') {
        return Err(Error::Other(format!("invalid tree entry name: {name:?}")));
    }
    Ok(())
}

/// An unordered-by-caller, canonically-ordered set of tree entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a tree from entries in any order, canonicalising them.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn canonical_encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(format!("{:o} ", entry.mode.octal()).as_bytes());
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.hash.as_bytes());
        }
        out
    }

    /// Decodes a tree's canonical encoding. Accepts entries in any order
    /// but `Tree::new`'s constructor canonicalises on re-encode, so the
    /// round-trip `decode(encode(tree))` is always sorted.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut cursor = bytes;
        while !cursor.is_empty() {
            let sp = cursor
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| malformed("missing mode separator"))?;
            let mode_str = std::str::from_utf8(&cursor[..sp])
                .map_err(|_| malformed("non-utf8 mode"))?;
            let mode_val =
                u32::from_str_radix(mode_str, 8).map_err(|_| malformed("non-octal mode"))?;
            let mode = FileMode::from_octal(mode_val)
                .ok_or_else(|| malformed(format!("unknown mode {mode_val:o}")))?;
            cursor = &cursor[sp + 1..];

            let nul = cursor
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| malformed("missing NUL after name"))?;
            let name = std::str::from_utf8(&cursor[..nul])
                .map_err(|_| malformed("non-utf8 name"))?
                .to_string();
            cursor = &cursor[nul + 1..];

            if cursor.len() < OID_RAW_LEN {
                return Err(malformed("truncated hash"));
            }
            let hash = Oid::try_from_slice(&cursor[..OID_RAW_LEN]).unwrap();
            cursor = &cursor[OID_RAW_LEN..];

            // `size` is not part of the canonical encoding (it is
            // informational only, per §3); store zero and let callers that
            // need it look the referenced object up.
            entries.push(TreeEntry {
                name,
                mode,
                hash,
                size: 0,
            });
        }
        Ok(Self::new(entries))
    }

    pub fn from_sorted_entries(entries: Vec<TreeEntry>) -> Self {
        debug_assert!(
            entries
                .windows(2)
                .all(|w| w[0].sort_key() <= w[1].sort_key())
        );
        Self { entries }
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    super::decode_error(super::ObjectKind::Tree, reason)
}
