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

//! The typed object model (C3): `Commit | Tree | Fragments | Tag | Blob`,
//! represented as a tagged variant rather than a class hierarchy, with a
//! canonical byte encoding per kind. Two entities are equal iff their
//! canonical bytes are equal, which is equivalent to their OIDs being equal.

pub mod blob;
pub mod commit;
pub mod fragments;
pub mod tag;
pub mod tree;

use std::fmt;

use crate::error::Error;
use crate::error::Result;
use crate::oid::Oid;

pub use commit::Commit;
pub use commit::Signature;
pub use commit::Timestamp;
pub use fragments::ChunkEntry;
pub use fragments::Fragments;
pub use tag::Tag;
pub use tree::FileMode;
pub use tree::Tree;
pub use tree::TreeEntry;

/// Which kind of object a persisted entity is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Commit,
    Tree,
    Fragments,
    Tag,
    Blob,
}

impl ObjectKind {
    /// Whether this kind is "metadata" (anything but a blob). The backend
    /// store and the pack-stream codec both use this distinction for
    /// statistics and framing, never for addressing (§4.1).
    pub fn is_metadata(self) -> bool {
        !matches!(self, Self::Blob)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Fragments => "fragments",
            Self::Tag => "tag",
            Self::Blob => "blob",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "commit" => Self::Commit,
            "tree" => Self::Tree,
            "fragments" => Self::Fragments,
            "tag" => Self::Tag,
            "blob" => Self::Blob,
            _ => return None,
        })
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully decoded object of any kind, tagged by variant so the walker and
/// the store's generic paths can dispatch without downcasting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Commit(Commit),
    Tree(Tree),
    Fragments(Fragments),
    Tag(Tag),
    Blob(Vec<u8>),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Fragments(_) => ObjectKind::Fragments,
            Self::Tag(_) => ObjectKind::Tag,
            Self::Blob(_) => ObjectKind::Blob,
        }
    }

    /// The canonical encoding whose hash is this object's OID.
    pub fn canonical_encode(&self) -> Vec<u8> {
        match self {
            Self::Commit(c) => c.canonical_encode(),
            Self::Tree(t) => t.canonical_encode(),
            Self::Fragments(f) => f.canonical_encode(),
            Self::Tag(t) => t.canonical_encode(),
            Self::Blob(b) => b.clone(),
        }
    }

    pub fn id(&self) -> Oid {
        Oid::hash(&self.canonical_encode())
    }

    pub fn decode(kind: ObjectKind, bytes: &[u8]) -> Result<Self> {
        Ok(match kind {
            ObjectKind::Commit => Self::Commit(Commit::decode(bytes)?),
            ObjectKind::Tree => Self::Tree(Tree::decode(bytes)?),
            ObjectKind::Fragments => Self::Fragments(Fragments::decode(bytes)?),
            ObjectKind::Tag => Self::Tag(Tag::decode(bytes)?),
            ObjectKind::Blob => Self::Blob(bytes.to_vec()),
        })
    }
}

pub(crate) fn decode_error(kind: ObjectKind, reason: impl Into<String>) -> Error {
    Error::Other(format!("malformed {kind} object: {}", reason.into()))
}
