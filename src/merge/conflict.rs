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

//! The outcome types a three-way merge produces: `Conflict` and
//! `MergeResult`.

use crate::object::FileMode;
use crate::oid::Oid;

/// What kind of collision a [`Conflict`] records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    RenameRename,
    FileDirectory,
    Contents,
    Binary,
    DistinctModes,
    ModifyDelete,
}

/// One side of a conflict: the path it was recorded under, its mode, and
/// its content hash (`None` when that side deleted the entry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictSide {
    pub path: String,
    pub mode: Option<FileMode>,
    pub oid: Option<Oid>,
}

impl ConflictSide {
    pub fn present(path: impl Into<String>, mode: FileMode, oid: Oid) -> Self {
        Self {
            path: path.into(),
            mode: Some(mode),
            oid: Some(oid),
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: None,
            oid: None,
        }
    }
}

/// A single unresolved (or flagged-but-resolved) collision produced by
/// [`super::merge_trees`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub ancestor: Option<ConflictSide>,
    pub our: Option<ConflictSide>,
    pub their: Option<ConflictSide>,
}

/// The result of a three-way merge: the OID of the merged tree, every
/// conflict encountered (including ones that were still resolved to a
/// best-effort value), and free-form diagnostic messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeResult {
    pub new_tree: Oid,
    pub conflicts: Vec<Conflict>,
    pub messages: Vec<String>,
}

impl MergeResult {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}
