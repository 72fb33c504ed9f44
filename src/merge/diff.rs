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

//! Flattening a tree into a path table, and diffing one flattened tree
//! against another (§4.7 step 1). Rename detection is exact-hash-only, as
//! the spec requires: an entry only counts as a rename if its mode and
//! content hash are unchanged between the deleted and inserted path.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::object::FileMode;
use crate::object::ObjectKind;
use crate::object::Tree;
use crate::oid::Oid;
use crate::store::Store;

/// A leaf (non-directory) entry at some flattened path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafEntry {
    pub mode: FileMode,
    pub oid: Oid,
    pub size: u64,
}

/// Recursively flattens a tree into a `path -> LeafEntry` table. Directory
/// entries do not themselves appear in the output; only the leaves they
/// contain do, addressed by their full slash-joined path.
pub fn flatten_tree(store: &Store, tree_oid: Oid) -> Result<BTreeMap<String, LeafEntry>> {
    let mut out = BTreeMap::new();
    flatten_into(store, tree_oid, "", &mut out)?;
    Ok(out)
}

fn flatten_into(
    store: &Store,
    tree_oid: Oid,
    prefix: &str,
    out: &mut BTreeMap<String, LeafEntry>,
) -> Result<()> {
    let bytes = store.open_read(&tree_oid, ObjectKind::Tree)?.read_to_end()?;
    let tree = Tree::decode(&bytes)?;
    for entry in tree.entries() {
        let path = join(prefix, &entry.name);
        if entry.mode.is_dir() {
            flatten_into(store, entry.hash, &path, out)?;
        } else {
            out.insert(
                path,
                LeafEntry {
                    mode: entry.mode,
                    oid: entry.hash,
                    size: entry.size,
                },
            );
        }
    }
    Ok(())
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// The raw changes one side made relative to the base, before the two
/// sides' diffs are merged together (§4.7 steps 1-2).
#[derive(Debug, Default, Clone)]
pub struct SideDiff {
    pub deleted: BTreeMap<String, LeafEntry>,
    pub inserted: BTreeMap<String, LeafEntry>,
    pub modified: BTreeMap<String, (LeafEntry, LeafEntry)>,
    /// `old_path -> new_path`, populated only for exact-hash renames: the
    /// moved entry's mode and content hash are identical at both ends.
    pub renames: BTreeMap<String, String>,
}

/// Diffs `side` against `base`, both already flattened, classifying every
/// touched path as a delete, insert, modify, or (when content is
/// unchanged) a rename.
pub fn diff_against_base(
    base: &BTreeMap<String, LeafEntry>,
    side: &BTreeMap<String, LeafEntry>,
) -> SideDiff {
    let mut deleted = BTreeMap::new();
    let mut inserted = BTreeMap::new();
    let mut modified = BTreeMap::new();

    for (path, base_entry) in base {
        match side.get(path) {
            Some(side_entry) if side_entry == base_entry => {}
            Some(side_entry) => {
                modified.insert(path.clone(), (*base_entry, *side_entry));
            }
            None => {
                deleted.insert(path.clone(), *base_entry);
            }
        }
    }
    for (path, side_entry) in side {
        if !base.contains_key(path) {
            inserted.insert(path.clone(), *side_entry);
        }
    }

    let renames = detect_renames(&mut deleted, &mut inserted);
    SideDiff {
        deleted,
        inserted,
        modified,
        renames,
    }
}

/// Pairs each deleted path with the lexicographically smallest
/// not-yet-claimed inserted path carrying the same mode and content hash,
/// removing both sides from their maps. Deterministic across runs since
/// both maps are iterated in sorted (`BTreeMap`) order and ties are broken
/// by destination path.
fn detect_renames(
    deleted: &mut BTreeMap<String, LeafEntry>,
    inserted: &mut BTreeMap<String, LeafEntry>,
) -> BTreeMap<String, String> {
    let mut renames = BTreeMap::new();
    let mut claimed = std::collections::BTreeSet::new();

    for (old_path, entry) in deleted.iter() {
        let candidate = inserted
            .iter()
            .filter(|(new_path, new_entry)| {
                !claimed.contains(*new_path)
                    && new_entry.mode == entry.mode
                    && new_entry.oid == entry.oid
            })
            .map(|(new_path, _)| new_path.clone())
            .min();
        if let Some(new_path) = candidate {
            claimed.insert(new_path.clone());
            renames.insert(old_path.clone(), new_path);
        }
    }

    for (old_path, new_path) in &renames {
        deleted.remove(old_path);
        inserted.remove(new_path);
    }
    renames
}
