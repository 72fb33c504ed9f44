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

//! The three-way tree merge (C8): diffs `ours` and `theirs` against a
//! common `base`, resolves renames, file/directory collisions, and
//! per-path content conflicts (delegating text conflicts to
//! [`crate::text_merge`]), then rebuilds a merged tree bottom-up.

pub mod conflict;
pub mod diff;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;
use tracing::instrument;

pub use conflict::Conflict;
pub use conflict::ConflictKind;
pub use conflict::ConflictSide;
pub use conflict::MergeResult;
use diff::LeafEntry;

use crate::config::RepoConfig;
use crate::error::Error;
use crate::error::Result;
use crate::object::FileMode;
use crate::object::ObjectKind;
use crate::object::Tree;
use crate::object::TreeEntry;
use crate::oid::Oid;
use crate::store::Store;
use crate::text_merge;

/// Branch labels used in conflict markers and file/directory-conflict
/// renaming (§4.7 step 4, §4.8).
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub our_label: String,
    pub their_label: String,
}

/// Runs the three-way merge contract: `merge(base, ours, theirs, options)
/// -> MergeResult { new_tree, conflicts, messages }` (§4.7). Writes any
/// new blobs/trees the merge produces but never touches refs or the
/// working tree.
#[instrument(skip(store, config, options))]
pub fn merge_trees(
    store: &Store,
    config: &RepoConfig,
    base: Oid,
    ours: Oid,
    theirs: Oid,
    options: &MergeOptions,
) -> Result<MergeResult> {
    let base_map = diff::flatten_tree(store, base)?;
    let our_map = diff::flatten_tree(store, ours)?;
    let their_map = diff::flatten_tree(store, theirs)?;

    let our_diff = diff::diff_against_base(&base_map, &our_map);
    let their_diff = diff::diff_against_base(&base_map, &their_map);

    let mut final_map: BTreeMap<String, LeafEntry> = base_map.clone();
    let mut conflicts = Vec::new();
    let mut messages = Vec::new();

    let mut handled: BTreeSet<String> = BTreeSet::new();

    resolve_renames(
        store,
        &base_map,
        &our_diff,
        &their_diff,
        &mut final_map,
        &mut handled,
        &mut conflicts,
    )?;

    resolve_modify_delete(
        store,
        config,
        options,
        &base_map,
        &our_diff,
        &their_diff,
        &handled,
        &mut final_map,
        &mut conflicts,
    )?;

    resolve_inserts(
        store,
        config,
        options,
        &our_diff,
        &their_diff,
        &mut final_map,
        &mut conflicts,
    )?;

    resolve_file_directory_conflicts(
        &our_map,
        &their_map,
        options,
        &mut final_map,
        &mut conflicts,
        &mut messages,
    );

    let new_tree = build_tree(store, &final_map)?;
    debug!(
        new_tree = %new_tree,
        conflicts = conflicts.len(),
        "merge complete"
    );
    Ok(MergeResult {
        new_tree,
        conflicts,
        messages,
    })
}

/// §4.7 steps 2-3: pairs up each side's exact-hash renames, flags
/// rename/rename conflicts, and folds consistent renames (or a rename
/// opposite an unchanged/modified/deleted other side) into `final_map`.
fn resolve_renames(
    store: &Store,
    base_map: &BTreeMap<String, LeafEntry>,
    our_diff: &diff::SideDiff,
    their_diff: &diff::SideDiff,
    final_map: &mut BTreeMap<String, LeafEntry>,
    handled: &mut BTreeSet<String>,
    conflicts: &mut Vec<Conflict>,
) -> Result<()> {
    let sources: BTreeSet<&String> = our_diff
        .renames
        .keys()
        .chain(their_diff.renames.keys())
        .collect();

    for source in sources {
        handled.insert(source.clone());
        final_map.remove(source);
        let base_entry = base_map[source];
        let our_dest = our_diff.renames.get(source);
        let their_dest = their_diff.renames.get(source);

        match (our_dest, their_dest) {
            (Some(da), Some(db)) if da == db => {
                final_map.insert(da.clone(), base_entry);
            }
            (Some(da), Some(db)) => {
                conflicts.push(Conflict {
                    kind: ConflictKind::RenameRename,
                    ancestor: Some(ConflictSide::present(
                        source.clone(),
                        base_entry.mode,
                        base_entry.oid,
                    )),
                    our: Some(ConflictSide::present(da.clone(), base_entry.mode, base_entry.oid)),
                    their: Some(ConflictSide::present(db.clone(), base_entry.mode, base_entry.oid)),
                });
                // Deterministic across runs: the lexicographically
                // smaller destination wins a slot in the output tree.
                let winner = if da <= db { da } else { db };
                final_map.insert(winner.clone(), base_entry);
            }
            (Some(da), None) => {
                resolve_one_sided_rename(
                    store,
                    source,
                    da,
                    base_entry,
                    their_diff,
                    final_map,
                    conflicts,
                    true,
                )?;
            }
            (None, Some(db)) => {
                resolve_one_sided_rename(
                    store,
                    source,
                    db,
                    base_entry,
                    our_diff,
                    final_map,
                    conflicts,
                    false,
                )?;
            }
            (None, None) => unreachable!("source only collected from a rename map"),
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn resolve_one_sided_rename(
    _store: &Store,
    source: &str,
    dest: &str,
    base_entry: LeafEntry,
    other_diff: &diff::SideDiff,
    final_map: &mut BTreeMap<String, LeafEntry>,
    conflicts: &mut Vec<Conflict>,
    mover_is_ours: bool,
) -> Result<()> {
    if let Some((_, other_entry)) = other_diff.modified.get(source) {
        // The mover left content untouched (that's what makes it a
        // detected rename); the other side's edit in place wins and
        // travels with the move.
        final_map.insert(dest.to_string(), *other_entry);
    } else if other_diff.deleted.contains_key(source) {
        let (our_side, their_side) = if mover_is_ours {
            (
                Some(ConflictSide::present(dest, base_entry.mode, base_entry.oid)),
                Some(ConflictSide::deleted(source)),
            )
        } else {
            (
                Some(ConflictSide::deleted(source)),
                Some(ConflictSide::present(dest, base_entry.mode, base_entry.oid)),
            )
        };
        conflicts.push(Conflict {
            kind: ConflictKind::ModifyDelete,
            ancestor: Some(ConflictSide::present(source, base_entry.mode, base_entry.oid)),
            our: our_side,
            their: their_side,
        });
        final_map.insert(dest.to_string(), base_entry);
    } else {
        // Other side left it alone: a clean move.
        final_map.insert(dest.to_string(), base_entry);
    }
    Ok(())
}

/// §4.7 step 5 (minus renames, handled above, and fresh inserts, handled
/// by [`resolve_inserts`]): every base path either side modified or
/// deleted in place.
#[allow(clippy::too_many_arguments)]
fn resolve_modify_delete(
    store: &Store,
    config: &RepoConfig,
    options: &MergeOptions,
    base_map: &BTreeMap<String, LeafEntry>,
    our_diff: &diff::SideDiff,
    their_diff: &diff::SideDiff,
    handled: &BTreeSet<String>,
    final_map: &mut BTreeMap<String, LeafEntry>,
    conflicts: &mut Vec<Conflict>,
) -> Result<()> {
    let touched: BTreeSet<&String> = our_diff
        .deleted
        .keys()
        .chain(our_diff.modified.keys())
        .chain(their_diff.deleted.keys())
        .chain(their_diff.modified.keys())
        .filter(|p| !handled.contains(*p))
        .collect();

    for path in touched {
        let base_entry = base_map[path];
        let our_modified = our_diff.modified.get(path).map(|(_, a)| *a);
        let their_modified = their_diff.modified.get(path).map(|(_, b)| *b);
        let our_deleted = our_diff.deleted.contains_key(path);
        let their_deleted = their_diff.deleted.contains_key(path);

        match (our_modified, our_deleted, their_modified, their_deleted) {
            (Some(a), _, None, false) => {
                final_map.insert(path.clone(), a);
            }
            (None, false, Some(b), _) => {
                final_map.insert(path.clone(), b);
            }
            (Some(a), _, Some(b), _) if a == b => {
                final_map.insert(path.clone(), a);
            }
            (Some(a), _, Some(b), _) => {
                let resolved = merge_modified_both(store, config, options, path, base_entry, a, b, conflicts)?;
                final_map.insert(path.clone(), resolved);
            }
            (None, true, None, false) => {
                final_map.remove(path);
            }
            (None, false, None, true) => {
                final_map.remove(path);
            }
            (None, true, None, true) => {
                final_map.remove(path);
            }
            (Some(a), _, None, true) => {
                conflicts.push(Conflict {
                    kind: ConflictKind::ModifyDelete,
                    ancestor: Some(ConflictSide::present(path.clone(), base_entry.mode, base_entry.oid)),
                    our: Some(ConflictSide::present(path.clone(), a.mode, a.oid)),
                    their: Some(ConflictSide::deleted(path.clone())),
                });
                final_map.insert(path.clone(), a);
            }
            (None, true, Some(b), _) => {
                conflicts.push(Conflict {
                    kind: ConflictKind::ModifyDelete,
                    ancestor: Some(ConflictSide::present(path.clone(), base_entry.mode, base_entry.oid)),
                    our: Some(ConflictSide::deleted(path.clone())),
                    their: Some(ConflictSide::present(path.clone(), b.mode, b.oid)),
                });
                final_map.insert(path.clone(), b);
            }
            (None, false, None, false) => {
                unreachable!("path would not be in the touched set otherwise")
            }
        }
    }
    Ok(())
}

/// §4.7 step 5, "added on both sides": brand-new paths absent from base.
fn resolve_inserts(
    store: &Store,
    config: &RepoConfig,
    options: &MergeOptions,
    our_diff: &diff::SideDiff,
    their_diff: &diff::SideDiff,
    final_map: &mut BTreeMap<String, LeafEntry>,
    conflicts: &mut Vec<Conflict>,
) -> Result<()> {
    let paths: BTreeSet<&String> = our_diff
        .inserted
        .keys()
        .chain(their_diff.inserted.keys())
        .collect();

    for path in paths {
        let a = our_diff.inserted.get(path).copied();
        let b = their_diff.inserted.get(path).copied();
        match (a, b) {
            (Some(a), None) => {
                final_map.insert(path.clone(), a);
            }
            (None, Some(b)) => {
                final_map.insert(path.clone(), b);
            }
            (Some(a), Some(b)) if a == b => {
                final_map.insert(path.clone(), a);
            }
            (Some(a), Some(b)) => {
                let resolved = merge_added_both(store, config, options, path, a, b, conflicts)?;
                final_map.insert(path.clone(), resolved);
            }
            (None, None) => unreachable!("path only collected from an inserted map"),
        }
    }
    Ok(())
}

fn is_text_mergeable(a: &LeafEntry, b: &LeafEntry, max_bytes: u64) -> bool {
    a.mode != FileMode::FragmentsPointer
        && b.mode != FileMode::FragmentsPointer
        && a.size <= max_bytes
        && b.size <= max_bytes
}

fn read_blob(store: &Store, oid: Oid) -> Result<Vec<u8>> {
    store.open_read(&oid, ObjectKind::Blob)?.read_to_end()
}

#[allow(clippy::too_many_arguments)]
fn merge_modified_both(
    store: &Store,
    config: &RepoConfig,
    options: &MergeOptions,
    path: &str,
    base: LeafEntry,
    ours: LeafEntry,
    theirs: LeafEntry,
    conflicts: &mut Vec<Conflict>,
) -> Result<LeafEntry> {
    let (mode, distinct_modes) = merge_mode(base.mode, ours.mode, theirs.mode);
    if !is_text_mergeable(&ours, &theirs, config.merge.text_merge_max_bytes) {
        conflicts.push(binary_conflict(path, Some(base), ours, theirs));
        return Ok(LeafEntry {
            mode: ours.mode,
            ..ours
        });
    }

    let base_bytes = read_blob(store, base.oid)?;
    let our_bytes = read_blob(store, ours.oid)?;
    let their_bytes = read_blob(store, theirs.oid)?;

    match text_merge::merge_text(
        &config.merge,
        &base_bytes,
        &our_bytes,
        &their_bytes,
        path,
        &options.our_label,
        &options.their_label,
    ) {
        Ok((merged, had_conflict)) => {
            let oid = store.write(&merged, ObjectKind::Blob)?;
            if had_conflict {
                conflicts.push(Conflict {
                    kind: ConflictKind::Contents,
                    ancestor: Some(ConflictSide::present(path, base.mode, base.oid)),
                    our: Some(ConflictSide::present(path, ours.mode, ours.oid)),
                    their: Some(ConflictSide::present(path, theirs.mode, theirs.oid)),
                });
            }
            if distinct_modes {
                conflicts.push(Conflict {
                    kind: ConflictKind::DistinctModes,
                    ancestor: Some(ConflictSide::present(path, base.mode, base.oid)),
                    our: Some(ConflictSide::present(path, ours.mode, ours.oid)),
                    their: Some(ConflictSide::present(path, theirs.mode, theirs.oid)),
                });
            }
            Ok(LeafEntry {
                mode,
                oid,
                size: merged.len() as u64,
            })
        }
        Err(Error::NonTextContent(_)) => {
            conflicts.push(binary_conflict(path, Some(base), ours, theirs));
            Ok(LeafEntry {
                mode: ours.mode,
                ..ours
            })
        }
        Err(other) => Err(other),
    }
}

fn merge_added_both(
    store: &Store,
    config: &RepoConfig,
    options: &MergeOptions,
    path: &str,
    ours: LeafEntry,
    theirs: LeafEntry,
    conflicts: &mut Vec<Conflict>,
) -> Result<LeafEntry> {
    if !is_text_mergeable(&ours, &theirs, config.merge.text_merge_max_bytes) {
        conflicts.push(binary_conflict(path, None, ours, theirs));
        return Ok(ours);
    }

    let our_bytes = read_blob(store, ours.oid)?;
    let their_bytes = read_blob(store, theirs.oid)?;

    match text_merge::merge_text(
        &config.merge,
        b"",
        &our_bytes,
        &their_bytes,
        "",
        &options.our_label,
        &options.their_label,
    ) {
        Ok((merged, had_conflict)) => {
            let oid = store.write(&merged, ObjectKind::Blob)?;
            if had_conflict {
                conflicts.push(Conflict {
                    kind: ConflictKind::Contents,
                    ancestor: None,
                    our: Some(ConflictSide::present(path, ours.mode, ours.oid)),
                    their: Some(ConflictSide::present(path, theirs.mode, theirs.oid)),
                });
            }
            Ok(LeafEntry {
                mode: ours.mode,
                oid,
                size: merged.len() as u64,
            })
        }
        Err(Error::NonTextContent(_)) => {
            conflicts.push(binary_conflict(path, None, ours, theirs));
            Ok(ours)
        }
        Err(other) => Err(other),
    }
}

fn binary_conflict(path: &str, base: Option<LeafEntry>, ours: LeafEntry, theirs: LeafEntry) -> Conflict {
    Conflict {
        kind: ConflictKind::Binary,
        ancestor: base.map(|b| ConflictSide::present(path, b.mode, b.oid)),
        our: Some(ConflictSide::present(path, ours.mode, ours.oid)),
        their: Some(ConflictSide::present(path, theirs.mode, theirs.oid)),
    }
}

/// §4.7 step 5 bullet 4's mode-merge rule. Returns the resolved mode and
/// whether `CONFLICT_DISTINCT_MODES` should also be flagged.
fn merge_mode(base: FileMode, ours: FileMode, theirs: FileMode) -> (FileMode, bool) {
    if base == ours {
        (theirs, false)
    } else if base == theirs {
        (ours, false)
    } else if ours == theirs {
        (ours, true)
    } else {
        (ours, true)
    }
}

/// §4.7 step 4: a leaf path that is also a strict prefix of another path
/// in the merged result is renamed aside rather than silently shadowing
/// (or being shadowed by) the directory it collides with.
fn resolve_file_directory_conflicts(
    our_map: &BTreeMap<String, LeafEntry>,
    their_map: &BTreeMap<String, LeafEntry>,
    options: &MergeOptions,
    final_map: &mut BTreeMap<String, LeafEntry>,
    conflicts: &mut Vec<Conflict>,
    messages: &mut Vec<String>,
) {
    loop {
        let paths: Vec<String> = final_map.keys().cloned().collect();
        let collision = paths.iter().find_map(|path| {
            let prefix = format!("{path}/");
            paths
                .iter()
                .find(|other| other.starts_with(&prefix))
                .map(|other| (path.clone(), other.clone()))
        });
        let Some((file_path, dir_child_path)) = collision else {
            break;
        };

        let entry = final_map[&file_path];
        let branch_label = if our_map.contains_key(&file_path) {
            &options.our_label
        } else {
            &options.their_label
        };
        let renamed = format!("{file_path}~{}", sanitize_branch_name(branch_label));

        final_map.remove(&file_path);
        final_map.insert(renamed.clone(), entry);
        conflicts.push(Conflict {
            kind: ConflictKind::FileDirectory,
            ancestor: None,
            our: Some(ConflictSide::present(renamed.clone(), entry.mode, entry.oid)),
            their: Some(ConflictSide::present(dir_child_path.clone(), entry.mode, entry.oid)),
        });
        messages.push(format!(
            "file/directory conflict at {file_path:?}: renamed to {renamed:?}"
        ));
    }
}

/// Replaces anything that isn't a path-safe identifier character so the
/// renamed leaf stays a single valid entry name (§4.7 step 4).
fn sanitize_branch_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

enum Node {
    Leaf(LeafEntry),
    Dir(BTreeMap<String, Node>),
}

/// §4.7 step 6: rebuilds a nested tree bottom-up from the flat merged
/// path table. Every subtree is written through [`Store::write`], which
/// already deduplicates by canonical encoding, so an unchanged subtree
/// reuses its existing OID rather than being rewritten.
fn build_tree(store: &Store, entries: &BTreeMap<String, LeafEntry>) -> Result<Oid> {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for (path, entry) in entries {
        let parts: Vec<&str> = path.split('/').collect();
        insert_node(&mut root, &parts, *entry);
    }
    write_node(store, &Node::Dir(root))
}

fn insert_node(map: &mut BTreeMap<String, Node>, parts: &[&str], entry: LeafEntry) {
    if parts.len() == 1 {
        map.insert(parts[0].to_string(), Node::Leaf(entry));
        return;
    }
    let child = map
        .entry(parts[0].to_string())
        .or_insert_with(|| Node::Dir(BTreeMap::new()));
    if let Node::Dir(sub) = child {
        insert_node(sub, &parts[1..], entry);
    }
}

fn write_node(store: &Store, node: &Node) -> Result<Oid> {
    match node {
        Node::Leaf(entry) => Ok(entry.oid),
        Node::Dir(children) => {
            let mut tree_entries = Vec::with_capacity(children.len());
            for (name, child) in children {
                match child {
                    Node::Leaf(entry) => {
                        tree_entries.push(TreeEntry::new(name.clone(), entry.mode, entry.oid, entry.size)?);
                    }
                    Node::Dir(_) => {
                        let sub_oid = write_node(store, child)?;
                        tree_entries.push(TreeEntry::new(name.clone(), FileMode::Directory, sub_oid, 0)?);
                    }
                }
            }
            let tree = Tree::new(tree_entries);
            store.write(&tree.canonical_encode(), ObjectKind::Tree)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::TreeEntry as TE;

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();
        (dir, store)
    }

    fn blob(store: &Store, content: &[u8]) -> Oid {
        store.write(content, ObjectKind::Blob).unwrap()
    }

    fn tree(store: &Store, entries: Vec<TE>) -> Oid {
        store
            .write(&Tree::new(entries).canonical_encode(), ObjectKind::Tree)
            .unwrap()
    }

    fn options() -> MergeOptions {
        MergeOptions {
            our_label: "ours".to_string(),
            their_label: "theirs".to_string(),
        }
    }

    #[test]
    fn merging_a_branch_against_itself_is_a_no_op() {
        let (_dir, store) = store();
        let config = RepoConfig::default();
        let blob_a = blob(&store, b"content");
        let t = tree(&store, vec![TE::new("a.txt", FileMode::Regular, blob_a, 7).unwrap()]);

        let result = merge_trees(&store, &config, t, t, t, &options()).unwrap();
        assert!(result.is_clean());
        assert_eq!(result.new_tree, t);
    }

    #[test]
    fn merging_against_unchanged_base_takes_the_other_side() {
        let (_dir, store) = store();
        let config = RepoConfig::default();
        let base_blob = blob(&store, b"one\ntwo\nthree\n");
        let base = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, base_blob, 14).unwrap()],
        );
        let ours_blob = blob(&store, b"1\none\ntwo\nthree\n");
        let ours = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, ours_blob, 16).unwrap()],
        );

        let result = merge_trees(&store, &config, base, ours, base, &options()).unwrap();
        assert!(result.is_clean());
        assert_eq!(result.new_tree, ours);

        let result = merge_trees(&store, &config, base, base, ours, &options()).unwrap();
        assert!(result.is_clean());
        assert_eq!(result.new_tree, ours);
    }

    #[test]
    fn independent_line_inserts_merge_cleanly() {
        let (_dir, store) = store();
        let config = RepoConfig::default();
        let base_blob = blob(&store, b"one\ntwo\nthree\n");
        let base = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, base_blob, 14).unwrap()],
        );
        let ours_blob = blob(&store, b"1\none\ntwo\nthree\n");
        let ours = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, ours_blob, 16).unwrap()],
        );
        let theirs_blob = blob(&store, b"one\ntwo\nthree\n4\n");
        let theirs = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, theirs_blob, 16).unwrap()],
        );

        let result = merge_trees(&store, &config, base, ours, theirs, &options()).unwrap();
        assert!(result.is_clean(), "conflicts: {:?}", result.conflicts);

        let merged_tree = Tree::decode(
            &store
                .open_read(&result.new_tree, ObjectKind::Tree)
                .unwrap()
                .read_to_end()
                .unwrap(),
        )
        .unwrap();
        let entry = merged_tree.get("a.txt").unwrap();
        let content = store.open_read(&entry.hash, ObjectKind::Blob).unwrap().read_to_end().unwrap();
        assert_eq!(content, b"1\none\ntwo\nthree\n4\n");
    }

    #[test]
    fn rename_rename_conflict_is_reported_and_stable() {
        let (_dir, store) = store();
        let config = RepoConfig::default();
        let content = blob(&store, b"same content");
        let base = tree(
            &store,
            vec![TE::new("m.txt", FileMode::Regular, content, 12).unwrap()],
        );
        let ours = tree(
            &store,
            vec![TE::new("lib_m.txt", FileMode::Regular, content, 12).unwrap()],
        );
        let theirs = tree(
            &store,
            vec![TE::new("pkg_m.txt", FileMode::Regular, content, 12).unwrap()],
        );

        let result = merge_trees(&store, &config, base, ours, theirs, &options()).unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::RenameRename);

        let merged_tree = Tree::decode(
            &store
                .open_read(&result.new_tree, ObjectKind::Tree)
                .unwrap()
                .read_to_end()
                .unwrap(),
        )
        .unwrap();
        // "lib_m.txt" sorts before "pkg_m.txt"; the deterministic winner.
        assert!(merged_tree.get("lib_m.txt").is_some());
        assert!(merged_tree.get("pkg_m.txt").is_none());
    }

    #[test]
    fn file_directory_collision_renames_the_file() {
        let (_dir, store) = store();
        let config = RepoConfig::default();
        let base = tree(&store, vec![]);

        let file_blob = blob(&store, b"i am a file");
        let ours = tree(
            &store,
            vec![TE::new("x", FileMode::Regular, file_blob, 11).unwrap()],
        );

        let nested_blob = blob(&store, b"i am nested");
        let sub = tree(
            &store,
            vec![TE::new("y", FileMode::Regular, nested_blob, 11).unwrap()],
        );
        let theirs = tree(
            &store,
            vec![TE::new("x", FileMode::Directory, sub, 0).unwrap()],
        );

        let result = merge_trees(&store, &config, base, ours, theirs, &options()).unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::FileDirectory);

        let merged_tree = Tree::decode(
            &store
                .open_read(&result.new_tree, ObjectKind::Tree)
                .unwrap()
                .read_to_end()
                .unwrap(),
        )
        .unwrap();
        assert!(merged_tree.get("x~ours").is_some());
        assert!(merged_tree.get("x").is_some());
    }

    #[test]
    fn modify_delete_conflict_keeps_the_modified_side() {
        let (_dir, store) = store();
        let config = RepoConfig::default();
        let original = blob(&store, b"original");
        let base = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, original, 8).unwrap()],
        );
        let edited = blob(&store, b"edited");
        let ours = tree(
            &store,
            vec![TE::new("a.txt", FileMode::Regular, edited, 6).unwrap()],
        );
        let theirs = tree(&store, vec![]);

        let result = merge_trees(&store, &config, base, ours, theirs, &options()).unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::ModifyDelete);

        let merged_tree = Tree::decode(
            &store
                .open_read(&result.new_tree, ObjectKind::Tree)
                .unwrap()
                .read_to_end()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(merged_tree.get("a.txt").unwrap().hash, edited);
    }
}
