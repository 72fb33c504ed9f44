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

//! The graph walker (C4): given a tip and a peer's known state, enumerate
//! exactly the objects the peer lacks.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::object::Commit;
use crate::object::FileMode;
use crate::object::Fragments;
use crate::object::ObjectKind;
use crate::object::Tree;
use crate::oid::Oid;
use crate::store::Store;

/// The set of objects a push (or fetch) must transmit to bring a peer up
/// to `new_tip`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushObjects {
    pub metadata: Vec<Oid>,
    pub objects: Vec<Oid>,
    pub large_objects: Vec<(Oid, u64)>,
}

/// Enumerates the objects reachable from `new_tip` that are not already
/// known to the peer, classifying blobs above `large_threshold` bytes
/// separately (§4.3).
pub fn walk(
    store: &Store,
    new_tip: Oid,
    shallow_boundary: Option<Oid>,
    their_tip: Option<Oid>,
    large_threshold: u64,
) -> Result<PushObjects> {
    let have = compute_have_set(store, their_tip, shallow_boundary)?;
    let mut seen = HashSet::new();
    let mut metadata = Vec::new();
    let mut objects = Vec::new();
    let mut large_objects = Vec::new();
    let mut commit_seen = HashSet::new();

    let mut stack = vec![new_tip];
    while let Some(commit_oid) = stack.pop() {
        if have.contains(&commit_oid) || Some(commit_oid) == shallow_boundary {
            continue;
        }
        if !commit_seen.insert(commit_oid) {
            continue;
        }
        let commit = decode_commit(store, commit_oid)?;
        metadata.push(commit_oid);
        seen.insert(commit_oid);
        walk_tree(
            store,
            commit.tree,
            &have,
            &mut seen,
            &mut metadata,
            &mut objects,
            &mut large_objects,
            large_threshold,
        )?;
        for parent in commit.parents.iter().rev() {
            stack.push(*parent);
        }
    }

    debug!(
        metadata = metadata.len(),
        objects = objects.len(),
        large_objects = large_objects.len(),
        "walked graph"
    );
    Ok(PushObjects {
        metadata,
        objects,
        large_objects,
    })
}

/// The set of OIDs already known to the peer: everything reachable from
/// `their_tip`'s full ancestry, plus the shallow boundary commit's own
/// tree (but not its ancestors, which by definition aren't available).
fn compute_have_set(
    store: &Store,
    their_tip: Option<Oid>,
    shallow_boundary: Option<Oid>,
) -> Result<HashSet<Oid>> {
    let mut have = HashSet::new();

    if let Some(tip) = their_tip {
        let mut stack = vec![tip];
        let mut seen = HashSet::new();
        while let Some(oid) = stack.pop() {
            if !seen.insert(oid) {
                continue;
            }
            have.insert(oid);
            let commit = decode_commit(store, oid)?;
            collect_tree_closure(store, commit.tree, &mut have)?;
            stack.extend(&commit.parents);
        }
    }

    if let Some(boundary) = shallow_boundary {
        have.insert(boundary);
        let commit = decode_commit(store, boundary)?;
        collect_tree_closure(store, commit.tree, &mut have)?;
    }

    Ok(have)
}

fn decode_commit(store: &Store, oid: Oid) -> Result<Commit> {
    let bytes = store
        .open_read(&oid, ObjectKind::Commit)
        .map_err(|_| corrupt_graph(oid))?
        .read_to_end()?;
    Commit::decode(&bytes)
}

fn decode_tree(store: &Store, oid: Oid) -> Result<Tree> {
    let bytes = store
        .open_read(&oid, ObjectKind::Tree)
        .map_err(|_| corrupt_graph(oid))?
        .read_to_end()?;
    Tree::decode(&bytes)
}

fn decode_fragments(store: &Store, oid: Oid) -> Result<Fragments> {
    let bytes = store
        .open_read(&oid, ObjectKind::Fragments)
        .map_err(|_| corrupt_graph(oid))?
        .read_to_end()?;
    Fragments::decode(&bytes)
}

#[allow(clippy::too_many_arguments)]
fn walk_tree(
    store: &Store,
    tree_oid: Oid,
    have: &HashSet<Oid>,
    seen: &mut HashSet<Oid>,
    metadata: &mut Vec<Oid>,
    objects: &mut Vec<Oid>,
    large_objects: &mut Vec<(Oid, u64)>,
    large_threshold: u64,
) -> Result<()> {
    if have.contains(&tree_oid) || !seen.insert(tree_oid) {
        return Ok(());
    }
    let tree = decode_tree(store, tree_oid)?;
    metadata.push(tree_oid);
    for entry in tree.entries() {
        match entry.mode {
            FileMode::Directory => walk_tree(
                store,
                entry.hash,
                have,
                seen,
                metadata,
                objects,
                large_objects,
                large_threshold,
            )?,
            FileMode::FragmentsPointer => walk_fragments(
                store,
                entry.hash,
                have,
                seen,
                metadata,
                objects,
                large_objects,
                large_threshold,
            )?,
            // Submodule content lives in another repository's store; there
            // is nothing local to emit.
            FileMode::Submodule => {}
            FileMode::Regular | FileMode::Executable | FileMode::Symlink => {
                classify_blob(store, entry.hash, have, seen, objects, large_objects, large_threshold)?
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn walk_fragments(
    store: &Store,
    fragments_oid: Oid,
    have: &HashSet<Oid>,
    seen: &mut HashSet<Oid>,
    metadata: &mut Vec<Oid>,
    objects: &mut Vec<Oid>,
    large_objects: &mut Vec<(Oid, u64)>,
    large_threshold: u64,
) -> Result<()> {
    if have.contains(&fragments_oid) || !seen.insert(fragments_oid) {
        return Ok(());
    }
    let fragments = decode_fragments(store, fragments_oid)?;
    metadata.push(fragments_oid);
    for chunk in &fragments.chunks {
        if have.contains(&chunk.hash) || !seen.insert(chunk.hash) {
            continue;
        }
        classify_size(chunk.hash, chunk.size, large_threshold, objects, large_objects);
    }
    Ok(())
}

fn classify_blob(
    store: &Store,
    oid: Oid,
    have: &HashSet<Oid>,
    seen: &mut HashSet<Oid>,
    objects: &mut Vec<Oid>,
    large_objects: &mut Vec<(Oid, u64)>,
    large_threshold: u64,
) -> Result<()> {
    if have.contains(&oid) || !seen.insert(oid) {
        return Ok(());
    }
    let size = store.size(&oid, false).map_err(|_| corrupt_graph(oid))?;
    classify_size(oid, size, large_threshold, objects, large_objects);
    Ok(())
}

fn classify_size(
    oid: Oid,
    size: u64,
    large_threshold: u64,
    objects: &mut Vec<Oid>,
    large_objects: &mut Vec<(Oid, u64)>,
) {
    if size > large_threshold {
        large_objects.push((oid, size));
    } else {
        objects.push(oid);
    }
}

/// Walks a tree fully, including directories, fragments and blobs,
/// inserting every OID touched into `out`. Used only to build the "have"
/// set, where largeness classification is irrelevant.
fn collect_tree_closure(store: &Store, tree_oid: Oid, out: &mut HashSet<Oid>) -> Result<()> {
    if !out.insert(tree_oid) {
        return Ok(());
    }
    let tree = decode_tree(store, tree_oid)?;
    for entry in tree.entries() {
        match entry.mode {
            FileMode::Directory => collect_tree_closure(store, entry.hash, out)?,
            FileMode::FragmentsPointer => {
                if out.insert(entry.hash) {
                    let fragments = decode_fragments(store, entry.hash)?;
                    for chunk in fragments.chunks {
                        out.insert(chunk.hash);
                    }
                }
            }
            FileMode::Submodule => {}
            _ => {
                out.insert(entry.hash);
            }
        }
    }
    Ok(())
}

fn corrupt_graph(oid: Oid) -> Error {
    Error::CorruptObject(oid, "missing object reachable from graph walk".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Commit;
    use crate::object::FileMode;
    use crate::object::Object;
    use crate::object::Signature;
    use crate::object::Timestamp;
    use crate::object::Tree;
    use crate::object::TreeEntry;

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();
        (dir, store)
    }

    fn sig() -> Signature {
        Signature {
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            timestamp: Timestamp {
                unix_seconds: 1_700_000_000,
                tz_offset_minutes: 0,
            },
        }
    }

    fn write_blob(store: &Store, content: &[u8]) -> Oid {
        store.write(content, ObjectKind::Blob).unwrap()
    }

    fn write_tree(store: &Store, entries: Vec<TreeEntry>) -> Oid {
        let tree = Tree::new(entries);
        store.write(&tree.canonical_encode(), ObjectKind::Tree).unwrap()
    }

    fn write_commit(store: &Store, tree: Oid, parents: Vec<Oid>) -> Oid {
        let commit = Commit {
            tree,
            parents,
            author: sig(),
            committer: sig(),
            extra_headers: vec![],
            message: "msg".to_string(),
        };
        store.write(&commit.canonical_encode(), ObjectKind::Commit).unwrap()
    }

    #[test]
    fn linear_history_emits_only_new_objects() {
        let (_dir, store) = store();

        let blob0 = write_blob(&store, b"blob0");
        let tree0 = write_tree(
            &store,
            vec![TreeEntry::new("a", FileMode::Regular, blob0, 5).unwrap()],
        );
        let c0 = write_commit(&store, tree0, vec![]);

        let blob1 = write_blob(&store, b"blob1");
        let tree1 = write_tree(
            &store,
            vec![
                TreeEntry::new("a", FileMode::Regular, blob0, 5).unwrap(),
                TreeEntry::new("b", FileMode::Regular, blob1, 5).unwrap(),
            ],
        );
        let c1 = write_commit(&store, tree1, vec![c0]);

        let blob2 = write_blob(&store, b"blob2");
        let tree2 = write_tree(
            &store,
            vec![
                TreeEntry::new("a", FileMode::Regular, blob0, 5).unwrap(),
                TreeEntry::new("b", FileMode::Regular, blob1, 5).unwrap(),
                TreeEntry::new("c", FileMode::Regular, blob2, 5).unwrap(),
            ],
        );
        let c2 = write_commit(&store, tree2, vec![c1]);

        let result = walk(&store, c2, None, Some(c0), 20 * 1024 * 1024).unwrap();

        let metadata: HashSet<_> = result.metadata.into_iter().collect();
        assert!(metadata.contains(&c1));
        assert!(metadata.contains(&c2));
        assert!(metadata.contains(&tree1));
        assert!(metadata.contains(&tree2));
        assert!(!metadata.contains(&c0));
        assert!(!metadata.contains(&tree0));

        let objects: HashSet<_> = result.objects.into_iter().collect();
        assert_eq!(objects, HashSet::from([blob1, blob2]));
        assert!(!objects.contains(&blob0));
    }

    #[test]
    fn missing_their_tip_means_full_send() {
        let (_dir, store) = store();
        let blob = write_blob(&store, b"only");
        let tree = write_tree(&store, vec![TreeEntry::new("a", FileMode::Regular, blob, 4).unwrap()]);
        let commit = write_commit(&store, tree, vec![]);

        let result = walk(&store, commit, None, None, 20 * 1024 * 1024).unwrap();
        assert!(result.metadata.contains(&commit));
        assert!(result.metadata.contains(&tree));
        assert!(result.objects.contains(&blob));
    }

    #[test]
    fn large_blobs_are_classified_separately() {
        let (_dir, store) = store();
        let large_content = vec![0u8; 10];
        let blob = write_blob(&store, &large_content);
        let tree = write_tree(
            &store,
            vec![TreeEntry::new("big", FileMode::Regular, blob, 10).unwrap()],
        );
        let commit = write_commit(&store, tree, vec![]);

        let result = walk(&store, commit, None, None, 5).unwrap();
        assert!(result.objects.is_empty());
        assert_eq!(result.large_objects, vec![(blob, 10)]);
    }

    #[test]
    fn unknown_object_in_closure_is_corrupt_graph() {
        let (_dir, store) = store();
        let ghost_tree = Oid::hash(b"never written");
        let commit = write_commit(&store, ghost_tree, vec![]);
        let err = walk(&store, commit, None, None, 1024).unwrap_err();
        assert!(matches!(err, Error::CorruptObject(_, _)));
    }

    #[test]
    fn object_round_trips_through_store() {
        let (_dir, store) = store();
        let blob_oid = write_blob(&store, b"round trip");
        let obj = Object::Blob(b"round trip".to_vec());
        assert_eq!(obj.id(), blob_oid);
    }
}
