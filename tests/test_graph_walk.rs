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

//! §8 scenario 3: a three-commit linear history, walked against an
//! earlier tip, must emit exactly the new commits/trees/blobs and nothing
//! reachable from the "have" tip.

use std::collections::HashSet;

use hugescm_core::graph;
use hugescm_core::object::Commit;
use hugescm_core::object::FileMode;
use hugescm_core::object::ObjectKind;
use hugescm_core::object::Signature;
use hugescm_core::object::Timestamp;
use hugescm_core::object::Tree;
use hugescm_core::object::TreeEntry;
use hugescm_core::oid::Oid;
use hugescm_core::store::Store;

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

fn commit_with(store: &Store, tree: Oid, parents: Vec<Oid>) -> Oid {
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
fn linear_history_walk_emits_only_the_new_commits_and_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::init(dir.path()).unwrap();

    let blob0 = store.write(b"blob0", ObjectKind::Blob).unwrap();
    let tree0 = store
        .write(
            &Tree::new(vec![TreeEntry::new("a", FileMode::Regular, blob0, 5).unwrap()]).canonical_encode(),
            ObjectKind::Tree,
        )
        .unwrap();
    let c0 = commit_with(&store, tree0, vec![]);

    let blob1 = store.write(b"blob1", ObjectKind::Blob).unwrap();
    let tree1 = store
        .write(
            &Tree::new(vec![
                TreeEntry::new("a", FileMode::Regular, blob0, 5).unwrap(),
                TreeEntry::new("b", FileMode::Regular, blob1, 5).unwrap(),
            ])
            .canonical_encode(),
            ObjectKind::Tree,
        )
        .unwrap();
    let c1 = commit_with(&store, tree1, vec![c0]);

    let blob2 = store.write(b"blob2", ObjectKind::Blob).unwrap();
    let tree2 = store
        .write(
            &Tree::new(vec![
                TreeEntry::new("a", FileMode::Regular, blob0, 5).unwrap(),
                TreeEntry::new("b", FileMode::Regular, blob1, 5).unwrap(),
                TreeEntry::new("c", FileMode::Regular, blob2, 5).unwrap(),
            ])
            .canonical_encode(),
            ObjectKind::Tree,
        )
        .unwrap();
    let c2 = commit_with(&store, tree2, vec![c1]);

    let result = graph::walk(&store, c2, None, Some(c0), 20 * 1024 * 1024).unwrap();

    let metadata: HashSet<_> = result.metadata.into_iter().collect();
    assert_eq!(metadata, HashSet::from([c1, c2, tree1, tree2]));

    let objects: HashSet<_> = result.objects.into_iter().collect();
    assert_eq!(objects, HashSet::from([blob1, blob2]));

    for have in [c0, tree0, blob0] {
        assert!(!metadata.contains(&have) && !objects.contains(&have));
    }
}
