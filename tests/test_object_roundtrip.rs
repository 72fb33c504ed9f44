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

//! End-to-end object round trips through the real backend store (§8
//! scenarios 1-2): writing, reading back, and re-encoding must reproduce
//! identical bytes and identical OIDs.

use hugescm_core::object::Commit;
use hugescm_core::object::ObjectKind;
use hugescm_core::object::Signature;
use hugescm_core::object::Timestamp;
use hugescm_core::oid::EMPTY_BLOB_OID;
use hugescm_core::oid::Oid;
use hugescm_core::store::Store;

fn store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::init(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn empty_blob_identity() {
    let (_dir, store) = store();
    let oid = store.write(&[], ObjectKind::Blob).unwrap();
    assert_eq!(oid, *EMPTY_BLOB_OID);
    let content = store.open_read(&oid, ObjectKind::Blob).unwrap().read_to_end().unwrap();
    assert!(content.is_empty());
}

#[test]
fn commit_round_trip_through_the_store() {
    let (_dir, store) = store();
    let tree = store.write(&[], ObjectKind::Tree).unwrap();
    let parent = store
        .write(
            &Commit {
                tree,
                parents: vec![],
                author: sig(),
                committer: sig(),
                extra_headers: vec![],
                message: "root".to_string(),
            }
            .canonical_encode(),
            ObjectKind::Commit,
        )
        .unwrap();

    let commit = Commit {
        tree,
        parents: vec![parent],
        author: sig(),
        committer: sig(),
        extra_headers: vec![],
        message: "hello".to_string(),
    };
    let encoded = commit.canonical_encode();
    let expected_oid = Oid::hash(&encoded);

    let written_oid = store.write(&encoded, ObjectKind::Commit).unwrap();
    assert_eq!(written_oid, expected_oid);

    let read_back = store.open_read(&written_oid, ObjectKind::Commit).unwrap().read_to_end().unwrap();
    let decoded = Commit::decode(&read_back).unwrap();
    assert_eq!(decoded, commit);
    assert_eq!(decoded.canonical_encode(), encoded);
}

fn sig() -> Signature {
    Signature {
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        timestamp: Timestamp {
            unix_seconds: 1_700_000_000,
            tz_offset_minutes: 0,
        },
    }
}
