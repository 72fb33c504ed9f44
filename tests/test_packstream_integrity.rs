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

//! §8 scenario 4: a push stream with one flipped byte inside a blob
//! payload must be rejected as a whole, and none of its objects may end
//! up visible in the store.

use hugescm_core::error::Error;
use hugescm_core::object::ObjectKind;
use hugescm_core::oid::Oid;
use hugescm_core::packstream::decode;
use hugescm_core::packstream::encode;
use hugescm_core::store::Store;

#[test]
fn corrupted_push_stream_leaves_no_object_visible() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::init(dir.path()).unwrap();

    let meta: Vec<(Oid, Vec<u8>)> = ["metadata one", "metadata two", "metadata three"]
        .into_iter()
        .map(|s| (Oid::hash(s.as_bytes()), s.as_bytes().to_vec()))
        .collect();
    let blobs: Vec<(Oid, Vec<u8>)> = ["blob one", "blob two payload"]
        .into_iter()
        .map(|s| (Oid::hash(s.as_bytes()), s.as_bytes().to_vec()))
        .collect();
    let mut stream = encode::encode_push(&meta, &blobs, |_| {});

    let needle = b"blob two payload";
    let pos = stream.windows(needle.len()).position(|w| w == needle).unwrap();
    stream[pos + 5] ^= 0xff;

    let err = decode::unpack_into_store(&store, &stream).unwrap_err();
    assert!(matches!(err, Error::HashMismatch { .. }));

    for (oid, _) in meta.iter().chain(blobs.iter()) {
        assert!(!store.exists(oid, Some(ObjectKind::Commit)) && !store.exists(oid, Some(ObjectKind::Blob)));
    }
}

#[test]
fn clean_push_stream_round_trips_every_object_into_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::init(dir.path()).unwrap();

    let meta = vec![(Oid::hash(b"tree-bytes"), b"tree-bytes".to_vec())];
    let blobs = vec![(Oid::hash(b"blob-bytes"), b"blob-bytes".to_vec())];
    let stream = encode::encode_push(&meta, &blobs, |_| {});

    let unpacked = decode::unpack_into_store(&store, &stream).unwrap();
    assert_eq!(unpacked.persisted.len(), 2);
    assert!(store.exists(&meta[0].0, Some(ObjectKind::Commit)));
    assert!(store.exists(&blobs[0].0, Some(ObjectKind::Blob)));
}
