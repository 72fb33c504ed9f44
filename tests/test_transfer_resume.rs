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

//! §8 scenario 8: a fetch session whose single large object is delivered
//! by a flaky transport that drops the connection partway through,
//! exercising `session::fetch` together with the graph walker, the
//! pack-stream codec and the resumable transfer engine end to end.

use std::pin::Pin;
use std::sync::Mutex;
use std::task::Context;
use std::task::Poll;

use async_trait::async_trait;
use hugescm_core::config::RepoConfig;
use hugescm_core::error::Result;
use hugescm_core::object::Commit;
use hugescm_core::object::FileMode;
use hugescm_core::object::ObjectKind;
use hugescm_core::object::Signature;
use hugescm_core::object::Timestamp;
use hugescm_core::object::Tree;
use hugescm_core::object::TreeEntry;
use hugescm_core::oid::Oid;
use hugescm_core::packstream::encode;
use hugescm_core::refs::RefStore;
use hugescm_core::session;
use hugescm_core::session::ObjectRange;
use hugescm_core::session::Transport;
use hugescm_core::store::Store;
use tokio::io::AsyncRead;
use tokio::io::ReadBuf;

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

/// Delivers its first four bytes, then fails with `UnexpectedEof`; a
/// second call for the same object must resume past them.
struct FlakyOnceReader {
    remaining: Vec<u8>,
    delivered_first_slice: bool,
}

impl AsyncRead for FlakyOnceReader {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        if !self.delivered_first_slice {
            let n = 4.min(self.remaining.len());
            let chunk: Vec<u8> = self.remaining.drain(..n).collect();
            buf.put_slice(&chunk);
            self.delivered_first_slice = true;
            return Poll::Ready(Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)));
        }
        let n = self.remaining.len().min(buf.remaining());
        let chunk: Vec<u8> = self.remaining.drain(..n).collect();
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

/// Serves metadata and objects out of a second, real `Store` standing in
/// for a remote peer; the single large blob is streamed through
/// `FlakyOnceReader` so the fetch must retry to complete.
struct RemoteTransport {
    remote_store: Store,
    tip: Oid,
    large_oid: Oid,
    large_content: Vec<u8>,
    get_object_calls: Mutex<u32>,
}

#[async_trait]
impl Transport for RemoteTransport {
    async fn fetch_reference(&self, _name: &str) -> Result<Oid> {
        Ok(self.tip)
    }

    async fn fetch_metadata(&self, want: Oid, have: Option<Oid>) -> Result<Vec<u8>> {
        let threshold = RepoConfig::default().store.large_object_threshold_bytes;
        let walked = hugescm_core::graph::walk(&self.remote_store, want, None, have, threshold)?;
        let frames: Vec<(Oid, Vec<u8>)> = walked
            .metadata
            .iter()
            .map(|oid| {
                let bytes = self
                    .remote_store
                    .open_read(oid, ObjectKind::Commit)
                    .or_else(|_| self.remote_store.open_read(oid, ObjectKind::Tree))?
                    .read_to_end()?;
                Ok((*oid, bytes))
            })
            .collect::<Result<_>>()?;
        Ok(encode::encode_metadata(&frames, |_| {}))
    }

    async fn batch_objects(&self, oids: &[Oid]) -> Result<Vec<u8>> {
        let frames: Vec<(Oid, Vec<u8>)> = oids
            .iter()
            .map(|oid| {
                let bytes = self.remote_store.open_read(oid, ObjectKind::Blob)?.read_to_end()?;
                Ok((*oid, bytes))
            })
            .collect::<Result<_>>()?;
        Ok(encode::encode_batch_blob(&frames, |_| {}))
    }

    async fn get_object(&self, oid: Oid, resume_offset: u64) -> Result<ObjectRange> {
        assert_eq!(oid, self.large_oid, "only the large object should use the transfer engine");
        let mut calls = self.get_object_calls.lock().unwrap();
        *calls += 1;
        let remaining = self.large_content[resume_offset as usize..].to_vec();
        Ok(ObjectRange {
            resume_offset,
            total_size: self.large_content.len() as u64,
            reader: Box::pin(FlakyOnceReader {
                remaining,
                delivered_first_slice: false,
            }),
        })
    }

    async fn push(&self, _stream: Vec<u8>) -> Result<Vec<u8>> {
        unimplemented!()
    }

    async fn batch_check(&self, _oids: &[Oid]) -> Result<Vec<Oid>> {
        unimplemented!()
    }

    async fn put_object(&self, _oid: Oid, _payload: Vec<u8>) -> Result<()> {
        unimplemented!()
    }
}

#[test]
fn fetch_session_resumes_its_large_object_after_a_dropped_connection() {
    let remote_dir = tempfile::tempdir().unwrap();
    let remote_store = Store::init(remote_dir.path()).unwrap();

    let large_content: Vec<u8> = (0..2000u32).flat_map(|b| (b as u8).to_be_bytes()).collect();
    let large_oid = remote_store.write(&large_content, ObjectKind::Blob).unwrap();
    let small_oid = remote_store.write(b"small companion blob", ObjectKind::Blob).unwrap();

    let tree = remote_store
        .write(
            &Tree::new(vec![
                TreeEntry::new("big.bin", FileMode::Regular, large_oid, large_content.len() as u64).unwrap(),
                TreeEntry::new("small.txt", FileMode::Regular, small_oid, 21).unwrap(),
            ])
            .canonical_encode(),
            ObjectKind::Tree,
        )
        .unwrap();
    let commit = Commit {
        tree,
        parents: vec![],
        author: sig(),
        committer: sig(),
        extra_headers: vec![],
        message: "add big file".to_string(),
    };
    let tip = remote_store.write(&commit.canonical_encode(), ObjectKind::Commit).unwrap();

    let transport = RemoteTransport {
        remote_store,
        tip,
        large_oid,
        large_content: large_content.clone(),
        get_object_calls: Mutex::new(0),
    };

    let local_dir = tempfile::tempdir().unwrap();
    let local_store = Store::init(local_dir.path()).unwrap();
    let refs_dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(refs_dir.path()).unwrap();
    let refs = RefStore::open(refs_dir.path());

    // Force a large-object classification for `big.bin` regardless of
    // the default 20 MiB threshold used elsewhere in this crate.
    let mut config = RepoConfig::default();
    config.store.large_object_threshold_bytes = 1000;

    let outcome = session::fetch_blocking(&local_store, &refs, &transport, "refs/heads/main", &config).unwrap();
    assert_eq!(outcome.new_tip, tip);
    assert_eq!(refs.read("refs/heads/main").unwrap(), tip);

    let read_back = local_store.open_read(&large_oid, ObjectKind::Blob).unwrap().read_to_end().unwrap();
    assert_eq!(read_back, large_content, "no duplication or corruption across the retry");
    assert!(local_store.exists(&small_oid, Some(ObjectKind::Blob)));
    assert_eq!(
        *transport.get_object_calls.lock().unwrap(),
        2,
        "must have retried exactly once after the dropped connection"
    );
}
