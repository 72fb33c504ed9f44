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

//! Encoders for the three wire-stream shapes.

use crate::oid::Oid;

use super::StreamKind;
use super::finish_with_crc;
use super::write_frame;
use super::write_header;

/// One object's payload bytes paired with its OID, ready to be framed.
pub type Frame = (Oid, Vec<u8>);

/// Encodes a push stream. Metadata frames are emitted before blob frames,
/// preserving the caller's order within each class (§4.4).
pub fn encode_push(
    metadata_objects: &[Frame],
    blob_objects: &[Frame],
    mut on_progress: impl FnMut(u64),
) -> Vec<u8> {
    let mut buf = write_header(StreamKind::Push);
    for (oid, payload) in metadata_objects {
        write_frame(&mut buf, *oid, payload, true);
        on_progress(1);
    }
    for (oid, payload) in blob_objects {
        write_frame(&mut buf, *oid, payload, false);
        on_progress(1);
    }
    finish_with_crc(buf)
}

/// Encodes a metadata-only fetch stream.
pub fn encode_metadata(objects: &[Frame], mut on_progress: impl FnMut(u64)) -> Vec<u8> {
    let mut buf = write_header(StreamKind::Metadata);
    for (oid, payload) in objects {
        write_frame(&mut buf, *oid, payload, false);
        on_progress(1);
    }
    finish_with_crc(buf)
}

/// Encodes a batch-blob fetch stream.
pub fn encode_batch_blob(objects: &[Frame], mut on_progress: impl FnMut(u64)) -> Vec<u8> {
    let mut buf = write_header(StreamKind::BatchBlob);
    for (oid, payload) in objects {
        write_frame(&mut buf, *oid, payload, false);
        on_progress(1);
    }
    finish_with_crc(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_stream_orders_metadata_before_blobs() {
        let meta = vec![(Oid::hash(b"tree"), b"tree-bytes".to_vec())];
        let blobs = vec![(Oid::hash(b"blob"), b"blob-bytes".to_vec())];
        let mut ticks = 0;
        let stream = encode_push(&meta, &blobs, |_| ticks += 1);
        assert_eq!(ticks, 2);
        assert_eq!(&stream[..4], b"ZP\x00\x01");
    }

    #[test]
    fn metadata_stream_has_its_own_magic() {
        let objs = vec![(Oid::hash(b"commit"), b"commit-bytes".to_vec())];
        let stream = encode_metadata(&objs, |_| {});
        assert_eq!(&stream[..4], b"ZM\x00\x01");
    }

    #[test]
    fn batch_blob_stream_has_its_own_magic() {
        let objs = vec![(Oid::hash(b"blob"), b"blob-bytes".to_vec())];
        let stream = encode_batch_blob(&objs, |_| {});
        assert_eq!(&stream[..4], b"ZB\x00\x02");
    }
}
