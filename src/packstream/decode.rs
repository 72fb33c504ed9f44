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

//! Decoders for the three wire-stream shapes. Objects are staged in
//! memory and validated frame-by-frame and by a whole-stream CRC before
//! any of them are written into the store — a corrupt stream leaves no
//! trace (§4.4 "two-phase: stage ... then preserve").

use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::oid::Oid;
use crate::store::Store;

use super::CRC_LEN;
use super::HASH_FIELD_LEN;
use super::HEADER_LEN;
use super::LENGTH_FIELD_LEN;
use super::StreamKind;
use super::VERSION;
use super::verify_crc;

/// One object staged from a decoded stream, not yet persisted.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub oid: Oid,
    pub is_metadata: bool,
    pub payload: Vec<u8>,
}

/// The outcome of successfully unpacking a stream into the store.
#[derive(Debug)]
pub struct UnpackedStream {
    pub kind: StreamKind,
    pub persisted: Vec<Oid>,
}

/// Stages and validates every frame in `bytes`, then — only if every
/// frame hash matches and the trailing CRC verifies — writes each staged
/// object into `store`.
pub fn unpack_into_store(store: &Store, bytes: &[u8]) -> Result<UnpackedStream> {
    let (kind, frames) = stage_frames(bytes)?;

    let mut persisted = Vec::with_capacity(frames.len());
    for frame in &frames {
        let oid = store.write_with_metadata_flag(&frame.payload, frame.is_metadata)?;
        persisted.push(oid);
    }
    debug!(kind = ?kind, count = persisted.len(), "unpacked stream");
    Ok(UnpackedStream { kind, persisted })
}

/// Parses and validates a stream without touching the store: useful for
/// callers (the transfer engine, tests) that want the staged frames
/// without committing them.
pub fn stage_frames(bytes: &[u8]) -> Result<(StreamKind, Vec<DecodedFrame>)> {
    if bytes.len() < HEADER_LEN + LENGTH_FIELD_LEN + CRC_LEN {
        return Err(Error::StreamFormat("stream shorter than minimum framing".to_string()));
    }

    let kind = StreamKind::from_magic(&bytes[..4]).ok_or_else(|| {
        Error::StreamFormat(format!("unexpected magic bytes {:02x?}", &bytes[..4]))
    })?;
    let version = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(Error::StreamFormat(format!("unsupported stream version {version}")));
    }

    let mut cursor = HEADER_LEN;
    let mut frames = Vec::new();
    loop {
        if cursor + LENGTH_FIELD_LEN > bytes.len() {
            return Err(Error::StreamFormat("truncated frame length".to_string()));
        }
        let length = i64::from_be_bytes(
            bytes[cursor..cursor + LENGTH_FIELD_LEN].try_into().unwrap(),
        );
        cursor += LENGTH_FIELD_LEN;
        if length == 0 {
            break;
        }

        let is_metadata = match kind {
            StreamKind::Push => length < 0,
            StreamKind::Metadata => true,
            StreamKind::BatchBlob => false,
        };

        let frame_len = length.unsigned_abs() as usize;
        if frame_len < HASH_FIELD_LEN {
            return Err(Error::StreamFormat("frame shorter than hash field".to_string()));
        }
        if cursor + frame_len > bytes.len() {
            return Err(Error::StreamFormat("truncated frame payload".to_string()));
        }

        let hash_str = std::str::from_utf8(&bytes[cursor..cursor + HASH_FIELD_LEN])
            .map_err(|_| Error::StreamFormat("non-ascii hash field".to_string()))?;
        let oid = Oid::from_hex(hash_str)
            .ok_or_else(|| Error::StreamFormat(format!("bad hash hex {hash_str:?}")))?;

        let payload_start = cursor + HASH_FIELD_LEN;
        let payload_len = frame_len - HASH_FIELD_LEN;
        let payload = bytes[payload_start..payload_start + payload_len].to_vec();
        cursor = payload_start + payload_len;

        let got = Oid::hash(&payload);
        if got != oid {
            return Err(Error::HashMismatch { expected: oid, got });
        }
        frames.push(DecodedFrame {
            oid,
            is_metadata,
            payload,
        });
    }

    if cursor + CRC_LEN != bytes.len() {
        return Err(Error::StreamFormat("unexpected bytes after terminator".to_string()));
    }
    if !verify_crc(bytes) {
        return Err(Error::StreamFormat("crc mismatch".to_string()));
    }

    Ok((kind, frames))
}
