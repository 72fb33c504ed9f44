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

//! The pack-stream codec (C5): framed, CRC-64-protected wire streams for
//! push, metadata-only fetch, and batch-blob fetch.

pub mod decode;
pub mod encode;

use crc::Crc;
use crc::CRC_64_XZ;

use crate::oid::OID_HEX_LEN;

/// Which of the three framed wire shapes a stream is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Push,
    Metadata,
    BatchBlob,
}

impl StreamKind {
    fn magic(self) -> [u8; 4] {
        match self {
            Self::Push => *b"ZP\x00\x01",
            Self::Metadata => *b"ZM\x00\x01",
            Self::BatchBlob => *b"ZB\x00\x02",
        }
    }

    fn from_magic(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"ZP\x00\x01" => Some(Self::Push),
            b"ZM\x00\x01" => Some(Self::Metadata),
            b"ZB\x00\x02" => Some(Self::BatchBlob),
            _ => None,
        }
    }
}

const VERSION: u32 = 1;
const RESERVED_LEN: usize = 16;
const HEADER_LEN: usize = 4 + 4 + RESERVED_LEN;
const LENGTH_FIELD_LEN: usize = 8;
const HASH_FIELD_LEN: usize = OID_HEX_LEN;
const CRC_LEN: usize = 8;

static CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

fn write_header(kind: StreamKind) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN);
    buf.extend_from_slice(&kind.magic());
    buf.extend_from_slice(&VERSION.to_be_bytes());
    buf.extend_from_slice(&[0u8; RESERVED_LEN]);
    buf
}

fn write_frame(buf: &mut Vec<u8>, oid: crate::oid::Oid, payload: &[u8], negate: bool) {
    let frame_len = (HASH_FIELD_LEN + payload.len()) as i64;
    let encoded_len = if negate { -frame_len } else { frame_len };
    buf.extend_from_slice(&encoded_len.to_be_bytes());
    buf.extend_from_slice(oid.hex().as_bytes());
    buf.extend_from_slice(payload);
}

fn finish_with_crc(mut buf: Vec<u8>) -> Vec<u8> {
    buf.extend_from_slice(&0i64.to_be_bytes());
    let crc = CRC64.checksum(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    buf
}

fn verify_crc(bytes: &[u8]) -> bool {
    if bytes.len() < CRC_LEN {
        return false;
    }
    let (body, trailer) = bytes.split_at(bytes.len() - CRC_LEN);
    let declared = u64::from_be_bytes(trailer.try_into().unwrap());
    CRC64.checksum(body) == declared
}
