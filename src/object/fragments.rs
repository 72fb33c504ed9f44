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

//! Fragments: manifests describing a single logical blob split into chunks.
//!
//! The on-disk layout is not specified by the source material (§9 "open
//! questions"); this module fixes it as a 4-byte big-endian chunk count,
//! that many `(offset, size, hash)` descriptors, then the 32-byte raw
//! `origin` hash — deterministic and a function only of logical content,
//! documented in `DESIGN.md`.

use crate::error::Error;
use crate::error::Result;
use crate::oid::Oid;
use crate::oid::OID_RAW_LEN;

/// One ordered chunk of a split blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkEntry {
    pub offset: u64,
    pub size: u64,
    pub hash: Oid,
}

/// A manifest describing the chunks that reconstruct a single large blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragments {
    /// The hash of the fully reconstructed content.
    pub origin: Oid,
    pub chunks: Vec<ChunkEntry>,
}

impl Fragments {
    /// Checks the invariant that chunks are contiguous, ordered, and
    /// together span exactly the origin blob's declared size.
    pub fn validate_layout(&self) -> Result<()> {
        let mut expected_offset = 0u64;
        for chunk in &self.chunks {
            if chunk.offset != expected_offset {
                return Err(Error::Other(format!(
                    "fragments chunk offset {} does not follow previous chunk end {expected_offset}",
                    chunk.offset
                )));
            }
            expected_offset = expected_offset
                .checked_add(chunk.size)
                .ok_or_else(|| Error::Other("fragments chunk size overflow".to_string()))?;
        }
        Ok(())
    }

    pub fn canonical_encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.chunks.len() * (8 + 8 + OID_RAW_LEN) + OID_RAW_LEN);
        out.extend_from_slice(&(self.chunks.len() as u32).to_be_bytes());
        for chunk in &self.chunks {
            out.extend_from_slice(&chunk.offset.to_be_bytes());
            out.extend_from_slice(&chunk.size.to_be_bytes());
            out.extend_from_slice(chunk.hash.as_bytes());
        }
        out.extend_from_slice(self.origin.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(malformed("truncated chunk count"));
        }
        let count = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
        let mut cursor = &bytes[4..];
        const ENTRY_LEN: usize = 8 + 8 + OID_RAW_LEN;
        let mut chunks = Vec::with_capacity(count);
        for _ in 0..count {
            if cursor.len() < ENTRY_LEN {
                return Err(malformed("truncated chunk entry"));
            }
            let offset = u64::from_be_bytes(cursor[0..8].try_into().unwrap());
            let size = u64::from_be_bytes(cursor[8..16].try_into().unwrap());
            let hash = Oid::try_from_slice(&cursor[16..ENTRY_LEN]).unwrap();
            chunks.push(ChunkEntry { offset, size, hash });
            cursor = &cursor[ENTRY_LEN..];
        }
        if cursor.len() != OID_RAW_LEN {
            return Err(malformed("trailing bytes after origin hash"));
        }
        let origin = Oid::try_from_slice(cursor).unwrap();
        let fragments = Self { origin, chunks };
        fragments.validate_layout()?;
        Ok(fragments)
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    super::decode_error(super::ObjectKind::Fragments, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset: u64, size: u64) -> ChunkEntry {
        ChunkEntry {
            offset,
            size,
            hash: Oid::hash(format!("chunk-{offset}").as_bytes()),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let fragments = Fragments {
            origin: Oid::hash(b"whole-file"),
            chunks: vec![entry(0, 10), entry(10, 20), entry(30, 5)],
        };
        let encoded = fragments.canonical_encode();
        let decoded = Fragments::decode(&encoded).unwrap();
        assert_eq!(decoded, fragments);
    }

    #[test]
    fn rejects_non_contiguous_chunks() {
        let fragments = Fragments {
            origin: Oid::hash(b"whole-file"),
            chunks: vec![entry(0, 10), entry(20, 5)],
        };
        assert!(fragments.validate_layout().is_err());
    }

    #[test]
    fn empty_fragments_round_trip() {
        let fragments = Fragments {
            origin: Oid::hash(b""),
            chunks: vec![],
        };
        let encoded = fragments.canonical_encode();
        assert_eq!(Fragments::decode(&encoded).unwrap(), fragments);
    }
}
