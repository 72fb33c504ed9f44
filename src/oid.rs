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

//! Content hashes ("OIDs"): fixed-width 32-byte identifiers shared by every
//! object kind (commit, tree, fragments, tag, blob).

use std::fmt;

use blake2::Blake2s256;
use blake2::Digest as _;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;

/// Number of raw bytes in an [`Oid`].
pub const OID_RAW_LEN: usize = 32;
/// Number of hex characters in an [`Oid`]'s string form.
pub const OID_HEX_LEN: usize = OID_RAW_LEN * 2;

/// A 32-byte content hash, the address of every object in the store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid([u8; OID_RAW_LEN]);

impl Oid {
    /// The all-zero sentinel, meaning "no object".
    pub const ZERO: Self = Self([0; OID_RAW_LEN]);

    pub fn from_bytes(bytes: [u8; OID_RAW_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds an `Oid` from a byte slice, failing if its length is wrong.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; OID_RAW_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; OID_RAW_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; OID_RAW_LEN]
    }

    /// Hashes `data` and returns its `Oid`. This is the single hashing
    /// entry point every component must go through so that content
    /// addressing stays consistent (§3 "Content-addressing").
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Blake2s256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        Self(digest.into())
    }

    pub fn hex(&self) -> String {
        let mut s = String::with_capacity(OID_HEX_LEN);
        for byte in self.0 {
            s.push(hex_digit(byte >> 4));
            s.push(hex_digit(byte & 0xf));
        }
        s
    }

    /// Parses a 64-character lowercase hex string into an `Oid`. Rejects
    /// any other length or out-of-alphabet character.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let bytes = hex.as_bytes();
        if bytes.len() != OID_HEX_LEN {
            return None;
        }
        let mut out = [0u8; OID_RAW_LEN];
        for i in 0..OID_RAW_LEN {
            let hi = hex_value(bytes[2 * i])?;
            let lo = hex_value(bytes[2 * i + 1])?;
            out[i] = (hi << 4) | lo;
        }
        Some(Self(out))
    }
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'a' + (nibble - 10)) as char,
        _ => unreachable!(),
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Oid").field(&self.hex()).finish()
    }
}

impl Serialize for Oid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid oid hex string"))
    }
}

/// Validates a candidate hex string without allocating an `Oid`.
pub fn is_valid_hex(hex: &str) -> bool {
    hex.len() == OID_HEX_LEN && hex.bytes().all(|b| hex_value(b).is_some())
}

/// The canonical empty-blob OID: the hash of zero bytes of blob content.
pub static EMPTY_BLOB_OID: Lazy<Oid> = Lazy::new(|| crate::object::blob::hash_blob_content(&[]));

/// The canonical empty-tree OID: the hash of a tree with no entries.
pub static EMPTY_TREE_OID: Lazy<Oid> =
    Lazy::new(|| Oid::hash(&crate::object::tree::Tree::default().canonical_encode()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let oid = Oid::hash(b"hello world");
        let hex = oid.hex();
        assert_eq!(hex.len(), OID_HEX_LEN);
        assert_eq!(Oid::from_hex(&hex), Some(oid));
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(Oid::from_hex("not hex"), None);
        assert_eq!(Oid::from_hex(&"a".repeat(63)), None);
        assert_eq!(Oid::from_hex(&"g".repeat(64)), None);
    }

    #[test]
    fn zero_is_sentinel() {
        assert!(Oid::ZERO.is_zero());
        assert!(!Oid::hash(b"x").is_zero());
    }

    #[test]
    fn empty_blob_and_tree_are_distinct() {
        assert_ne!(*EMPTY_BLOB_OID, *EMPTY_TREE_OID);
    }
}
