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

//! Tag objects: a named, signed pointer at any other object.

use crate::error::Error;
use crate::error::Result;
use crate::object::ObjectKind;
use crate::object::commit::Signature;
use crate::oid::Oid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub object: Oid,
    pub object_type: ObjectKind,
    pub name: String,
    pub tagger: Signature,
    /// Message body; may end with a detached `-----BEGIN ...` signature
    /// block, which this type treats as opaque message bytes.
    pub message: String,
}

impl Tag {
    pub fn canonical_encode(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("object {}\n", self.object.hex()));
        out.push_str(&format!("type {}\n", self.object_type));
        out.push_str(&format!("tag {}\n", self.name));
        out.push_str(&format!("tagger {}\n", encode_signature(&self.tagger)));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| malformed("non-utf8 tag"))?;
        let (header, message) = text
            .split_once("\n\n")
            .ok_or_else(|| malformed("missing header/message separator"))?;

        let mut object = None;
        let mut object_type = None;
        let mut name = None;
        let mut tagger = None;
        for line in header.lines() {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| malformed(format!("malformed header line {line:?}")))?;
            match key {
                "object" => {
                    object =
                        Some(Oid::from_hex(value).ok_or_else(|| malformed("bad object hash"))?)
                }
                "type" => {
                    object_type = Some(
                        ObjectKind::from_str(value)
                            .ok_or_else(|| malformed(format!("unknown type {value:?}")))?,
                    )
                }
                "tag" => name = Some(value.to_string()),
                "tagger" => tagger = Some(decode_signature(value)?),
                _ => return Err(malformed(format!("unexpected tag header {key:?}"))),
            }
        }

        Ok(Self {
            object: object.ok_or_else(|| malformed("missing object header"))?,
            object_type: object_type.ok_or_else(|| malformed("missing type header"))?,
            name: name.ok_or_else(|| malformed("missing tag header"))?,
            tagger: tagger.ok_or_else(|| malformed("missing tagger header"))?,
            message: message.to_string(),
        })
    }
}

fn encode_signature(sig: &Signature) -> String {
    format!(
        "{} <{}> {} {}{:02}{:02}",
        sig.name,
        sig.email,
        sig.timestamp.unix_seconds,
        if sig.timestamp.tz_offset_minutes < 0 {
            '-'
        } else {
            '+'
        },
        sig.timestamp.tz_offset_minutes.unsigned_abs() / 60,
        sig.timestamp.tz_offset_minutes.unsigned_abs() % 60,
    )
}

fn decode_signature(s: &str) -> Result<Signature> {
    // Re-use commit-header decoding by constructing an equivalent line; the
    // format is identical to a commit signature.
    crate::object::commit::decode_signature_str(s)
}

fn malformed(reason: impl Into<String>) -> Error {
    super::decode_error(super::ObjectKind::Tag, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::commit::Timestamp;

    fn sig() -> Signature {
        Signature {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            timestamp: Timestamp {
                unix_seconds: 1_700_000_000,
                tz_offset_minutes: 60,
            },
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let tag = Tag {
            object: Oid::hash(b"obj"),
            object_type: ObjectKind::Commit,
            name: "v1.0.0".to_string(),
            tagger: sig(),
            message: "release\n".to_string(),
        };
        let encoded = tag.canonical_encode();
        let decoded = Tag::decode(&encoded).unwrap();
        assert_eq!(decoded, tag);
    }
}
