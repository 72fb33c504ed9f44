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

//! Commit objects and their signatures.

use crate::error::Error;
use crate::error::Result;
use crate::oid::Oid;

/// A fixed-offset point in time, as recorded in a commit signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub unix_seconds: i64,
    /// Timezone offset in minutes east of UTC.
    pub tz_offset_minutes: i32,
}

impl Timestamp {
    /// Sentinel used when a legacy/foreign timestamp string can't be
    /// parsed (§4.2: "falls back to a fixed 'max time' sentinel").
    pub const MAX: Self = Self {
        unix_seconds: i64::MAX,
        tz_offset_minutes: 0,
    };

    fn encode(&self) -> String {
        let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
        let abs = self.tz_offset_minutes.unsigned_abs();
        format!(
            "{} {}{:02}{:02}",
            self.unix_seconds,
            sign,
            abs / 60,
            abs % 60
        )
    }

    fn decode(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        if let (Some(secs), Some(offset)) = (parts.next(), parts.next()) {
            if let (Ok(unix_seconds), Some(tz_offset_minutes)) =
                (secs.parse::<i64>(), parse_offset(offset))
            {
                return Self {
                    unix_seconds,
                    tz_offset_minutes,
                };
            }
        }
        // Not the native "<unix-seconds> <±HHMM>" form; tolerate legacy
        // date strings (RFC 2822, e.g. "Tue, 1 Jul 2003 10:52:37 +0200")
        // carried over from a foreign import before giving up (§4.2).
        Self::from_legacy_str(s).unwrap_or(Self::MAX)
    }

    fn from_legacy_str(s: &str) -> Option<Self> {
        let parsed = chrono::DateTime::parse_from_rfc2822(s.trim()).ok()?;
        Some(Self {
            unix_seconds: parsed.timestamp(),
            tz_offset_minutes: parsed.offset().local_minus_utc() / 60,
        })
    }
}

fn parse_offset(offset: &str) -> Option<i32> {
    let bytes = offset.as_bytes();
    if bytes.len() != 5 {
        return None;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hh: i32 = std::str::from_utf8(&bytes[1..3]).ok()?.parse().ok()?;
    let mm: i32 = std::str::from_utf8(&bytes[3..5]).ok()?.parse().ok()?;
    Some(sign * (hh * 60 + mm))
}

/// Author/committer identity plus a timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp: Timestamp,
}

impl Signature {
    fn encode(&self) -> String {
        format!("{} <{}> {}", self.name, self.email, self.timestamp.encode())
    }

    fn decode(s: &str) -> Result<Self> {
        let open = s
            .find('<')
            .ok_or_else(|| malformed("signature missing '<'"))?;
        let close = s[open..]
            .find('>')
            .map(|i| i + open)
            .ok_or_else(|| malformed("signature missing '>'"))?;
        let name = s[..open].trim_end().to_string();
        let email = s[open + 1..close].to_string();
        let rest = s[close + 1..].trim_start();
        Ok(Self {
            name,
            email,
            timestamp: Timestamp::decode(rest),
        })
    }
}

/// A commit: a tree snapshot plus ancestry and authorship.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub author: Signature,
    pub committer: Signature,
    pub extra_headers: Vec<(String, String)>,
    pub message: String,
}

impl Commit {
    pub fn canonical_encode(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree.hex()));
        for parent in &self.parents {
            out.push_str(&format!("parent {}\n", parent.hex()));
        }
        out.push_str(&format!("author {}\n", self.author.encode()));
        out.push_str(&format!("committer {}\n", self.committer.encode()));
        for (key, value) in &self.extra_headers {
            out.push_str(&format!("{key} {}\n", encode_continuation(value)));
        }
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| malformed("non-utf8 commit"))?;
        let (header, message) = text
            .split_once("\n\n")
            .ok_or_else(|| malformed("missing header/message separator"))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut extra_headers = Vec::new();

        let mut lines = header.lines().peekable();
        while let Some(line) = lines.next() {
            let (key, rest) = line
                .split_once(' ')
                .ok_or_else(|| malformed(format!("malformed header line {line:?}")))?;
            let mut value = rest.to_string();
            while let Some(next) = lines.peek() {
                if let Some(cont) = next.strip_prefix(' ') {
                    value.push('\n');
                    value.push_str(cont);
                    lines.next();
                } else {
                    break;
                }
            }
            match key {
                "tree" => {
                    tree = Some(
                        Oid::from_hex(&value).ok_or_else(|| malformed("bad tree hash"))?,
                    )
                }
                "parent" => parents.push(
                    Oid::from_hex(&value).ok_or_else(|| malformed("bad parent hash"))?,
                ),
                "author" => author = Some(Signature::decode(&value)?),
                "committer" => committer = Some(Signature::decode(&value)?),
                _ => extra_headers.push((key.to_string(), value)),
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| malformed("missing tree header"))?,
            parents,
            author: author.ok_or_else(|| malformed("missing author header"))?,
            committer: committer.ok_or_else(|| malformed("missing committer header"))?,
            extra_headers,
            message: message.to_string(),
        })
    }
}

/// Exposes [`Signature::decode`] to sibling object modules (tag encoding
/// uses the same `Name <email> <unix> <±HHMM>` grammar).
pub(crate) fn decode_signature_str(s: &str) -> Result<Signature> {
    Signature::decode(s)
}

fn encode_continuation(value: &str) -> String {
    value.replace('\n', "\n ")
}

fn malformed(reason: impl Into<String>) -> Error {
    super::decode_error(super::ObjectKind::Commit, reason)
}
