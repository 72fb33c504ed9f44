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

//! Blobs: opaque byte content. A blob's canonical encoding is simply its
//! raw bytes, so `hash_blob_content` is the same hash every other object's
//! canonical encoding goes through.

use crate::oid::Oid;

pub fn hash_blob_content(content: &[u8]) -> Oid {
    Oid::hash(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::EMPTY_BLOB_OID;

    #[test]
    fn empty_content_matches_sentinel() {
        assert_eq!(hash_blob_content(&[]), *EMPTY_BLOB_OID);
    }
}
