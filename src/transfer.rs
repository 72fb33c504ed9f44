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

//! The transfer engine (C6): a resume-capable single-object download
//! with retry, truncation recovery, and progress callbacks.

use std::io::ErrorKind;
use std::io::Write as _;

use tokio::io::AsyncReadExt as _;
use tracing::debug;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;
use crate::object::ObjectKind;
use crate::oid::Oid;
use crate::session::Transport;
use crate::store::Store;

/// How a caller wants progress reported; the callback shape is the same
/// in every mode, this only records which UI style the caller intends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressMode {
    None,
    Single,
    Multi,
}

/// `(read_bytes, total_bytes, round)` — `round` counts retry attempts,
/// starting at 0.
pub type ProgressCallback<'a> = dyn FnMut(u64, u64, u32) + 'a;

const READ_CHUNK: usize = 64 * 1024;

/// Fetches a single object from `transport` into `store`, resuming after
/// `UnexpectedEof` up to `max_retries` times and falling back to a
/// truncate-and-restart on write-permission errors (§4.5).
pub async fn transfer(
    store: &Store,
    oid: Oid,
    is_metadata: bool,
    transport: &dyn Transport,
    max_retries: u32,
    mut on_progress: Box<ProgressCallback<'_>>,
) -> Result<()> {
    let mut round = 0u32;
    let mut retries = 0u32;

    loop {
        let (mut file, current_size) = match store.open_partial_for_append(&oid) {
            Ok(pair) => pair,
            Err(Error::Io(err)) if is_permission_error(&err) => {
                warn!(oid = %oid, "falling back to truncate-and-restart after permission error");
                (store.truncate_partial(&oid)?, 0)
            }
            Err(err) => return Err(err),
        };

        let range = transport.get_object(oid, current_size).await?;
        let resume_offset = if range.resume_offset == current_size {
            current_size
        } else {
            // The peer didn't honour our resume offset; restart clean.
            file = store.truncate_partial(&oid)?;
            0
        };
        let total_size = range.total_size;
        let mut reader = range.reader;
        let mut written = resume_offset;

        let mut buf = vec![0u8; READ_CHUNK];
        let outcome: std::io::Result<()> = loop {
            match reader.read(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    if let Err(err) = file.write_all(&buf[..n]) {
                        break Err(err);
                    }
                    written += n as u64;
                    on_progress(written, total_size, round);
                }
                Err(err) => break Err(err),
            }
        };

        match outcome {
            Ok(()) => {
                if written < total_size {
                    // Transport closed cleanly but short: treat like any
                    // other unexpected truncation and retry.
                    if retries >= max_retries {
                        return Err(Error::StreamFormat(format!(
                            "transfer of {oid} ended early at {written}/{total_size} bytes"
                        )));
                    }
                    retries += 1;
                    round += 1;
                    continue;
                }
                debug!(oid = %oid, bytes = written, "transfer complete");
                return store.finalize_partial(&oid, is_metadata);
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                if retries >= max_retries {
                    return Err(Error::Io(err));
                }
                retries += 1;
                round += 1;
                warn!(oid = %oid, retries, "retrying after unexpected eof");
                continue;
            }
            Err(err) if is_permission_error(&err) => {
                warn!(oid = %oid, "write-permission error, truncating and restarting");
                store.truncate_partial(&oid)?;
                continue;
            }
            Err(err) => return Err(Error::Io(err)),
        }
    }
}

fn is_permission_error(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::PermissionDenied
}

/// Validates that an already-fully-written object matches the kind a
/// caller expects; used by the session layer after [`transfer`] to pick
/// the right `ObjectKind` for subsequent reads.
pub fn expected_kind(is_metadata: bool) -> ObjectKind {
    if is_metadata {
        ObjectKind::Commit
    } else {
        ObjectKind::Blob
    }
}
