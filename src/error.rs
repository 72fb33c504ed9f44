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

//! Crate-wide error taxonomy. One flat enum covers every public surface;
//! component-local conditions that a component knows how to recover from
//! (e.g. retryable transfer EOF) never escape as one of these variants.

use thiserror::Error;

use crate::merge::conflict::MergeResult;
use crate::oid::Oid;

/// The error type returned by every fallible public operation in this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("object {0} not found")]
    NoSuchObject(Oid),

    #[error("object {0} is corrupt: {reason}", reason = .1)]
    CorruptObject(Oid, String),

    #[error("hash mismatch: expected {expected}, got {got}")]
    HashMismatch { expected: Oid, got: Oid },

    #[error("reference {0} is locked")]
    ResourceLocked(String),

    #[error("invalid reference name: {0}")]
    BadReferenceName(String),

    #[error("invalid revision: {0}")]
    BadRevision(String),

    #[error("bad stream format: {0}")]
    StreamFormat(String),

    #[error("operation timed out")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("non-text content on {0} side")]
    NonTextContent(&'static str),

    #[error("merge produced {} conflict(s)", .0.conflicts.len())]
    Conflicts(Box<MergeResult>),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn corrupt(oid: Oid, reason: impl Into<String>) -> Self {
        Self::CorruptObject(oid, reason.into())
    }
}
