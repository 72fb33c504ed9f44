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

//! Session orchestration (C10): wires the graph walker, pack-stream
//! codec, transfer engine and reference store to an abstract transport.

use std::pin::Pin;

use async_trait::async_trait;
use futures::StreamExt as _;
use pollster::FutureExt as _;
use tokio::io::AsyncRead;
use tracing::info;
use tracing::instrument;

/// How many batch-object requests a fetch keeps in flight at once.
const FETCH_CONCURRENCY: usize = 8;

use crate::config::RepoConfig;
use crate::error::Result;
use crate::graph;
use crate::object::ObjectKind;
use crate::oid::Oid;
use crate::packstream::decode;
use crate::packstream::encode;
use crate::refs::RefStore;
use crate::store::Store;
use crate::transfer;

/// A byte-range response to [`Transport::get_object`]: the offset the
/// peer actually resumed from (which may differ from what was asked),
/// the object's total size if known, and a reader positioned at
/// `resume_offset` that may fail partway with `UnexpectedEof`.
pub struct ObjectRange {
    pub resume_offset: u64,
    pub total_size: u64,
    pub reader: Pin<Box<dyn AsyncRead + Send>>,
}

/// The abstract remote peer. Concrete transports (SSH, HTTP, in-process
/// test doubles) implement this; this crate depends only on the contract.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves a refname on the peer to its current OID.
    async fn fetch_reference(&self, name: &str) -> Result<Oid>;
    /// Requests a metadata stream (§4.4) for `want`, incrementally from
    /// whatever `have` the peer already knows the caller to have.
    async fn fetch_metadata(&self, want: Oid, have: Option<Oid>) -> Result<Vec<u8>>;
    /// Requests a batch-blob stream (§4.4) for the given OIDs.
    async fn batch_objects(&self, oids: &[Oid]) -> Result<Vec<u8>>;
    /// Opens a ranged byte read of a single object, starting at (or near)
    /// `resume_offset`.
    async fn get_object(&self, oid: Oid, resume_offset: u64) -> Result<ObjectRange>;
    /// Uploads a complete push stream (§4.4), returning the peer's
    /// line-framed report (§6 "Reports").
    async fn push(&self, stream: Vec<u8>) -> Result<Vec<u8>>;
    /// Asks which of the given OIDs the peer already has.
    async fn batch_check(&self, oids: &[Oid]) -> Result<Vec<Oid>>;
    /// Uploads a single large object directly (outside of stream framing).
    async fn put_object(&self, oid: Oid, payload: Vec<u8>) -> Result<()>;
}

/// How a push was received by the peer, parsed from its report stream
/// (§6 "Reports").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    UnpackOk,
    UnpackFailed(String),
    RefOk { refname: String, new_oid: Oid },
    RefFailed { refname: String, reason: String },
    Status(String),
    Rate(String),
    Other(String),
}

/// Parses a peer's report stream (`unpack ok` / `ok <ref> <oid>` / etc.).
/// Unrecognised lines are preserved verbatim as diagnostic output.
pub fn parse_report(report: &str) -> Vec<ReportLine> {
    report
        .lines()
        .map(|line| {
            if line == "unpack ok" {
                ReportLine::UnpackOk
            } else if let Some(reason) = line.strip_prefix("unpack ") {
                ReportLine::UnpackFailed(reason.to_string())
            } else if let Some(rest) = line.strip_prefix("ok ") {
                match rest.split_once(' ') {
                    Some((refname, oid_hex)) => match Oid::from_hex(oid_hex) {
                        Some(new_oid) => ReportLine::RefOk {
                            refname: refname.to_string(),
                            new_oid,
                        },
                        None => ReportLine::Other(line.to_string()),
                    },
                    None => ReportLine::Other(line.to_string()),
                }
            } else if let Some(rest) = line.strip_prefix("ng ") {
                match rest.split_once(' ') {
                    Some((refname, reason)) => ReportLine::RefFailed {
                        refname: refname.to_string(),
                        reason: reason.to_string(),
                    },
                    None => ReportLine::Other(line.to_string()),
                }
            } else if let Some(rest) = line.strip_prefix("status ") {
                ReportLine::Status(rest.to_string())
            } else if let Some(rest) = line.strip_prefix("rate ") {
                ReportLine::Rate(rest.to_string())
            } else {
                ReportLine::Other(line.to_string())
            }
        })
        .collect()
}

/// Outcome of a fetch session: the ref now points at `new_tip` and every
/// object needed to resolve it locally has been persisted.
#[derive(Debug)]
pub struct FetchOutcome {
    pub refname: String,
    pub new_tip: Oid,
}

/// Runs a fetch session (§4.9 "Fetch session"): resolve the refname,
/// receive and unpack a metadata stream, compute and batch-request any
/// blobs the new metadata references that aren't already local, unpack
/// those, then advance the local ref.
#[instrument(skip(store, refs, transport, config))]
pub async fn fetch(
    store: &Store,
    refs: &RefStore,
    transport: &dyn Transport,
    refname: &str,
    config: &RepoConfig,
) -> Result<FetchOutcome> {
    let remote_tip = transport.fetch_reference(refname).await?;
    let local_tip = refs.read(refname).ok();

    let metadata_bytes = transport.fetch_metadata(remote_tip, local_tip).await?;
    decode::unpack_into_store(store, &metadata_bytes)?;

    let walked = graph::walk(
        store,
        remote_tip,
        None,
        local_tip,
        config.store.large_object_threshold_bytes,
    )?;
    let missing_ordinary: Vec<Oid> = walked
        .objects
        .into_iter()
        .filter(|oid| !store.exists(oid, Some(ObjectKind::Blob)))
        .collect();
    // Each chunk is an independent round-trip to the peer; running several
    // concurrently hides their latency instead of paying it serially.
    // `unpack_into_store` is safe to run out of order since the backend
    // store's writes are content-addressed and idempotent (§4.1).
    let chunks: Vec<&[Oid]> = missing_ordinary.chunks(config.session.batch_check_cap).collect();
    let blob_streams: Vec<Result<Vec<u8>>> = futures::stream::iter(chunks)
        .map(|chunk| transport.batch_objects(chunk))
        .buffer_unordered(FETCH_CONCURRENCY)
        .collect()
        .await;
    for blob_stream in blob_streams {
        decode::unpack_into_store(store, &blob_stream?)?;
    }

    for (oid, _size) in &walked.large_objects {
        if store.exists(oid, Some(ObjectKind::Blob)) {
            continue;
        }
        transfer::transfer(
            store,
            *oid,
            false,
            transport,
            config.transfer.max_retries,
            Box::new(|_, _, _| {}),
        )
        .await?;
    }

    refs.update(refname, local_tip, remote_tip)?;
    info!(refname, tip = %remote_tip, "fetch complete");
    Ok(FetchOutcome {
        refname: refname.to_string(),
        new_tip: remote_tip,
    })
}

/// Outcome of a push session.
#[derive(Debug)]
pub struct PushOutcome {
    pub refname: String,
    pub reported: Vec<ReportLine>,
    pub accepted: bool,
}

/// Runs a push session (§4.9 "Push session"): compute the objects the
/// peer lacks, probe for and upload large objects via the transfer
/// engine's counterpart (direct `put_object`), stream the rest, then
/// parse the peer's report and advance the local remote-tracking ref.
#[instrument(skip(store, refs, transport, config))]
pub async fn push(
    store: &Store,
    refs: &RefStore,
    transport: &dyn Transport,
    refname: &str,
    new_tip: Oid,
    local_shallow: Option<Oid>,
    remote_tracking_ref: &str,
    config: &RepoConfig,
) -> Result<PushOutcome> {
    let remote_tip = transport.fetch_reference(refname).await.ok();
    let push_objects = graph::walk(
        store,
        new_tip,
        local_shallow,
        remote_tip,
        config.store.large_object_threshold_bytes,
    )?;

    let large_oids: Vec<Oid> = push_objects.large_objects.iter().map(|(oid, _)| *oid).collect();
    let remote_has = transport.batch_check(&large_oids).await?;
    for (oid, _size) in &push_objects.large_objects {
        if remote_has.contains(oid) {
            continue;
        }
        let bytes = store
            .open_read(oid, ObjectKind::Blob)?
            .read_to_end()?;
        transport.put_object(*oid, bytes).await?;
    }

    let metadata_frames = load_frames(store, &push_objects.metadata, true)?;
    let blob_frames = load_frames(store, &push_objects.objects, false)?;
    let stream = encode::encode_push(&metadata_frames, &blob_frames, |_| {});

    let report_bytes = transport.push(stream).await?;
    let report_text = String::from_utf8_lossy(&report_bytes);
    let reported = parse_report(&report_text);

    let accepted = reported.iter().any(|line| {
        matches!(
            line,
            ReportLine::RefOk { refname: r, .. } if r == refname
        )
    });
    if accepted {
        let previous = refs.read(remote_tracking_ref).ok();
        refs.update(remote_tracking_ref, previous, new_tip)?;
    }

    info!(refname, accepted, "push complete");
    Ok(PushOutcome {
        refname: refname.to_string(),
        reported,
        accepted,
    })
}

/// Synchronous wrapper around [`fetch`] for callers (CLI front-ends, tests)
/// that have no tokio runtime of their own to drive the future on.
pub fn fetch_blocking(
    store: &Store,
    refs: &RefStore,
    transport: &dyn Transport,
    refname: &str,
    config: &RepoConfig,
) -> Result<FetchOutcome> {
    fetch(store, refs, transport, refname, config).block_on()
}

/// Synchronous wrapper around [`push`]; see [`fetch_blocking`].
#[allow(clippy::too_many_arguments)]
pub fn push_blocking(
    store: &Store,
    refs: &RefStore,
    transport: &dyn Transport,
    refname: &str,
    new_tip: Oid,
    local_shallow: Option<Oid>,
    remote_tracking_ref: &str,
    config: &RepoConfig,
) -> Result<PushOutcome> {
    push(
        store,
        refs,
        transport,
        refname,
        new_tip,
        local_shallow,
        remote_tracking_ref,
        config,
    )
    .block_on()
}

fn load_frames(store: &Store, oids: &[Oid], is_metadata: bool) -> Result<Vec<(Oid, Vec<u8>)>> {
    // Path resolution depends only on the metadata/blob split (§4.1), so
    // any metadata-kind tag resolves every metadata object correctly.
    let kind = if is_metadata {
        ObjectKind::Commit
    } else {
        ObjectKind::Blob
    };
    oids.iter()
        .map(|oid| Ok((*oid, store.open_read(oid, kind)?.read_to_end()?)))
        .collect()
}
