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

//! The object database and merge engine at the core of HugeSCM ("zeta").
//!
//! This crate owns the content-addressed store, the typed object model,
//! the graph walker that computes push/fetch deltas, the pack-stream wire
//! codec, a resumable large-object transfer engine, the loose/special
//! reference store, and the three-way tree merge with its text merge
//! driver. Command-line front-ends, transports, and configuration file
//! loading beyond the knobs this crate reads directly are the concern of
//! other crates that embed this one.

pub mod config;
pub mod error;
pub mod graph;
pub mod merge;
pub mod object;
pub mod oid;
pub mod packstream;
pub mod refs;
pub mod session;
pub mod store;
pub mod text_merge;
pub mod transfer;

pub use error::Error;
pub use error::Result;
pub use oid::Oid;
