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

//! Repository configuration: defaults for every tunable knob the other
//! components read, loadable from a `zeta.toml` document. A missing file
//! is not an error — every field falls back to its documented default.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Error loading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid configuration TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml_edit::TomlError>,
    },
}

/// Store-layer knobs (C2, C4).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Blobs at or above this size are transferred individually through
    /// the resumable transfer engine instead of being batched into a
    /// blob stream (§4.3 "large object threshold").
    pub large_object_threshold_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            large_object_threshold_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Session-layer knobs (C10).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of ordinary objects requested in a single
    /// batch-blob round-trip.
    pub batch_check_cap: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_check_cap: 320_000,
        }
    }
}

/// Transfer-engine knobs (C6).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Number of resume attempts after an `UnexpectedEof` before giving up.
    pub max_retries: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// Merge-engine knobs (C8, C9).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Files larger than this are treated as binary for merge purposes
    /// rather than run through the line-oriented text merge driver.
    pub text_merge_max_bytes: u64,
    /// Path to an external merge-driver executable; when set, it
    /// replaces the built-in diff3-style text merge.
    pub external_driver: Option<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            text_merge_max_bytes: 50 * 1024 * 1024,
            external_driver: None,
        }
    }
}

/// The full set of tunables read by every component in this crate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub store: StoreConfig,
    pub session: SessionConfig,
    pub transfer: TransferConfig,
    pub merge: MergeConfig,
}

impl RepoConfig {
    /// Loads configuration from `path`. A missing file yields the
    /// all-defaults configuration rather than an error; a present but
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigLoadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml_edit::de::from_str(&text).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Loads `zeta.toml` from a repository root, if present.
    pub fn load_from_repo_root(root: &Path) -> Result<Self, ConfigLoadError> {
        Self::load(&root.join("zeta.toml"))
    }
}
