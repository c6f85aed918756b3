// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line-oriented manifests of file paths or shell commands.
//!
//! A line whose first two characters are `//` is skipped. The prefix is a
//! full-line marker, not an inline comment. Blank lines are skipped too.

use std::path::Path;

use crate::error::{DeployError, Result};

/// Marker that disables a manifest line.
pub const SKIP_PREFIX: &str = "//";

/// One qualifying manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// 1-based line number in the manifest file.
    pub line: usize,
    pub text: String,
}

/// Parse manifest text into its qualifying entries, in file order.
pub fn parse_manifest(contents: &str) -> Vec<ManifestEntry> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = raw.trim_end();
            if text.trim_start().is_empty() || text.starts_with(SKIP_PREFIX) {
                None
            } else {
                Some(ManifestEntry {
                    line: idx + 1,
                    text: text.to_string(),
                })
            }
        })
        .collect()
}

/// Read and parse the manifest at `path`.
///
/// An unreadable manifest is reported as [`DeployError::ManifestRead`].
pub async fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DeployError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
    let entries = parse_manifest(&contents);
    tracing::debug!("Manifest {:?}: {} entries", path, entries.len());
    Ok(entries)
}
