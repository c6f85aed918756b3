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

//! Sequential execution of a command manifest.

use std::path::Path;

use super::result_types::{BatchReport, CommandResult};
use crate::error::Result;
use crate::manifest::{read_manifest, ManifestEntry};
use crate::ssh::RemoteSession;

/// Runs manifest commands one after another, in file order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchExecutor {
    keep_going: bool,
}

impl BatchExecutor {
    /// With `keep_going` unset the batch stops at the first failing command.
    pub fn new(keep_going: bool) -> Self {
        Self { keep_going }
    }

    pub async fn run_manifest<R>(&self, remote: &R, manifest: &Path) -> Result<BatchReport>
    where
        R: RemoteSession + ?Sized,
    {
        let entries = read_manifest(manifest).await?;
        Ok(self.run_entries(remote, entries).await)
    }

    pub async fn run_entries<R>(&self, remote: &R, entries: Vec<ManifestEntry>) -> BatchReport
    where
        R: RemoteSession + ?Sized,
    {
        let mut report = BatchReport::default();
        let mut entries = entries.into_iter();

        for entry in entries.by_ref() {
            let command = entry.text;
            tracing::info!("Executing: {}", command);

            let result = match remote.exec(&command).await {
                Ok(output) => {
                    report.output.extend_from_slice(&output.output);
                    Ok(output.exit_status)
                }
                Err(e) => Err(e),
            };

            let outcome = CommandResult { command, result };
            let failed = !outcome.is_success();
            if let Some(reason) = outcome.failure_reason() {
                tracing::error!(
                    "Command {:?} (line {}) failed: {}",
                    outcome.command,
                    entry.line,
                    reason
                );
            }
            report.results.push(outcome);

            if failed && !self.keep_going {
                break;
            }
        }

        report.skipped = entries.map(|entry| entry.text).collect();
        if !report.skipped.is_empty() {
            tracing::warn!(
                "Skipped {} command(s) after a failure",
                report.skipped.len()
            );
        }

        report
    }
}
