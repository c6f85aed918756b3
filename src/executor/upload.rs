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

//! Concurrent upload of the files listed in a manifest.

use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::result_types::{UploadReport, UploadResult};
use crate::error::Result;
use crate::manifest::{read_manifest, ManifestEntry};
use crate::ssh::tokio_client;
use crate::ssh::RemoteSession;
use crate::utils::{file_name, format_bytes};

/// Default number of transfers allowed to run at once.
pub const DEFAULT_MAX_PARALLEL: usize = 10;

/// Uploads manifest entries with at most `max_parallel` transfers in flight.
#[derive(Debug, Clone)]
pub struct Uploader {
    max_parallel: usize,
    remote_dir: Option<String>,
}

impl Default for Uploader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARALLEL)
    }
}

impl Uploader {
    /// A zero limit is treated as one.
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            remote_dir: None,
        }
    }

    /// Place uploaded files under `remote_dir` instead of the login directory.
    pub fn with_remote_dir(mut self, remote_dir: Option<String>) -> Self {
        self.remote_dir = remote_dir.filter(|d| !d.is_empty());
        self
    }

    /// Remote destination for a local file: its base name, under the remote
    /// directory when one is set.
    pub fn remote_path(&self, local: &Path) -> String {
        let name = file_name(local);
        match &self.remote_dir {
            Some(dir) if dir.ends_with('/') => format!("{dir}{name}"),
            Some(dir) => format!("{dir}/{name}"),
            None => name,
        }
    }

    /// Read `manifest` and upload every qualifying entry.
    ///
    /// An unreadable manifest is returned as an error and nothing is
    /// uploaded. Individual transfer failures are recorded in the report.
    pub async fn upload_manifest<R>(&self, remote: Arc<R>, manifest: &Path) -> Result<UploadReport>
    where
        R: RemoteSession + ?Sized + 'static,
    {
        let entries = read_manifest(manifest).await?;
        Ok(self.upload_entries(remote, entries).await)
    }

    /// Upload `entries`, returning exactly one result per entry, in manifest
    /// order.
    ///
    /// An entry whose remote path was already claimed by an earlier entry is
    /// not uploaded and is reported as failed.
    pub async fn upload_entries<R>(&self, remote: Arc<R>, entries: Vec<ManifestEntry>) -> UploadReport
    where
        R: RemoteSession + ?Sized + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let multi_progress = MultiProgress::new();
        let style = create_progress_style();

        let jobs: Vec<(PathBuf, String)> = entries
            .into_iter()
            .map(|entry| {
                let local = PathBuf::from(entry.text);
                let remote_path = self.remote_path(&local);
                (local, remote_path)
            })
            .collect();

        let mut claimed: HashMap<&str, &Path> = HashMap::new();
        let mut results: Vec<Option<UploadResult>> = Vec::with_capacity(jobs.len());
        let mut tasks = Vec::new();

        for (idx, (local, remote_path)) in jobs.iter().enumerate() {
            if let Some(first) = claimed.get(remote_path.as_str()) {
                tracing::error!(
                    "{:?} and {:?} both upload to {}; skipping {:?}",
                    first,
                    local,
                    remote_path,
                    local
                );
                results.push(Some(UploadResult {
                    local: local.clone(),
                    remote: remote_path.clone(),
                    result: Err(tokio_client::Error::IoError(std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("{remote_path} is already the destination of {}", first.display()),
                    ))),
                }));
                continue;
            }
            claimed.insert(remote_path.as_str(), local.as_path());
            results.push(None);

            tracing::info!("Uploading {}", file_name(local));
            let pb = multi_progress.add(ProgressBar::new_spinner());
            pb.set_style(style.clone());
            pb.set_prefix(file_name(local));
            pb.set_message(format!("{}", "Waiting...".dimmed()));
            pb.enable_steady_tick(Duration::from_millis(100));

            let task = tokio::spawn(upload_file_task(
                Arc::clone(&remote),
                local.clone(),
                remote_path.clone(),
                Arc::clone(&semaphore),
                pb,
            ));
            tasks.push((idx, task));
        }

        let (indices, handles): (Vec<usize>, Vec<_>) = tasks.into_iter().unzip();
        let joined = join_all(handles).await;

        for (idx, joined) in indices.into_iter().zip(joined) {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    let (local, remote_path) = &jobs[idx];
                    tracing::error!("Upload task for {:?} failed: {}", local, e);
                    UploadResult {
                        local: local.clone(),
                        remote: remote_path.clone(),
                        result: Err(tokio_client::Error::IoError(std::io::Error::other(
                            e.to_string(),
                        ))),
                    }
                }
            };
            results[idx] = Some(result);
        }

        UploadReport {
            results: results.into_iter().flatten().collect(),
        }
    }
}

async fn upload_file_task<R>(
    remote: Arc<R>,
    local: PathBuf,
    remote_path: String,
    semaphore: Arc<Semaphore>,
    pb: ProgressBar,
) -> UploadResult
where
    R: RemoteSession + ?Sized,
{
    let _permit = match semaphore.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            pb.finish_with_message(format!("{} {}", "●".red(), "Semaphore closed".red()));
            return UploadResult {
                local,
                remote: remote_path,
                result: Err(tokio_client::Error::IoError(std::io::Error::other(
                    format!("Semaphore acquisition failed: {e}"),
                ))),
            };
        }
    };

    pb.set_message(format!("{}", "Uploading (SFTP)...".blue()));

    let result = remote.upload(&local, &remote_path).await;

    match &result {
        Ok(bytes) => pb.finish_with_message(format!(
            "{} {}",
            "●".green(),
            format!("Uploaded {}", format_bytes(*bytes)).green()
        )),
        Err(e) => pb.finish_with_message(format!("{} {}", "●".red(), e.to_string().red())),
    }

    UploadResult {
        local,
        remote: remote_path,
        result,
    }
}

fn create_progress_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
