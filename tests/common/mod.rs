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

//! In-memory remote host used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sshdeploy::ssh::tokio_client::Error;
use sshdeploy::ssh::{CommandOutput, DeploySession, RemoteSession};
use sshdeploy::DeployError;

/// Records every call and answers from canned behaviour.
#[derive(Default)]
pub struct MockRemote {
    pub uploads: Mutex<Vec<(PathBuf, String)>>,
    pub commands: Mutex<Vec<String>>,
    /// Uploads and commands in the order they reached the host.
    pub events: Mutex<Vec<String>>,
    /// Local file names whose upload fails.
    pub failing_uploads: HashSet<String>,
    /// Commands that exit with status 1.
    pub failing_commands: HashSet<String>,
    pub upload_delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upload(mut self, name: &str) -> Self {
        self.failing_uploads.insert(name.to_string());
        self
    }

    pub fn failing_command(mut self, command: &str) -> Self {
        self.failing_commands.insert(command.to_string());
        self
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, remote)| remote.clone())
            .collect();
        names.sort();
        names
    }

    pub fn executed(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteSession for MockRemote {
    async fn upload(&self, local: &Path, remote: &str) -> Result<u64, Error> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }

        self.uploads
            .lock()
            .unwrap()
            .push((local.to_path_buf(), remote.to_string()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.events.lock().unwrap().push(format!("upload {remote}"));
        if self.failing_uploads.contains(&name) {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        Ok(name.len() as u64)
    }

    async fn exec(&self, command: &str) -> Result<CommandOutput, Error> {
        self.commands.lock().unwrap().push(command.to_string());
        self.events.lock().unwrap().push(format!("exec {command}"));

        if self.failing_commands.contains(command) {
            return Ok(CommandOutput {
                output: format!("{command}: failed\n").into_bytes(),
                exit_status: 1,
            });
        }

        // Echo what a shell would print for `echo <text>`.
        let output = match command.strip_prefix("echo ") {
            Some(text) => format!("{text}\n").into_bytes(),
            None => Vec::new(),
        };
        Ok(CommandOutput {
            output,
            exit_status: 0,
        })
    }
}

/// Session whose primary channel is the mock host as well.
pub struct MockSession {
    pub remote: Arc<MockRemote>,
}

impl MockSession {
    pub fn new(remote: MockRemote) -> Self {
        Self {
            remote: Arc::new(remote),
        }
    }
}

#[async_trait]
impl DeploySession for MockSession {
    type Remote = MockRemote;

    fn remote(&self) -> Arc<MockRemote> {
        Arc::clone(&self.remote)
    }

    async fn run_primary(&mut self, command: &str) -> sshdeploy::Result<CommandOutput> {
        self.remote
            .exec(command)
            .await
            .map_err(|e| DeployError::Command {
                command: command.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Write `contents` to `name` inside `dir` and return its path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
