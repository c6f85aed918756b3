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

//! Run configuration, built once from the parsed command line.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::{DeployError, Result};
use crate::ssh::{HostKeyPolicy, StrictHostKeyChecking};

/// The remote host of a run and the identity to use on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub cert: Option<PathBuf>,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            user: None,
            cert: None,
        }
    }
}

/// Everything a deployment run needs, passed explicitly to each stage.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub target: Target,
    /// Manifest of local files to upload.
    pub files: Option<PathBuf>,
    /// Single command run on the primary session.
    pub command: Option<String>,
    /// Manifest of commands run in order.
    pub batch: Option<PathBuf>,
    pub remote_dir: Option<String>,
    pub parallel: usize,
    pub keep_going: bool,
    pub host_key: HostKeyPolicy,
    pub connect_timeout: Duration,
}

impl DeployConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let host = cli
            .ip
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DeployError::Usage("A remote host is required (-ip <host>)".to_string()))?;

        if cli.parallel == 0 {
            return Err(DeployError::Usage(
                "--parallel must be at least 1".to_string(),
            ));
        }
        if cli.connect_timeout == 0 {
            return Err(DeployError::Usage(
                "--connect-timeout must be at least 1 second".to_string(),
            ));
        }

        let mode: StrictHostKeyChecking = cli
            .strict_host_key_checking
            .parse()
            .map_err(DeployError::Usage)?;

        let target = Target {
            host: host.to_string(),
            port: cli.port,
            user: cli.user.clone().filter(|u| !u.is_empty()),
            cert: cli.cert.clone(),
        };

        Ok(Self {
            target,
            files: cli.files.clone(),
            command: cli.command.clone().filter(|c| !c.trim().is_empty()),
            batch: cli.batch.clone(),
            remote_dir: cli.remote_dir.clone(),
            parallel: cli.parallel,
            keep_going: cli.keep_going,
            host_key: HostKeyPolicy::new(mode, cli.known_hosts.clone()),
            connect_timeout: Duration::from_secs(cli.connect_timeout),
        })
    }
}
