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

use super::tokio_client::ServerCheckMethod;
use directories::BaseDirs;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Get the default known_hosts file path
pub fn get_default_known_hosts_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
}

/// Mode for host key checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrictHostKeyChecking {
    /// Always verify host keys (fail on unknown/changed)
    Yes,
    /// Never verify host keys (accept all)
    No,
    /// Verify known hosts, add new ones automatically (TOFU)
    #[default]
    AcceptNew,
}

impl FromStr for StrictHostKeyChecking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" | "true" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            "accept-new" | "tofu" => Ok(Self::AcceptNew),
            other => Err(format!(
                "invalid host key checking mode '{other}' (expected yes, no or accept-new)"
            )),
        }
    }
}

impl fmt::Display for StrictHostKeyChecking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::AcceptNew => "accept-new",
        })
    }
}

/// Host key verification policy for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKeyPolicy {
    pub mode: StrictHostKeyChecking,
    /// Overrides `~/.ssh/known_hosts`.
    pub known_hosts: Option<PathBuf>,
}

impl HostKeyPolicy {
    pub fn new(mode: StrictHostKeyChecking, known_hosts: Option<PathBuf>) -> Self {
        Self { mode, known_hosts }
    }

    /// The known_hosts file this policy reads and writes.
    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        self.known_hosts
            .clone()
            .or_else(get_default_known_hosts_path)
    }

    /// Translate the policy into the check the SSH handler performs.
    ///
    /// Returns `None` when a checking mode needs a known_hosts file but no
    /// home directory could be determined.
    pub fn check_method(&self) -> Option<ServerCheckMethod> {
        match self.mode {
            StrictHostKeyChecking::No => {
                tracing::warn!("Host key checking disabled; any server key will be accepted");
                Some(ServerCheckMethod::NoCheck)
            }
            StrictHostKeyChecking::Yes => {
                let path = self.known_hosts_path()?;
                tracing::debug!("Using known_hosts file: {:?} (strict mode)", path);
                Some(ServerCheckMethod::KnownHostsFile(path))
            }
            StrictHostKeyChecking::AcceptNew => {
                let path = self.known_hosts_path()?;
                tracing::debug!("Using known_hosts file: {:?} (accept-new mode)", path);
                Some(ServerCheckMethod::AcceptNew(path))
            }
        }
    }
}

impl Default for HostKeyPolicy {
    fn default() -> Self {
        Self::new(StrictHostKeyChecking::default(), None)
    }
}
