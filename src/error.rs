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

//! Error types for a deployment run.
//!
//! Every stage of a run reports a [`DeployError`]. Each error belongs to an
//! [`ErrorKind`], and each kind has a fixed, documented process exit code:
//!
//! | code | kind             |
//! |------|------------------|
//! | 1    | `Usage`          |
//! | 2    | `Credential`     |
//! | 3    | `Connection`     |
//! | 4    | `Authentication` |
//! | 5    | `HostKey`        |
//! | 6    | `Session`        |
//! | 7    | `ManifestRead`   |
//! | 8    | `Transfer`       |
//! | 9    | `Command`        |

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::ssh::tokio_client;

/// Category of a [`DeployError`], used to pick the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Usage,
    Credential,
    Connection,
    Authentication,
    HostKey,
    Session,
    ManifestRead,
    Transfer,
    Command,
}

impl ErrorKind {
    /// Process exit code for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Usage => 1,
            Self::Credential => 2,
            Self::Connection => 3,
            Self::Authentication => 4,
            Self::HostKey => 5,
            Self::Session => 6,
            Self::ManifestRead => 7,
            Self::Transfer => 8,
            Self::Command => 9,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Usage => "usage",
            Self::Credential => "credential",
            Self::Connection => "connection",
            Self::Authentication => "authentication",
            Self::HostKey => "host key",
            Self::Session => "session",
            Self::ManifestRead => "manifest",
            Self::Transfer => "transfer",
            Self::Command => "command",
        };
        f.write_str(name)
    }
}

/// Error returned by any stage of a deployment run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{0}")]
    Usage(String),

    #[error("Cannot use key file {path:?}: {reason}")]
    Credential { path: PathBuf, reason: String },

    #[error("Failed to read credentials: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Failed to connect to {host}:{port}: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: tokio_client::Error,
    },

    #[error("Connection to {host}:{port} timed out after {secs} seconds")]
    ConnectTimeout { host: String, port: u16, secs: u64 },

    #[error("Authentication as {user} failed: {source}")]
    Authentication {
        user: String,
        #[source]
        source: tokio_client::Error,
    },

    #[error("Host key verification failed: {0}")]
    HostKey(#[source] tokio_client::Error),

    #[error("Failed to open a session channel: {0}")]
    Session(#[source] tokio_client::Error),

    #[error("Cannot read manifest {path:?}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} file(s) failed to upload: {}", files.join(", "))]
    Transfer {
        failed: usize,
        total: usize,
        files: Vec<String>,
    },

    #[error("Command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::Credential { .. } | Self::Prompt(_) => ErrorKind::Credential,
            Self::Connection { .. } | Self::ConnectTimeout { .. } => ErrorKind::Connection,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::HostKey(_) => ErrorKind::HostKey,
            Self::Session(_) => ErrorKind::Session,
            Self::ManifestRead { .. } => ErrorKind::ManifestRead,
            Self::Transfer { .. } => ErrorKind::Transfer,
            Self::Command { .. } => ErrorKind::Command,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Classify an error raised while dialing and authenticating.
    pub(crate) fn from_connect(host: &str, port: u16, user: &str, e: tokio_client::Error) -> Self {
        use tokio_client::Error as E;
        match e {
            E::PasswordWrong | E::KeyAuthFailed => Self::Authentication {
                user: user.to_string(),
                source: e,
            },
            E::ServerCheckFailed | E::HostKeyChanged { .. } | E::HostKeyUnknown { .. } => {
                Self::HostKey(e)
            }
            _ => Self::Connection {
                host: host.to_string(),
                port,
                source: e,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
