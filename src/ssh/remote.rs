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

//! Operations the uploader and the batch executor need from a connected host.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::tokio_client::{self, Client};
use crate::error::Result;

/// Combined output and exit status of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: Vec<u8>,
    pub exit_status: u32,
}

impl CommandOutput {
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }

    pub fn is_success(&self) -> bool {
        self.exit_status == 0
    }
}

impl From<tokio_client::CommandExecutedResult> for CommandOutput {
    fn from(result: tokio_client::CommandExecutedResult) -> Self {
        Self {
            output: result.output,
            exit_status: result.exit_status,
        }
    }
}

/// A connected remote host.
///
/// Every call opens its own channel over the shared transport, so an
/// implementation can be used from several tasks at once.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Copy the local file at `local` to `remote`, returning the bytes written.
    async fn upload(&self, local: &Path, remote: &str) -> std::result::Result<u64, tokio_client::Error>;

    /// Run `command` on a fresh command channel.
    async fn exec(&self, command: &str) -> std::result::Result<CommandOutput, tokio_client::Error>;
}

/// The connected session a deployment run drives.
///
/// Besides the shared [`RemoteSession`] used by uploads and batches, it owns
/// the primary channel the single command runs on.
#[async_trait]
pub trait DeploySession: Send {
    type Remote: RemoteSession + ?Sized + 'static;

    /// Shared handle for stages that open their own channels.
    fn remote(&self) -> Arc<Self::Remote>;

    /// Run the single command on the primary channel.
    async fn run_primary(&mut self, command: &str) -> Result<CommandOutput>;
}

#[async_trait]
impl RemoteSession for Client {
    async fn upload(&self, local: &Path, remote: &str) -> std::result::Result<u64, tokio_client::Error> {
        self.upload_file(local, remote).await
    }

    async fn exec(&self, command: &str) -> std::result::Result<CommandOutput, tokio_client::Error> {
        self.execute(command).await.map(CommandOutput::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_success() {
        let result = CommandOutput {
            output: b"Hello World\n".to_vec(),
            exit_status: 0,
        };

        assert!(result.is_success());
        assert_eq!(result.output_string(), "Hello World\n");
    }

    #[test]
    fn test_command_output_failure_with_utf8() {
        let result = CommandOutput {
            output: "エラー\n".as_bytes().to_vec(),
            exit_status: 127,
        };

        assert!(!result.is_success());
        assert_eq!(result.output_string(), "エラー\n");
    }
}
