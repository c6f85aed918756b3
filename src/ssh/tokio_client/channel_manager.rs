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

//! SSH channel operations: opening session channels and running commands.

use russh::client::Msg;
use russh::Channel;

use super::connection::Client;

/// Buffer size for SSH command output
/// - 8KB matches typical SSH channel window sizes
const SSH_CMD_BUFFER_SIZE: usize = 8192;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandExecutedResult {
    /// stdout and stderr interleaved in the order the server sent them.
    pub output: Vec<u8>,
    /// The unix exit status (`$?` in bash).
    pub exit_status: u32,
}

impl Client {
    /// Get a new SSH session channel.
    pub async fn get_channel(&self) -> Result<Channel<Msg>, super::Error> {
        self.connection_handle
            .channel_open_session()
            .await
            .map_err(super::Error::SshError)
    }

    /// Execute a remote command on a fresh channel.
    ///
    /// Every invocation is a new shell context, so `cd` and variables do not
    /// carry over to later invocations.
    pub async fn execute(&self, command: &str) -> Result<CommandExecutedResult, super::Error> {
        let channel = self.get_channel().await?;
        execute_on_channel(channel, command).await
    }
}

/// Run `command` on an already opened session channel and collect its
/// combined output and exit status.
///
/// A session channel can run exactly one command; the channel is consumed.
pub async fn execute_on_channel(
    mut channel: Channel<Msg>,
    command: &str,
) -> Result<CommandExecutedResult, super::Error> {
    let mut output = Vec::with_capacity(SSH_CMD_BUFFER_SIZE);
    channel.exec(true, command).await?;

    let mut result: Option<u32> = None;

    while let Some(msg) = channel.wait().await {
        match msg {
            russh::ChannelMsg::Data { ref data } => output.extend_from_slice(data),
            russh::ChannelMsg::ExtendedData { ref data, ext } => {
                if ext == 1 {
                    output.extend_from_slice(data)
                }
            }

            // The exit status may arrive before the last data packet, so keep
            // reading until the channel closes.
            russh::ChannelMsg::ExitStatus { exit_status } => result = Some(exit_status),

            // RFC 4254 5.3 permits closing without EOF, and EOF may even
            // precede Data, so it is not a termination signal.
            _ => {}
        }
    }

    match result {
        Some(exit_status) => Ok(CommandExecutedResult {
            output,
            exit_status,
        }),
        None => Err(super::Error::CommandDidntExit),
    }
}
