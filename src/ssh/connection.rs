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

//! The single authenticated connection of a deployment run.

use async_trait::async_trait;
use russh::client::Msg;
use russh::Channel;
use std::sync::Arc;
use std::time::Duration;

use super::auth::Credentials;
use super::known_hosts::HostKeyPolicy;
use super::remote::{CommandOutput, DeploySession};
use super::tokio_client::{self, Client};
use crate::config::Target;
use crate::error::{DeployError, Result};

/// Default time allowed for dialing, key exchange and authentication.
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 30;

/// One transport connection plus the primary command channel opened on it.
///
/// Dropping a `Connection` drops the russh handle, which ends the session;
/// [`Connection::close`] disconnects politely first.
pub struct Connection {
    client: Arc<Client>,
    primary: Option<Channel<Msg>>,
}

impl Connection {
    /// Dial `target`, authenticate and open the primary command channel.
    ///
    /// If the channel cannot be opened the transport is disconnected
    /// before the error is returned.
    pub async fn establish(
        target: &Target,
        credentials: Credentials,
        host_key: &HostKeyPolicy,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let check_method = host_key.check_method().ok_or_else(|| {
            DeployError::Usage(
                "Could not determine the known_hosts path; pass --known-hosts <path>".to_string(),
            )
        })?;

        tracing::info!(
            "Connecting to {}@{}:{} ({} authentication)",
            credentials.username,
            target.host,
            target.port,
            credentials.auth.name()
        );

        let client = match tokio::time::timeout(
            connect_timeout,
            Client::connect(
                &target.host,
                target.port,
                &credentials.username,
                credentials.auth,
                check_method,
            ),
        )
        .await
        {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                return Err(DeployError::from_connect(
                    &target.host,
                    target.port,
                    &credentials.username,
                    e,
                ))
            }
            Err(_) => {
                return Err(DeployError::ConnectTimeout {
                    host: target.host.clone(),
                    port: target.port,
                    secs: connect_timeout.as_secs(),
                })
            }
        };

        let primary = match client.get_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = client.disconnect().await {
                    tracing::debug!("Disconnect after channel failure: {}", close_err);
                }
                return Err(DeployError::Session(e));
            }
        };

        tracing::debug!("Connected to {}", client.get_connection_address());
        Ok(Self {
            client: Arc::new(client),
            primary: Some(primary),
        })
    }

    /// Disconnect from the remote host.
    pub async fn close(mut self) {
        if let Some(channel) = self.primary.take() {
            let _ = channel.close().await;
        }
        match self.client.disconnect().await {
            Ok(()) => tracing::debug!("Disconnected"),
            Err(e) => tracing::debug!("Disconnect failed: {}", e),
        }
    }
}

#[async_trait]
impl DeploySession for Connection {
    type Remote = Client;

    fn remote(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    /// The primary channel runs one command; later calls open a fresh one.
    async fn run_primary(&mut self, command: &str) -> Result<CommandOutput> {
        let command_error = |e: tokio_client::Error| DeployError::Command {
            command: command.to_string(),
            reason: e.to_string(),
        };

        let channel = match self.primary.take() {
            Some(channel) => channel,
            None => self.client.get_channel().await.map_err(DeployError::Session)?,
        };

        tokio_client::execute_on_channel(channel, command)
            .await
            .map(CommandOutput::from)
            .map_err(command_error)
    }
}
