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

//! SSH connection establishment.
//!
//! This module handles address resolution, connection attempts, the
//! initial handshake and host key verification.

use russh::client::{Config, Handle, Handler};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::{fmt::Debug, io};

use super::authentication::{AuthMethod, ServerCheckMethod};

/// A ssh connection to a remote server.
///
/// Cloning is cheap: every clone shares the same underlying russh handle,
/// so channels opened from different clones multiplex over one transport.
#[derive(Clone)]
pub struct Client {
    pub(super) connection_handle: Arc<Handle<ClientHandler>>,
    pub(super) username: String,
    pub(super) address: SocketAddr,
}

impl Client {
    /// Open a ssh connection to `host:port` and authenticate.
    ///
    /// If the host resolves to several addresses, each one is tried in turn
    /// until a connection succeeds. Authentication is attempted on the first
    /// successful connection only.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        auth: AuthMethod,
        server_check: ServerCheckMethod,
    ) -> Result<Self, super::Error> {
        let config = Arc::new(Config::default());

        let socket_addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(super::Error::AddressInvalid)?;
        let mut connect_res = Err(super::Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "could not resolve to any addresses",
        )));
        for socket_addr in socket_addrs {
            let handler = ClientHandler::new(host.to_string(), socket_addr, server_check.clone());
            match russh::client::connect(config.clone(), socket_addr, handler).await {
                Ok(h) => {
                    connect_res = Ok((socket_addr, h));
                    break;
                }
                Err(e) => connect_res = Err(e),
            }
        }
        let (address, mut handle) = connect_res?;

        if let Err(e) = super::authentication::authenticate(&mut handle, username, auth).await {
            let _ = handle
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await;
            return Err(e);
        }

        Ok(Self {
            connection_handle: Arc::new(handle),
            username: username.to_string(),
            address,
        })
    }

    /// The address this client is connected to.
    pub fn get_connection_address(&self) -> &SocketAddr {
        &self.address
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<(), super::Error> {
        self.connection_handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
            .map_err(super::Error::SshError)
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("address", &self.address)
            .field("connection_handle", &"Handle<ClientHandler>")
            .finish()
    }
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
    host: SocketAddr,
    server_check: ServerCheckMethod,
}

impl ClientHandler {
    /// Create a new client handler.
    pub fn new(hostname: String, host: SocketAddr, server_check: ServerCheckMethod) -> Self {
        Self {
            hostname,
            host,
            server_check,
        }
    }

    fn lookup(&self, key: &russh::keys::PublicKey, path: &Path) -> Result<bool, super::Error> {
        if !path.exists() {
            return Ok(false);
        }
        match russh::keys::known_hosts::check_known_hosts_path(
            &self.hostname,
            self.host.port(),
            key,
            path,
        ) {
            Ok(found) => Ok(found),
            Err(russh::keys::Error::KeyChanged { line }) => Err(super::Error::HostKeyChanged {
                host: self.hostname.clone(),
                line,
            }),
            Err(e) => {
                tracing::warn!("Failed to read known hosts file {:?}: {}", path, e);
                Err(super::Error::ServerCheckFailed)
            }
        }
    }
}

impl Handler for ClientHandler {
    type Error = super::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.server_check {
            ServerCheckMethod::NoCheck => Ok(true),
            ServerCheckMethod::KnownHostsFile(path) => {
                if self.lookup(server_public_key, path)? {
                    Ok(true)
                } else {
                    Err(super::Error::HostKeyUnknown {
                        host: self.hostname.clone(),
                    })
                }
            }
            ServerCheckMethod::AcceptNew(path) => {
                if self.lookup(server_public_key, path)? {
                    return Ok(true);
                }
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                russh::keys::known_hosts::learn_known_hosts_path(
                    &self.hostname,
                    self.host.port(),
                    server_public_key,
                    path,
                )
                .map_err(|e| {
                    tracing::warn!("Failed to record host key in {:?}: {}", path, e);
                    super::Error::ServerCheckFailed
                })?;
                tracing::info!(
                    "Permanently added '{}' to the list of known hosts",
                    self.hostname
                );
                Ok(true)
            }
        }
    }
}
