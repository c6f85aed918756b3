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

//! Errors raised by the low-level SSH client.

use std::io;
use thiserror::Error;

/// Error type of the low-level SSH client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Key authentication failed")]
    KeyAuthFailed,
    #[error("Unable to load key, bad format or passphrase: {0}")]
    KeyInvalid(russh::keys::Error),
    #[error("Password authentication failed")]
    PasswordWrong,
    #[error("Invalid address was provided: {0}")]
    AddressInvalid(io::Error),
    #[error("The executed command didn't send an exit code")]
    CommandDidntExit,
    #[error("Server check failed")]
    ServerCheckFailed,
    #[error("Host key for {host} does not match the entry on line {line} of the known hosts file")]
    HostKeyChanged { host: String, line: usize },
    #[error("Host {host} is not present in the known hosts file")]
    HostKeyUnknown { host: String },
    #[error("SSH error: {0}")]
    SshError(#[from] russh::Error),
    #[error("SFTP error: {0}")]
    SftpError(#[from] russh_sftp::client::error::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}
