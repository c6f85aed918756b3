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

//! SSH authentication methods and server verification.
//!
//! Only the two methods a deployment run can use are supported:
//! - Password authentication
//! - Private key authentication (already decoded in memory)

use russh::client::{Handle, Handler};
use std::path::PathBuf;
use std::sync::Arc;
use zeroize::Zeroizing;

/// An authentication token used when connecting a [`Client`](super::Client).
#[derive(Clone)]
#[non_exhaustive]
pub enum AuthMethod {
    Password(Zeroizing<String>),
    PrivateKey(Arc<russh::keys::PrivateKey>),
}

impl AuthMethod {
    /// Convenience method to create a [`AuthMethod`] from a string literal.
    pub fn with_password(password: &str) -> Self {
        Self::Password(Zeroizing::new(password.to_string()))
    }

    /// Decode an OpenSSH/PEM private key, optionally protected by a passphrase.
    pub fn with_key(key_data: &str, passphrase: Option<&str>) -> Result<Self, super::Error> {
        let key =
            russh::keys::decode_secret_key(key_data, passphrase).map_err(super::Error::KeyInvalid)?;
        Ok(Self::PrivateKey(Arc::new(key)))
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::PrivateKey(_) => "publickey",
        }
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(***)"),
            Self::PrivateKey(key) => f
                .debug_tuple("PrivateKey")
                .field(&key.algorithm().as_str())
                .finish(),
        }
    }
}

/// Server host key verification methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ServerCheckMethod {
    /// No verification - accept any host key
    NoCheck,
    /// Key must already be listed in the given known_hosts file
    KnownHostsFile(PathBuf),
    /// Unknown hosts are appended to the given known_hosts file, changed keys are rejected
    AcceptNew(PathBuf),
}

/// This takes a handle and performs authentication with the given method.
pub(super) async fn authenticate<H: Handler>(
    handle: &mut Handle<H>,
    username: &str,
    auth: AuthMethod,
) -> Result<(), super::Error> {
    match auth {
        AuthMethod::Password(password) => {
            let result = handle.authenticate_password(username, &**password).await?;
            if !result.success() {
                return Err(super::Error::PasswordWrong);
            }
        }
        AuthMethod::PrivateKey(key) => {
            let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
            let result = handle
                .authenticate_publickey(
                    username,
                    russh::keys::PrivateKeyWithHashAlg::new(key, hash_alg),
                )
                .await?;
            if !result.success() {
                return Err(super::Error::KeyAuthFailed);
            }
        }
    };
    Ok(())
}
