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

//! Credential resolution for the deployment connection.
//!
//! Two paths exist:
//! 1. A key file *and* a username were given: key authentication, no prompt
//!    except a passphrase for an encrypted key.
//! 2. Anything else: prompt for the username (when missing) and a masked
//!    password on the controlling terminal.
//!
//! A key file that cannot be read or decoded is a hard error.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use super::tokio_client::AuthMethod;
use crate::error::{DeployError, Result};

/// A username together with the method used to authenticate it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub auth: AuthMethod,
}

/// Inputs for determining how to authenticate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Optional path to a private key file
    pub key_path: Option<PathBuf>,
    /// Username, if given on the command line
    pub username: Option<String>,
    /// Host for prompts
    pub host: String,
}

impl AuthContext {
    pub fn new(host: String) -> Self {
        Self {
            key_path: None,
            username: None,
            host,
        }
    }

    pub fn with_key_path(mut self, key_path: Option<PathBuf>) -> Self {
        self.key_path = key_path;
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self
    }

    /// Whether resolving will need the terminal for a username or password.
    pub fn is_interactive(&self) -> bool {
        !(self.key_path.is_some() && self.username.is_some())
    }

    /// Resolve the credentials for this run.
    ///
    /// # Errors
    ///
    /// - the key file cannot be read or is not a valid private key
    /// - a prompt fails (no terminal, EOF) or the entered username is empty
    pub fn resolve(&self) -> Result<Credentials> {
        match (&self.key_path, &self.username) {
            (Some(key_path), Some(username)) => Ok(Credentials {
                username: username.clone(),
                auth: self.key_file_auth(key_path)?,
            }),
            (key_path, username) => {
                if let Some(key_path) = key_path {
                    tracing::warn!(
                        "Key file {:?} needs a user (-u); falling back to password login",
                        key_path
                    );
                }
                let username = match username {
                    Some(u) => u.clone(),
                    None => prompt_username()?,
                };
                let auth = self.password_auth(&username)?;
                Ok(Credentials { username, auth })
            }
        }
    }

    fn password_auth(&self, username: &str) -> Result<AuthMethod> {
        tracing::debug!("Using password authentication for {}@{}", username, self.host);
        let password =
            Zeroizing::new(rpassword::prompt_password("Password: ").map_err(DeployError::Prompt)?);
        Ok(AuthMethod::with_password(&password))
    }

    fn key_file_auth(&self, key_path: &Path) -> Result<AuthMethod> {
        tracing::debug!("Authenticating with key: {:?}", key_path);
        load_key_file(key_path, || {
            rpassword::prompt_password(format!("Enter passphrase for key {key_path:?}: "))
                .map(Zeroizing::new)
                .map_err(DeployError::Prompt)
        })
    }
}

/// Read and decode a private key file.
///
/// `passphrase` is only called when the key turns out to be encrypted.
pub fn load_key_file<F>(key_path: &Path, passphrase: F) -> Result<AuthMethod>
where
    F: FnOnce() -> Result<Zeroizing<String>>,
{
    let credential_error = |reason: String| DeployError::Credential {
        path: key_path.to_path_buf(),
        reason,
    };

    let key_contents = Zeroizing::new(
        std::fs::read_to_string(key_path).map_err(|e| credential_error(e.to_string()))?,
    );

    let needs_passphrase = key_contents.contains("ENCRYPTED")
        || matches!(
            russh::keys::decode_secret_key(&key_contents, None),
            Err(russh::keys::Error::KeyIsEncrypted)
        );

    let pass = if needs_passphrase {
        tracing::debug!("Detected encrypted SSH key, prompting for passphrase");
        Some(passphrase()?)
    } else {
        None
    };

    AuthMethod::with_key(&key_contents, pass.as_ref().map(|p| p.as_str()))
        .map_err(|e| credential_error(e.to_string()))
}

fn prompt_username() -> Result<String> {
    print!("User: ");
    std::io::stdout().flush().map_err(DeployError::Prompt)?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(DeployError::Prompt)?;

    let username = line.trim().to_string();
    if username.is_empty() {
        return Err(DeployError::Prompt(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "username cannot be empty",
        )));
    }
    Ok(username)
}
