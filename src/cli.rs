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

use clap::Parser;
use std::path::PathBuf;

use crate::executor::DEFAULT_MAX_PARALLEL;
use crate::ssh::connection::SSH_CONNECT_TIMEOUT_SECS;

/// Single-dash long flags accepted for compatibility, and their long forms.
const LEGACY_FLAGS: &[(&str, &str)] = &[("-ip", "--ip"), ("-cert", "--cert")];

/// Flags whose next argument is their value.
const VALUE_FLAGS: &[&str] = &[
    "-ip",
    "--ip",
    "--host",
    "-p",
    "--port",
    "-u",
    "--user",
    "-cert",
    "--cert",
    "-i",
    "-c",
    "--command",
    "-b",
    "--batch",
    "-f",
    "--files",
    "--remote-dir",
    "--parallel",
    "--strict-host-key-checking",
    "--known-hosts",
    "--connect-timeout",
];

#[derive(Parser, Debug)]
#[command(
    name = "sshdeploy",
    version,
    about = "Upload files and run deployment commands on a remote host over SSH",
    long_about = "sshdeploy connects to a single host over SSH, optionally uploads the files listed in a\nmanifest, optionally runs one command, and optionally runs a batch of commands read from a file.\nManifest lines starting with // are skipped.",
    after_help = "EXAMPLES:\n  Run one command:         sshdeploy -ip 10.0.0.5 -u deploy -cert ~/.ssh/id_ed25519 -c \"uptime\"\n  Upload then run a batch: sshdeploy -ip 10.0.0.5 -u deploy -f files.txt -b deploy.txt\n  Password login:          sshdeploy --host web1.example.com -c \"systemctl restart app\"\n\nEXIT CODES:\n  0 success, 1 usage, 2 credential, 3 connection, 4 authentication,\n  5 host key, 6 session, 7 manifest, 8 transfer, 9 command"
)]
pub struct Cli {
    #[arg(
        long = "ip",
        visible_alias = "host",
        value_name = "HOST",
        help = "Remote host name or address (also accepted as -ip)"
    )]
    pub ip: Option<String>,

    #[arg(short = 'p', long, default_value = "22", help = "Remote SSH port")]
    pub port: u16,

    #[arg(short = 'u', long, help = "Login user (prompted for when missing)")]
    pub user: Option<String>,

    #[arg(
        short = 'i',
        long = "cert",
        value_name = "KEY_FILE",
        help = "Private key file (also accepted as -cert)\nUsed only together with -u; prompts for the passphrase if the key is encrypted"
    )]
    pub cert: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        allow_hyphen_values = true,
        help = "Command to run once after uploads"
    )]
    pub command: Option<String>,

    #[arg(
        short = 'b',
        long,
        value_name = "FILE",
        help = "File with one command per line, run in order"
    )]
    pub batch: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        help = "File with one local path per line to upload"
    )]
    pub files: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Remote directory for uploaded files [default: login directory]"
    )]
    pub remote_dir: Option<String>,

    #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL, help = "Maximum concurrent uploads")]
    pub parallel: usize,

    #[arg(long, help = "Continue a batch after a command fails")]
    pub keep_going: bool,

    #[arg(
        long,
        default_value = "accept-new",
        help = "Host key checking mode (yes/no/accept-new) [default: accept-new]\n  yes        - Strict checking against known_hosts\n  no         - Accept all host keys (insecure, testing only)\n  accept-new - Accept new hosts, reject changed keys"
    )]
    pub strict_host_key_checking: String,

    #[arg(
        long,
        value_name = "FILE",
        help = "known_hosts file [default: ~/.ssh/known_hosts]"
    )]
    pub known_hosts: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = SSH_CONNECT_TIMEOUT_SECS,
        value_name = "SECONDS",
        help = "Time allowed to connect and authenticate"
    )]
    pub connect_timeout: u64,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

/// Rewrite legacy single-dash long flags (`-ip`, `-cert`) to their long form.
///
/// The value of a value-taking flag and every argument after `--` are left
/// alone, so `-c -ip` keeps `-ip` as the command.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut passthrough = false;
    let mut expects_value = false;
    args.into_iter()
        .map(|arg| {
            if passthrough || std::mem::take(&mut expects_value) {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            expects_value = VALUE_FLAGS.contains(&arg.as_str());
            for (legacy, long) in LEGACY_FLAGS {
                if arg == *legacy {
                    return (*long).to_string();
                }
                if let Some(value) = arg.strip_prefix(legacy).and_then(|r| r.strip_prefix('=')) {
                    return format!("{long}={value}");
                }
            }
            arg
        })
        .collect()
}

impl Cli {
    /// Parse the process arguments, accepting legacy flag spellings.
    ///
    /// Errors are returned instead of exiting so the caller picks the exit
    /// status.
    pub fn try_parse_normalized() -> Result<Self, clap::Error> {
        Self::try_parse_from(normalize_legacy_flags(std::env::args()))
    }
}
