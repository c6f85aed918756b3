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

use clap::CommandFactory;
use owo_colors::OwoColorize;
use std::process::ExitCode;

use sshdeploy::{app, utils::init_logging, Cli, DeployConfig, DeployError, ErrorKind};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_normalized() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                exit_code(ErrorKind::Usage.exit_code())
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Nothing touches the network without a host.
    if cli.ip.is_none() {
        eprintln!("{}", Cli::command().render_help());
        return exit_code(ErrorKind::Usage.exit_code());
    }

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{e:#}");
    }

    let config = match DeployConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => return report(e),
    };

    match app::run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

fn report(error: DeployError) -> ExitCode {
    tracing::debug!("Run failed ({} error)", error.kind());
    eprintln!("{} {error}", "Error:".red().bold());
    exit_code(error.exit_code())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
