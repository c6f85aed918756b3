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

//! Runs the stages of a deployment in their fixed order:
//! credentials, connect, upload, single command, batch.

use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;

use super::summary::RunSummary;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::executor::{BatchExecutor, Uploader};
use crate::ssh::{AuthContext, Connection, DeploySession, RemoteSession};

/// Run a deployment described by `config`.
///
/// A failing stage stops the later ones. The connection is closed and the
/// summary printed on every path once connected.
pub async fn run(config: &DeployConfig) -> Result<()> {
    let auth = AuthContext::new(config.target.host.clone())
        .with_key_path(config.target.cert.clone())
        .with_username(config.target.user.clone());
    if auth.is_interactive() {
        tracing::debug!("Reading credentials for {} from the terminal", auth.host);
    }
    let credentials = auth.resolve()?;

    let mut connection = Connection::establish(
        &config.target,
        credentials,
        &config.host_key,
        config.connect_timeout,
    )
    .await?;

    let mut summary = RunSummary::default();
    let outcome = run_stages(&mut connection, config, &mut summary).await;

    connection.close().await;
    summary.print();
    outcome
}

/// Run the requested stages on an established session: upload, then the
/// single command, then the batch. The first failing stage ends the run.
pub async fn run_stages<S>(
    session: &mut S,
    config: &DeployConfig,
    summary: &mut RunSummary,
) -> Result<()>
where
    S: DeploySession,
{
    if let Some(files) = &config.files {
        let uploader = Uploader::new(config.parallel).with_remote_dir(config.remote_dir.clone());
        run_upload_stage(&uploader, session.remote(), files, summary).await?;
    }

    if let Some(command) = &config.command {
        tracing::info!("Executing: {}", command);
        let output = session.run_primary(command).await.inspect_err(|_| {
            summary.record_command(false);
        })?;
        let text = output.output_string();
        if !text.is_empty() {
            tracing::info!("{}", text.trim_end());
        }
        summary.record_command(output.is_success());
        if !output.is_success() {
            return Err(DeployError::Command {
                command: command.clone(),
                reason: format!("exited with status {}", output.exit_status),
            });
        }
    }

    if let Some(batch) = &config.batch {
        let executor = BatchExecutor::new(config.keep_going);
        run_batch_stage(&executor, session.remote().as_ref(), batch, summary).await?;
    }

    Ok(())
}

/// Upload the files listed in `manifest` and report each outcome.
pub async fn run_upload_stage<R>(
    uploader: &Uploader,
    remote: Arc<R>,
    manifest: &Path,
    summary: &mut RunSummary,
) -> Result<()>
where
    R: RemoteSession + ?Sized + 'static,
{
    let report = uploader.upload_manifest(remote, manifest).await?;
    for result in &report.results {
        result.print_summary();
    }
    summary.record_uploads(&report);
    report.ensure_success()
}

/// Run the command manifest at `manifest`, logging its combined output.
pub async fn run_batch_stage<R>(
    executor: &BatchExecutor,
    remote: &R,
    manifest: &Path,
    summary: &mut RunSummary,
) -> Result<()>
where
    R: RemoteSession + ?Sized,
{
    let report = executor.run_manifest(remote, manifest).await?;

    let output = report.output_string();
    if !output.is_empty() {
        tracing::info!("{}", output.trim_end());
    }
    for result in &report.results {
        result.print_summary();
    }
    summary.record_batch(&report);

    report.ensure_success()?;
    println!("{}", "Deploy Done!!!".green().bold());
    Ok(())
}
