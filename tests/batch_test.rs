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

mod common;

use sshdeploy::app::{run_batch_stage, RunSummary};
use sshdeploy::executor::BatchExecutor;
use sshdeploy::{DeployError, ErrorKind};
use tempfile::TempDir;

use common::{write_file, MockRemote};

#[tokio::test]
async fn test_combined_output_in_order() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "batch.txt", "echo one\necho two\n");
    let remote = MockRemote::new();

    let report = BatchExecutor::default()
        .run_manifest(&remote, &manifest)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.output_string(), "one\ntwo\n");
    assert_eq!(remote.executed(), vec!["echo one", "echo two"]);
}

#[tokio::test]
async fn test_commands_run_in_manifest_order() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(
        dir.path(),
        "batch.txt",
        "mkdir -p /opt/app\n//rm -rf /\n\ntar xzf app.tar.gz\nsystemctl restart app\n",
    );
    let remote = MockRemote::new();

    let report = BatchExecutor::default()
        .run_manifest(&remote, &manifest)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(
        remote.executed(),
        vec![
            "mkdir -p /opt/app",
            "tar xzf app.tar.gz",
            "systemctl restart app"
        ]
    );
}

#[tokio::test]
async fn test_stops_at_first_failure_by_default() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "batch.txt", "echo one\nfalse\necho three\n");
    let remote = MockRemote::new().failing_command("false");

    let report = BatchExecutor::default()
        .run_manifest(&remote, &manifest)
        .await
        .unwrap();

    assert_eq!(remote.executed(), vec!["echo one", "false"]);
    assert_eq!(report.skipped, vec!["echo three".to_string()]);
    assert_eq!(report.failed(), 1);

    match report.ensure_success() {
        Err(DeployError::Command { command, .. }) => assert_eq!(command, "false"),
        other => panic!("Expected command error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_keep_going_runs_everything() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "batch.txt", "echo one\nfalse\necho three\n");
    let remote = MockRemote::new().failing_command("false");

    let report = BatchExecutor::new(true)
        .run_manifest(&remote, &manifest)
        .await
        .unwrap();

    assert_eq!(remote.executed(), vec!["echo one", "false", "echo three"]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.output_string(), "one\nfalse: failed\nthree\n");
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_unreadable_batch_is_recoverable() {
    let dir = TempDir::new().unwrap();
    let remote = MockRemote::new();

    let err = BatchExecutor::default()
        .run_manifest(&remote, &dir.path().join("nope.txt"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ManifestRead);
    assert!(remote.executed().is_empty());
}

#[tokio::test]
async fn test_batch_stage_records_summary() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "batch.txt", "echo a\nfalse\necho b\n");
    let remote = MockRemote::new().failing_command("false");
    let mut summary = RunSummary::default();

    let err = run_batch_stage(&BatchExecutor::default(), &remote, &manifest, &mut summary)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 9);
    assert_eq!(summary.commands_ok, 1);
    assert_eq!(summary.commands_failed, 1);
    assert_eq!(summary.commands_skipped, 1);
}
