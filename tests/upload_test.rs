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

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use sshdeploy::app::{run_upload_stage, RunSummary};
use sshdeploy::executor::Uploader;
use sshdeploy::ErrorKind;
use tempfile::TempDir;

use common::{write_file, MockRemote};

#[tokio::test]
async fn test_skipped_lines_are_not_uploaded() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "files.txt", "a.txt\n//skip.txt\nb.txt\n");
    let remote = Arc::new(MockRemote::new());

    let report = Uploader::default()
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(report.total(), 2);
    assert!(report.is_success());
    assert_eq!(remote.uploaded_names(), vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn test_one_outcome_per_entry() {
    let dir = TempDir::new().unwrap();
    let names: Vec<String> = (0..25).map(|i| format!("file{i}.bin")).collect();
    let manifest = write_file(dir.path(), "files.txt", &names.join("\n"));
    let remote = Arc::new(MockRemote::new());

    let report = Uploader::new(4)
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(report.total(), names.len());
    assert_eq!(remote.uploads.lock().unwrap().len(), names.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_limit_is_respected() {
    let dir = TempDir::new().unwrap();
    let contents: Vec<String> = (0..12).map(|i| format!("f{i}")).collect();
    let manifest = write_file(dir.path(), "files.txt", &contents.join("\n"));
    let remote = Arc::new(MockRemote::new().with_upload_delay(Duration::from_millis(20)));

    let report = Uploader::new(3)
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(report.total(), 12);
    let max = remote.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "at most 3 uploads may run at once, saw {max}");
    assert!(max >= 1);
}

#[tokio::test]
async fn test_failed_upload_does_not_stop_others() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "files.txt", "a.txt\nbad.txt\nc.txt\n");
    let remote = Arc::new(MockRemote::new().failing_upload("bad.txt"));

    let report = Uploader::default()
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed_files(), vec!["bad.txt".to_string()]);
    assert_eq!(report.ensure_success().unwrap_err().kind(), ErrorKind::Transfer);
}

#[tokio::test]
async fn test_remote_dir_prefix() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "files.txt", "build/app.tar.gz\n");
    let remote = Arc::new(MockRemote::new());

    Uploader::default()
        .with_remote_dir(Some("/opt/app".to_string()))
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(remote.uploaded_names(), vec!["/opt/app/app.tar.gz"]);
}

#[tokio::test]
async fn test_unreadable_manifest_is_recoverable() {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(MockRemote::new());

    let err = Uploader::default()
        .upload_manifest(Arc::clone(&remote), &dir.path().join("missing.txt"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ManifestRead);
    assert!(remote.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_stage_records_summary() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "files.txt", "a.txt\nbad.txt\n");
    let remote = Arc::new(MockRemote::new().failing_upload("bad.txt"));
    let mut summary = RunSummary::default();

    let err = run_upload_stage(&Uploader::default(), remote, &manifest, &mut summary)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 8);
    assert_eq!(summary.uploads_ok, 1);
    assert_eq!(summary.uploads_failed, 1);
}

#[tokio::test]
async fn test_duplicate_remote_name_is_not_uploaded_twice() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "files.txt", "a/x.txt\nc.txt\nb/x.txt\n");
    let remote = Arc::new(MockRemote::new());

    let report = Uploader::default()
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.failed_files(), vec!["b/x.txt".to_string()]);
    assert_eq!(remote.uploaded_names(), vec!["c.txt", "x.txt"]);
    // outcomes keep manifest order
    let locals: Vec<String> = report
        .results
        .iter()
        .map(|r| r.local.display().to_string())
        .collect();
    assert_eq!(locals, vec!["a/x.txt", "c.txt", "b/x.txt"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_parallel_runs_one_at_a_time() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "files.txt", "a\nb\nc\n");
    let remote = Arc::new(MockRemote::new().with_upload_delay(Duration::from_millis(10)));

    let report = Uploader::new(0)
        .upload_manifest(Arc::clone(&remote), &manifest)
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 3);
    assert_eq!(remote.max_in_flight.load(Ordering::SeqCst), 1);
}
