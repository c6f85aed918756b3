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

//! Result types for uploads and batch execution.

use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::error::DeployError;
use crate::ssh::tokio_client;
use crate::utils::format_bytes;

/// Result of uploading one manifest entry.
#[derive(Debug)]
pub struct UploadResult {
    pub local: PathBuf,
    pub remote: String,
    /// Bytes written on success.
    pub result: Result<u64, tokio_client::Error>,
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn print_summary(&self) {
        match &self.result {
            Ok(bytes) => {
                println!(
                    "{} {} {} {} ({})",
                    "●".green(),
                    self.local.display().to_string().bold(),
                    "→".dimmed(),
                    self.remote.green(),
                    format_bytes(*bytes).yellow()
                );
            }
            Err(e) => {
                println!(
                    "{} {}: {}",
                    "●".red(),
                    self.local.display().to_string().bold(),
                    "Failed to upload file".red()
                );
                println!("    {}", e.to_string().dimmed());
            }
        }
    }
}

/// Outcome of every upload dispatched from one manifest.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub results: Vec<UploadResult>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// True when every transfer succeeded.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failed_files(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.local.display().to_string())
            .collect()
    }

    /// Turn a report with failures into a [`DeployError::Transfer`].
    pub fn ensure_success(&self) -> Result<(), DeployError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(DeployError::Transfer {
                failed: self.failed(),
                total: self.total(),
                files: self.failed_files(),
            })
        }
    }
}

/// Result of one batch command.
#[derive(Debug)]
pub struct CommandResult {
    pub command: String,
    /// Exit status, or the error that prevented the command from completing.
    pub result: Result<u32, tokio_client::Error>,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self.result, Ok(0))
    }

    /// Human readable reason for a failed command.
    pub fn failure_reason(&self) -> Option<String> {
        match &self.result {
            Ok(0) => None,
            Ok(status) => Some(format!("exited with status {status}")),
            Err(e) => Some(e.to_string()),
        }
    }

    pub fn print_summary(&self) {
        match self.failure_reason() {
            None => println!("{} {}", "●".green(), self.command.bold()),
            Some(reason) => println!(
                "{} {}: {}",
                "●".red(),
                self.command.bold(),
                reason.red()
            ),
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Combined output of every command that ran, in execution order.
    pub output: Vec<u8>,
    pub results: Vec<CommandResult>,
    /// Commands not run because an earlier command failed.
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Turn the first failed command into a [`DeployError::Command`].
    pub fn ensure_success(&self) -> Result<(), DeployError> {
        match self
            .results
            .iter()
            .find_map(|r| r.failure_reason().map(|reason| (r, reason)))
        {
            None => Ok(()),
            Some((r, reason)) => Err(DeployError::Command {
                command: r.command.clone(),
                reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn upload(local: &str, ok: bool) -> UploadResult {
        UploadResult {
            local: PathBuf::from(local),
            remote: local.to_string(),
            result: if ok {
                Ok(10)
            } else {
                Err(tokio_client::Error::IoError(std::io::Error::from(
                    std::io::ErrorKind::NotFound,
                )))
            },
        }
    }

    #[test]
    fn test_upload_report_counts() {
        let report = UploadReport {
            results: vec![upload("a.txt", true), upload("b.txt", false)],
        };

        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.failed_files(), vec!["b.txt".to_string()]);

        let err = report.ensure_success().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transfer);
    }

    #[test]
    fn test_empty_upload_report_is_success() {
        let report = UploadReport::default();
        assert!(report.is_success());
        assert!(report.ensure_success().is_ok());
    }

    #[test]
    fn test_command_result_failure_reason() {
        let ok = CommandResult {
            command: "true".to_string(),
            result: Ok(0),
        };
        let failed = CommandResult {
            command: "false".to_string(),
            result: Ok(1),
        };

        assert!(ok.is_success());
        assert_eq!(ok.failure_reason(), None);
        assert!(!failed.is_success());
        assert_eq!(
            failed.failure_reason().as_deref(),
            Some("exited with status 1")
        );
    }

    #[test]
    fn test_batch_report_first_failure_wins() {
        let report = BatchReport {
            output: Vec::new(),
            results: vec![
                CommandResult {
                    command: "true".to_string(),
                    result: Ok(0),
                },
                CommandResult {
                    command: "exit 3".to_string(),
                    result: Ok(3),
                },
                CommandResult {
                    command: "exit 4".to_string(),
                    result: Ok(4),
                },
            ],
            skipped: Vec::new(),
        };

        match report.ensure_success() {
            Err(DeployError::Command { command, reason }) => {
                assert_eq!(command, "exit 3");
                assert_eq!(reason, "exited with status 3");
            }
            other => panic!("Expected command error, got {other:?}"),
        }
    }
}
