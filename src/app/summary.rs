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

use owo_colors::OwoColorize;

use crate::executor::{BatchReport, UploadReport};

/// Counts gathered over a run, printed once at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub uploads_ok: usize,
    pub uploads_failed: usize,
    pub commands_ok: usize,
    pub commands_failed: usize,
    pub commands_skipped: usize,
}

impl RunSummary {
    pub fn record_uploads(&mut self, report: &UploadReport) {
        self.uploads_ok += report.succeeded();
        self.uploads_failed += report.failed();
    }

    pub fn record_command(&mut self, success: bool) {
        if success {
            self.commands_ok += 1;
        } else {
            self.commands_failed += 1;
        }
    }

    pub fn record_batch(&mut self, report: &BatchReport) {
        self.commands_ok += report.succeeded();
        self.commands_failed += report.failed();
        self.commands_skipped += report.skipped.len();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn print(&self) {
        if self.is_empty() {
            return;
        }

        println!("\n{}", "Summary".bold());
        if self.uploads_ok + self.uploads_failed > 0 {
            println!(
                "  uploads:  {} ok, {}",
                self.uploads_ok.to_string().green(),
                colored_failures(self.uploads_failed)
            );
        }
        if self.commands_ok + self.commands_failed + self.commands_skipped > 0 {
            print!(
                "  commands: {} ok, {}",
                self.commands_ok.to_string().green(),
                colored_failures(self.commands_failed)
            );
            if self.commands_skipped > 0 {
                print!(", {} skipped", self.commands_skipped.to_string().yellow());
            }
            println!();
        }
    }
}

fn colored_failures(count: usize) -> String {
    if count == 0 {
        format!("{} failed", count.to_string().dimmed())
    } else {
        format!("{} failed", count.to_string().red())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandResult;

    #[test]
    fn test_record_batch() {
        let report = BatchReport {
            output: b"ok\n".to_vec(),
            results: vec![
                CommandResult {
                    command: "true".to_string(),
                    result: Ok(0),
                },
                CommandResult {
                    command: "false".to_string(),
                    result: Ok(1),
                },
            ],
            skipped: vec!["echo never".to_string()],
        };

        let mut summary = RunSummary::default();
        assert!(summary.is_empty());
        summary.record_command(true);
        summary.record_batch(&report);

        assert_eq!(summary.commands_ok, 2);
        assert_eq!(summary.commands_failed, 1);
        assert_eq!(summary.commands_skipped, 1);
        assert!(!summary.is_empty());
    }
}
