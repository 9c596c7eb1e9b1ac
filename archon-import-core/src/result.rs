//! Run record and the additive aggregation rules applied to it.
//!
//! An [`ImportResult`] is created when a run starts and only ever grows: counts are added to,
//! errors are appended, and the status moves from `running` to exactly one terminal value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contract::UploadOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Running,
    Failed,
    Success,
    SuccessDryRun,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Running => "running",
            ImportStatus::Failed => "failed",
            ImportStatus::Success => "success",
            ImportStatus::SuccessDryRun => "success_dry_run",
        }
    }

    /// Both full and dry-run success count as success.
    pub fn is_success(&self) -> bool {
        self.as_str().starts_with("success")
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub project_id: String,
    pub status: ImportStatus,
    pub documents_uploaded: usize,
    pub documents_failed: usize,
    pub code_examples: usize,
    pub code_examples_failed: usize,
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn new(project_id: impl Into<String>) -> Self {
        ImportResult {
            project_id: project_id.into(),
            status: ImportStatus::Running,
            documents_uploaded: 0,
            documents_failed: 0,
            code_examples: 0,
            code_examples_failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_upload(&mut self, outcome: UploadOutcome) {
        self.documents_uploaded += outcome.successful;
        self.documents_failed += outcome.failed;
        self.errors.extend(outcome.errors);
    }

    pub fn record_extraction(&mut self, outcome: UploadOutcome) {
        self.code_examples += outcome.successful;
        self.code_examples_failed += outcome.failed;
        self.errors.extend(outcome.errors);
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Move to a terminal status. Only the first call has any effect.
    pub fn finish(&mut self, status: ImportStatus) {
        if self.status == ImportStatus::Running {
            self.status = status;
        }
    }
}
