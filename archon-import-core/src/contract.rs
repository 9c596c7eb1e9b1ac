//! # contract: capability interfaces consumed by the import pipeline
//!
//! The orchestrator in [`crate::import`] never talks to a backend or a filesystem directly.
//! It consumes three small capabilities:
//!
//! - [`Validator`]: is the backend reachable, and is an embedding provider configured?
//! - [`Scanner`]: which files under the root are readmes, documentation or code?
//! - [`Uploader`]: transfer documentation files, or submit code files for example extraction.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can substitute deterministic fakes and
//!   assert on call counts. The mocks are exported with the `test-export-mocks` feature
//!   (on by default) for use from integration tests.
//!
//! ## Errors
//! - All methods return [`BoxError`] on failure. A returned error means the *stage* failed as a
//!   whole; per-file problems belong inside [`UploadOutcome`] instead.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type returned across the collaborator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of probing the backend before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub backend_reachable: bool,
    pub embedding_provider_configured: bool,
}

impl ValidationReport {
    pub fn is_ready(&self) -> bool {
        self.backend_reachable && self.embedding_provider_configured
    }
}

/// Classified files found under the import root.
///
/// The three collections are disjoint: a path appears in at most one of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanResult {
    pub readme_files: Vec<PathBuf>,
    pub documentation: Vec<PathBuf>,
    pub code_files: Vec<PathBuf>,
    /// Sum of the sizes of all classified files, in bytes.
    pub estimated_size_bytes: u64,
}

impl ScanResult {
    /// Everything that gets uploaded as a document: readmes first, then other documentation.
    pub fn documentation_files(&self) -> Vec<PathBuf> {
        self.readme_files
            .iter()
            .chain(self.documentation.iter())
            .cloned()
            .collect()
    }

    pub fn documentation_count(&self) -> usize {
        self.readme_files.len() + self.documentation.len()
    }

    pub fn estimated_size_mb(&self) -> f64 {
        self.estimated_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Per-batch result of an upload or extraction call.
///
/// `errors` holds one human-readable message per failure. The messages are diagnostics only;
/// they are not guaranteed to map 1:1 onto specific paths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadOutcome {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl UploadOutcome {
    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(message.into());
    }
}

/// Probes backend readiness.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Validator: Send + Sync {
    /// Report reachability and embedding readiness. An `Err` is treated as an unexpected
    /// failure, distinct from a report with a `false` flag.
    async fn validate(&self) -> Result<ValidationReport, BoxError>;
}

/// Enumerates and classifies candidate files.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self) -> Result<ScanResult, BoxError>;
}

/// Transfers files to the backend.
///
/// Implementors own any per-file retrying and concurrency; the orchestrator awaits each call to
/// completion and only sees the aggregate outcome.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload documentation files for indexing.
    async fn upload_documents(&self, paths: &[PathBuf]) -> Result<UploadOutcome, BoxError>;

    /// Submit code files for code-example extraction.
    async fn extract_code_examples(&self, paths: &[PathBuf]) -> Result<UploadOutcome, BoxError>;
}
