//! Stage-boundary notifications emitted by the import pipeline.
//!
//! These are purely observational: a [`Progress`] sink can print them, record them, or drop
//! them, and nothing it does feeds back into control flow.

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ValidationStarted,
    BackendReachable,
    BackendUnreachable,
    EmbeddingProviderConfigured,
    EmbeddingProviderMissing,
    ScanStarted,
    ScanCompleted {
        readme_files: usize,
        documentation: usize,
        /// `None` when code examples are disabled for the run.
        code_files: Option<usize>,
        estimated_size_mb: f64,
    },
    NothingToImport,
    DryRunPlan {
        documents: usize,
        code_files: Option<usize>,
    },
    UploadStarted {
        documents: usize,
    },
    UploadCompleted {
        successful: usize,
        failed: usize,
    },
    ExtractionStarted {
        code_files: usize,
    },
    ExtractionCompleted {
        successful: usize,
        failed: usize,
    },
    Failed {
        error: String,
    },
}

pub trait Progress: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn notify(&self, _event: ProgressEvent) {}
}
