//! High-level pipeline: validate → scan → preview or upload → extract.
//!
//! [`import_to_project`] drives a single run against an existing project. It is written as an
//! explicit state machine: each [`Stage`] performs one collaborator call and decides the next
//! stage, so every terminal status is produced at exactly one decision point:
//!
//! | terminal status   | decided in                          |
//! |-------------------|-------------------------------------|
//! | `failed`          | `Validate` (either flag false) or any stage whose call returns `Err` |
//! | `success` (early) | `Scan`, when no documentation exists |
//! | `success_dry_run` | `Preview`                           |
//! | `success`         | `Complete`                          |
//!
//! # Error Handling
//! The orchestrator never returns an error. Collaborator errors become a `failed` result with
//! the error text appended to [`ImportResult::errors`]. Per-file upload failures are *not*
//! stage errors: they are folded into the counts and the run still succeeds.
//!
//! # Callable From
//! - The CLI crate, with the HTTP client and the filesystem scanner.
//! - Tests, with `mockall` mocks from [`crate::contract`].

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::config::ImportConfig;
use crate::contract::{BoxError, ScanResult, Scanner, Uploader, Validator};
use crate::progress::{Progress, ProgressEvent};
use crate::result::{ImportResult, ImportStatus};

#[derive(Debug)]
enum Stage {
    Validate,
    Scan,
    Preview(ScanResult),
    Upload(ScanResult),
    Extract(Vec<PathBuf>),
    Complete,
    Done(ImportStatus),
}

/// Run the import pipeline once and return its final record.
pub async fn import_to_project<V, S, U, P>(
    config: &ImportConfig,
    validator: &V,
    scanner: &S,
    uploader: &U,
    progress: &P,
) -> ImportResult
where
    V: Validator + ?Sized,
    S: Scanner + ?Sized,
    U: Uploader + ?Sized,
    P: Progress + ?Sized,
{
    info!(
        project_id = %config.project_id,
        root = %config.root.display(),
        dry_run = config.dry_run,
        "[IMPORT] Starting import into existing project"
    );

    let mut run = Run {
        config,
        progress,
        result: ImportResult::new(config.project_id.clone()),
    };
    let mut stage = Stage::Validate;

    loop {
        debug!(stage = stage_name(&stage), "[IMPORT] Entering stage");
        stage = match stage {
            Stage::Validate => run.validate(validator).await,
            Stage::Scan => run.scan(scanner).await,
            Stage::Preview(scan) => run.preview(scan),
            Stage::Upload(scan) => run.upload(uploader, scan).await,
            Stage::Extract(code_files) => run.extract(uploader, code_files).await,
            Stage::Complete => Stage::Done(ImportStatus::Success),
            Stage::Done(status) => {
                run.result.finish(status);
                break;
            }
        };
    }

    info!(
        project_id = %run.result.project_id,
        status = %run.result.status,
        documents_uploaded = run.result.documents_uploaded,
        code_examples = run.result.code_examples,
        errors = run.result.errors.len(),
        "[IMPORT] Import finished"
    );
    match serde_json::to_string(&run.result) {
        Ok(json) => debug!(json = %json, "[IMPORT][DEBUG] Final ImportResult as JSON"),
        Err(e) => error!(error = ?e, "[IMPORT][DEBUG] Failed to serialize ImportResult as JSON"),
    }

    run.result
}

fn stage_name(stage: &Stage) -> &'static str {
    match stage {
        Stage::Validate => "validate",
        Stage::Scan => "scan",
        Stage::Preview(_) => "preview",
        Stage::Upload(_) => "upload",
        Stage::Extract(_) => "extract",
        Stage::Complete => "complete",
        Stage::Done(_) => "done",
    }
}

/// State owned by one run: the config it reads and the result it appends to.
struct Run<'a, P: ?Sized> {
    config: &'a ImportConfig,
    progress: &'a P,
    result: ImportResult,
}

impl<P> Run<'_, P>
where
    P: Progress + ?Sized,
{
    async fn validate<V>(&mut self, validator: &V) -> Stage
    where
        V: Validator + ?Sized,
    {
        self.progress.notify(ProgressEvent::ValidationStarted);
        let report = match validator.validate().await {
            Ok(report) => report,
            Err(e) => return self.fail("validate", e),
        };

        if !report.backend_reachable {
            warn!(archon_url = %self.config.archon_url, "[IMPORT][ERROR] Backend not reachable");
            self.progress.notify(ProgressEvent::BackendUnreachable);
            self.result.push_error("Backend not reachable");
            return Stage::Done(ImportStatus::Failed);
        }
        self.progress.notify(ProgressEvent::BackendReachable);

        if !report.embedding_provider_configured {
            warn!("[IMPORT][ERROR] Embedding provider not configured");
            self.progress.notify(ProgressEvent::EmbeddingProviderMissing);
            self.result.push_error("Embedding provider required");
            return Stage::Done(ImportStatus::Failed);
        }
        self.progress.notify(ProgressEvent::EmbeddingProviderConfigured);

        info!("[IMPORT] Backend validated");
        Stage::Scan
    }

    async fn scan<S>(&mut self, scanner: &S) -> Stage
    where
        S: Scanner + ?Sized,
    {
        self.progress.notify(ProgressEvent::ScanStarted);
        let scan = match scanner.scan().await {
            Ok(scan) => scan,
            Err(e) => return self.fail("scan", e),
        };

        info!(
            readme_files = scan.readme_files.len(),
            documentation = scan.documentation.len(),
            code_files = scan.code_files.len(),
            estimated_size_bytes = scan.estimated_size_bytes,
            "[IMPORT] Scan succeeded"
        );
        self.progress.notify(ProgressEvent::ScanCompleted {
            readme_files: scan.readme_files.len(),
            documentation: scan.documentation.len(),
            code_files: self.code_file_count(&scan),
            estimated_size_mb: scan.estimated_size_mb(),
        });

        if scan.documentation_count() == 0 {
            info!("[IMPORT] No documentation files found, nothing to import");
            self.progress.notify(ProgressEvent::NothingToImport);
            return Stage::Done(ImportStatus::Success);
        }

        if self.config.dry_run {
            Stage::Preview(scan)
        } else {
            Stage::Upload(scan)
        }
    }

    fn preview(&mut self, scan: ScanResult) -> Stage {
        info!(
            documents = scan.documentation_count(),
            "[IMPORT] Dry run, skipping upload"
        );
        self.progress.notify(ProgressEvent::DryRunPlan {
            documents: scan.documentation_count(),
            code_files: self.code_file_count(&scan),
        });
        Stage::Done(ImportStatus::SuccessDryRun)
    }

    async fn upload<U>(&mut self, uploader: &U, scan: ScanResult) -> Stage
    where
        U: Uploader + ?Sized,
    {
        let documents = scan.documentation_files();
        info!(count = documents.len(), "[IMPORT][UPLOAD] Uploading documentation files");
        self.progress.notify(ProgressEvent::UploadStarted {
            documents: documents.len(),
        });

        let outcome = match uploader.upload_documents(&documents).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail("upload", e),
        };

        if outcome.failed > 0 {
            warn!(
                successful = outcome.successful,
                failed = outcome.failed,
                "[IMPORT][UPLOAD] Some documentation files failed to upload"
            );
        }
        self.progress.notify(ProgressEvent::UploadCompleted {
            successful: outcome.successful,
            failed: outcome.failed,
        });
        self.result.record_upload(outcome);

        if self.config.include_code_examples {
            Stage::Extract(scan.code_files)
        } else {
            Stage::Extract(Vec::new())
        }
    }

    async fn extract<U>(&mut self, uploader: &U, code_files: Vec<PathBuf>) -> Stage
    where
        U: Uploader + ?Sized,
    {
        if code_files.is_empty() {
            debug!("[IMPORT][EXTRACT] Nothing to extract");
            return Stage::Complete;
        }

        info!(count = code_files.len(), "[IMPORT][EXTRACT] Extracting code examples");
        self.progress.notify(ProgressEvent::ExtractionStarted {
            code_files: code_files.len(),
        });

        let outcome = match uploader.extract_code_examples(&code_files).await {
            Ok(outcome) => outcome,
            Err(e) => return self.fail("extract", e),
        };

        self.progress.notify(ProgressEvent::ExtractionCompleted {
            successful: outcome.successful,
            failed: outcome.failed,
        });
        self.result.record_extraction(outcome);
        Stage::Complete
    }

    fn fail(&mut self, stage: &'static str, e: BoxError) -> Stage {
        let message = e.to_string();
        error!(stage, error = %message, "[IMPORT][ERROR] Stage failed");
        self.progress.notify(ProgressEvent::Failed {
            error: message.clone(),
        });
        self.result.push_error(message);
        Stage::Done(ImportStatus::Failed)
    }

    fn code_file_count(&self, scan: &ScanResult) -> Option<usize> {
        self.config
            .include_code_examples
            .then_some(scan.code_files.len())
    }
}
