//! Console rendering of pipeline progress and the final import report.

use archon_import_core::config::ImportConfig;
use archon_import_core::progress::{Progress, ProgressEvent};
use archon_import_core::result::{ImportResult, ImportStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Stdout,
    /// Used with `--json` so stdout only carries the JSON document.
    Stderr,
}

/// Prints every progress event as it happens.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgress {
    target: Target,
}

impl ConsoleProgress {
    pub fn new(target: Target) -> Self {
        ConsoleProgress { target }
    }

    pub fn print(&self, text: &str) {
        match self.target {
            Target::Stdout => println!("{text}"),
            Target::Stderr => eprintln!("{text}"),
        }
    }
}

impl Progress for ConsoleProgress {
    fn notify(&self, event: ProgressEvent) {
        self.print(&render_event(&event));
    }
}

pub fn render_banner(config: &ImportConfig) -> String {
    format!(
        "Importing to existing Archon project\n   Source: {}\n   Project ID: {}\n",
        config.root.display(),
        config.project_id
    )
}

pub fn render_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::ValidationStarted => "Validating Archon connection...".to_string(),
        ProgressEvent::BackendReachable => "  ✓ Archon backend reachable".to_string(),
        ProgressEvent::BackendUnreachable => "  ✗ Cannot reach Archon backend".to_string(),
        ProgressEvent::EmbeddingProviderConfigured => {
            "  ✓ Embedding provider configured".to_string()
        }
        ProgressEvent::EmbeddingProviderMissing => {
            "  ✗ Embedding provider not configured".to_string()
        }
        ProgressEvent::ScanStarted => "\nScanning repository...".to_string(),
        ProgressEvent::ScanCompleted {
            readme_files,
            documentation,
            code_files,
            estimated_size_mb,
        } => {
            let mut lines = vec![
                format!("  ✓ Found {readme_files} README files"),
                format!("  ✓ Found {documentation} documentation files"),
            ];
            if let Some(code) = code_files {
                lines.push(format!("  ✓ Found {code} code files"));
            }
            lines.push(format!("  ✓ Estimated size: {estimated_size_mb:.2} MB"));
            lines.join("\n")
        }
        ProgressEvent::NothingToImport => "\n  ! No documentation files found to import".to_string(),
        ProgressEvent::DryRunPlan {
            documents,
            code_files,
        } => {
            let mut text = format!(
                "\nDry run completed - would import:\n   - {documents} documentation files"
            );
            if let Some(code) = code_files {
                text.push_str(&format!("\n   - {code} code files"));
            }
            text
        }
        ProgressEvent::UploadStarted { documents } => {
            format!("\nUploading {documents} documentation files...")
        }
        ProgressEvent::UploadCompleted { successful, failed } => {
            with_failures(format!("  ✓ Uploaded {successful} files"), *failed, "files")
        }
        ProgressEvent::ExtractionStarted { code_files } => {
            format!("\nExtracting code examples from {code_files} files...")
        }
        ProgressEvent::ExtractionCompleted { successful, failed } => with_failures(
            format!("  ✓ Extracted {successful} code examples"),
            *failed,
            "code files",
        ),
        ProgressEvent::Failed { error } => format!("\n  ✗ Stage failed: {error}"),
    }
}

fn with_failures(mut text: String, failed: usize, noun: &str) -> String {
    if failed > 0 {
        text.push_str(&format!("\n  ! Failed: {failed} {noun}"));
    }
    text
}

/// Final report printed once the pipeline returns.
pub fn render_summary(result: &ImportResult, config: &ImportConfig) -> String {
    let mut lines = Vec::new();
    match result.status {
        ImportStatus::Success | ImportStatus::SuccessDryRun => {
            if result.status == ImportStatus::Success {
                lines.push("\nImport completed successfully!".to_string());
            } else {
                lines.push("\nDry run finished, nothing was uploaded.".to_string());
            }
            lines.push(format!("   Project: {}", config.project_url()));
            lines.push(format!("   Uploaded: {} documents", result.documents_uploaded));
            if result.code_examples > 0 {
                lines.push(format!("   Extracted: {} code examples", result.code_examples));
            }
            if !result.errors.is_empty() {
                lines.push(format!("   Warnings ({}):", result.errors.len()));
                lines.extend(result.errors.iter().map(|e| format!("     - {e}")));
            }
        }
        ImportStatus::Failed | ImportStatus::Running => {
            lines.push(format!("\nImport failed (status: {})", result.status));
            lines.extend(result.errors.iter().map(|e| format!("   - {e}")));
        }
    }
    lines.join("\n")
}
