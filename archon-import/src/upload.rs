#![doc = "Archon backend client: implements the core Validator and Uploader capabilities over HTTP."]
//
//! # Archon client (CLI <-> Core)
//!
//! [`ArchonClient`] is the networked implementation of the capability traits in
//! [`archon_import_core::contract`]. One client serves both roles:
//!
//! - [`Validator`]: `GET /api/health`, then `GET /api/credentials/categories/rag_strategy` to see
//!   whether an embedding provider is configured.
//! - [`Uploader`]: `POST /api/documents/upload` as `multipart/form-data`, one request per file,
//!   with bounded concurrency.
//!
//! ## Failure semantics
//!
//! - A file that cannot be read, a non-2xx answer or a timeout is a *per-file* failure: it is
//!   counted in the [`UploadOutcome`] and the batch continues.
//! - A refused connection means the backend is gone; the batch stops and returns an error, which
//!   the pipeline reports as a failed stage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use archon_import_core::contract::{BoxError, UploadOutcome, Uploader, ValidationReport, Validator};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use thiserror::Error;

pub const HEALTH_PATH: &str = "/api/health";
pub const RAG_SETTINGS_PATH: &str = "/api/credentials/categories/rag_strategy";
pub const UPLOAD_PATH: &str = "/api/documents/upload";

/// Knowledge type used for files submitted for code-example extraction.
pub const CODE_KNOWLEDGE_TYPE: &str = "code";

/// Any of these keys holding a non-empty string counts as a configured embedding provider.
const EMBEDDING_KEYS: &[&str] = &["EMBEDDING_PROVIDER", "LLM_PROVIDER", "EMBEDDING_MODEL"];

/// Longest response body echoed back into an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid backend URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("lost connection to backend at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Everything needed to talk to one project on one backend.
#[derive(Debug, Clone)]
pub struct ArchonClientConfig {
    pub base_url: String,
    pub project_id: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub knowledge_type: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Documents,
    CodeExamples,
}

enum FileError {
    Rejected(String),
    Connection(ClientError),
}

pub struct ArchonClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    concurrency: usize,
    knowledge_type: String,
    tags: Vec<String>,
}

impl ArchonClient {
    pub fn new(config: ArchonClientConfig) -> Result<Self, ClientError> {
        if let Err(e) = reqwest::Url::parse(&config.base_url) {
            tracing::error!(error = %e, url = %config.base_url, "Invalid Archon backend URL");
            return Err(ClientError::InvalidUrl {
                url: config.base_url,
                message: e.to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;

        tracing::info!(
            base_url = %config.base_url,
            project_id = %config.project_id,
            concurrency = config.concurrency,
            "Initialized ArchonClient"
        );
        Ok(ArchonClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            concurrency: config.concurrency.max(1),
            knowledge_type: config.knowledge_type,
            tags: config.tags,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn backend_reachable(&self) -> bool {
        let url = self.endpoint(HEALTH_PATH);
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(url = %url, "Archon backend reachable");
                true
            }
            Ok(resp) => {
                tracing::warn!(url = %url, status = %resp.status(), "Archon health check returned an error status");
                false
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Archon health check failed");
                false
            }
        }
    }

    async fn embedding_provider_configured(&self) -> bool {
        let url = self.endpoint(RAG_SETTINGS_PATH);
        let resp = match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(url = %url, status = %resp.status(), "RAG settings request returned an error status");
                return false;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "RAG settings request failed");
                return false;
            }
        };

        match resp.json::<serde_json::Value>().await {
            Ok(body) => {
                let configured = embedding_configured_in(&body);
                tracing::info!(configured, "Checked embedding provider settings");
                configured
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "RAG settings response was not valid JSON");
                false
            }
        }
    }

    fn tags_json(&self) -> String {
        let mut tags = vec![format!("project:{}", self.project_id)];
        tags.extend(self.tags.iter().cloned());
        serde_json::Value::from(tags).to_string()
    }

    async fn upload_batch(&self, paths: &[PathBuf], kind: UploadKind) -> Result<UploadOutcome, BoxError> {
        tracing::info!(count = paths.len(), ?kind, "[UPLOAD] Starting batch");
        let mut outcome = UploadOutcome::default();

        let mut uploads = stream::iter(paths.to_vec())
            .map(|path| async move { self.upload_file(&path, kind).await })
            .buffered(self.concurrency);

        while let Some(file_result) = uploads.next().await {
            match file_result {
                Ok(()) => outcome.record_success(),
                Err(FileError::Rejected(message)) => {
                    tracing::warn!(error = %message, "[UPLOAD] File upload failed");
                    outcome.record_failure(message);
                }
                Err(FileError::Connection(e)) => {
                    tracing::error!(error = %e, "[UPLOAD] Backend connection lost, aborting batch");
                    return Err(Box::new(e));
                }
            }
        }

        tracing::info!(
            successful = outcome.successful,
            failed = outcome.failed,
            ?kind,
            "[UPLOAD] Batch finished"
        );
        Ok(outcome)
    }

    async fn upload_file(&self, path: &Path, kind: UploadKind) -> Result<(), FileError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::Rejected(format!("{}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let (knowledge_type, extract) = match kind {
            UploadKind::Documents => (self.knowledge_type.clone(), "false"),
            UploadKind::CodeExamples => (CODE_KNOWLEDGE_TYPE.to_string(), "true"),
        };

        let form = Form::new()
            .part("file", Part::bytes(content).file_name(file_name))
            .text("knowledge_type", knowledge_type)
            .text("tags", self.tags_json())
            .text("project_id", self.project_id.clone())
            .text("extract_code_examples", extract);

        let url = self.endpoint(UPLOAD_PATH);
        tracing::debug!(path = %path.display(), url = %url, "[UPLOAD] Sending file");
        let resp = match self.http.post(&url).multipart(form).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_connect() => {
                return Err(FileError::Connection(ClientError::Connection { url, source: e }));
            }
            Err(e) => return Err(FileError::Rejected(format!("{}: {}", path.display(), e))),
        };

        let status = resp.status();
        if status.is_success() {
            tracing::info!(path = %path.display(), "[UPLOAD] Uploaded file");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(FileError::Rejected(format!(
            "{}: HTTP {}: {}",
            path.display(),
            status.as_u16(),
            truncate(body.trim(), MAX_ERROR_BODY)
        )))
    }
}

#[async_trait]
impl Validator for ArchonClient {
    async fn validate(&self) -> Result<ValidationReport, BoxError> {
        if !self.backend_reachable().await {
            return Ok(ValidationReport {
                backend_reachable: false,
                embedding_provider_configured: false,
            });
        }
        Ok(ValidationReport {
            backend_reachable: true,
            embedding_provider_configured: self.embedding_provider_configured().await,
        })
    }
}

#[async_trait]
impl Uploader for ArchonClient {
    async fn upload_documents(&self, paths: &[PathBuf]) -> Result<UploadOutcome, BoxError> {
        self.upload_batch(paths, UploadKind::Documents).await
    }

    async fn extract_code_examples(&self, paths: &[PathBuf]) -> Result<UploadOutcome, BoxError> {
        self.upload_batch(paths, UploadKind::CodeExamples).await
    }
}

/// Accepts either `{"credentials": {...}}` or a flat settings object.
fn embedding_configured_in(body: &serde_json::Value) -> bool {
    let settings = body.get("credentials").unwrap_or(body);
    EMBEDDING_KEYS.iter().any(|key| {
        settings
            .get(key)
            .and_then(|v| v.as_str())
            .is_some_and(|v| !v.trim().is_empty())
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
