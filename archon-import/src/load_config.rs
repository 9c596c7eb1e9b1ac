/// `load_config` module: Loads the optional YAML settings file that tunes an import run.
///
/// The settings file never carries run toggles (project, URL, code examples, dry run); those
/// come from the command line and always take precedence. It only extends the baseline pattern
/// lists and tunes the HTTP client.
///
/// # Accepted keys
/// All keys are optional; unknown keys are rejected so typos surface early.
///
/// ```yaml
/// doc_patterns: ["*.adoc"]
/// exclude_patterns: ["vendor/**"]
/// code_extensions: ["zig"]
/// upload_concurrency: 4
/// timeout_secs: 30
/// knowledge_type: technical
/// tags: ["imported"]
/// ```
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary before the pipeline runs.
use anyhow::Result;
use archon_import_core::config::PatternExtensions;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_KNOWLEDGE_TYPE: &str = "technical";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub doc_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub code_extensions: Vec<String>,
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_knowledge_type")]
    pub knowledge_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_upload_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_knowledge_type() -> String {
    DEFAULT_KNOWLEDGE_TYPE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            doc_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            code_extensions: Vec::new(),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            knowledge_type: default_knowledge_type(),
            tags: Vec::new(),
        }
    }
}

impl Settings {
    pub fn pattern_extensions(&self) -> PatternExtensions {
        PatternExtensions {
            doc_patterns: self.doc_patterns.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
            code_extensions: self.code_extensions.clone(),
        }
    }
}

/// Loads a YAML settings file. An empty file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading settings from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Settings file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read settings file");
            return Err(anyhow::anyhow!(
                "Failed to read settings file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if content.trim().is_empty() {
        info!(config_path = ?path_ref, "Settings file is empty, using defaults");
        return Ok(Settings::default());
    }

    let settings: Settings = match serde_yaml::from_str(&content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, "Parsed settings YAML successfully");
            settings
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse settings YAML");
            return Err(anyhow::anyhow!("Failed to parse settings YAML: {e}"));
        }
    };

    if settings.upload_concurrency == 0 {
        error!(config_path = ?path_ref, "upload_concurrency must be at least 1");
        anyhow::bail!("upload_concurrency must be at least 1");
    }
    if settings.timeout_secs == 0 {
        error!(config_path = ?path_ref, "timeout_secs must be at least 1");
        anyhow::bail!("timeout_secs must be at least 1");
    }

    info!(
        extra_doc_patterns = settings.doc_patterns.len(),
        extra_exclude_patterns = settings.exclude_patterns.len(),
        upload_concurrency = settings.upload_concurrency,
        timeout_secs = settings.timeout_secs,
        "Settings loaded"
    );
    Ok(settings)
}
