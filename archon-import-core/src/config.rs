use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_ARCHON_URL: &str = "http://localhost:8181";

/// Documentation globs every run starts from.
pub const BASELINE_DOC_PATTERNS: &[&str] = &[
    "*.md",
    "*.rst",
    "*.txt",
    "docs/**/*",
    "documentation/**/*",
    "README*",
    "CONTRIBUTING*",
    "CHANGELOG*",
];

/// Build output, dependency trees, VCS metadata, minified assets, virtualenvs and the
/// assistant's own config directory.
pub const BASELINE_EXCLUDE_PATTERNS: &[&str] = &[
    "node_modules/**",
    ".git/**",
    "*.min.js",
    "*.min.css",
    "dist/**",
    "build/**",
    "__pycache__/**",
    ".venv/**",
    "venv/**",
    ".claude/**",
];

pub const BASELINE_CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "kt", "rb", "c", "h", "cpp", "hpp", "cs",
    "swift", "php", "scala", "sh",
];

/// Parameters supplied by the caller for a single run. These always win over any file-based
/// settings.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub project_id: String,
    pub archon_url: String,
    pub root: PathBuf,
    pub include_code_examples: bool,
    pub dry_run: bool,
}

/// Extra patterns layered on top of the baseline lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternExtensions {
    #[serde(default)]
    pub doc_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub code_extensions: Vec<String>,
}

/// Configuration resolved once per run. Handed to the pipeline by shared reference only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub root: PathBuf,
    pub archon_url: String,
    pub project_id: String,
    pub include_code_examples: bool,
    pub dry_run: bool,
    pub doc_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub code_extensions: Vec<String>,
}

impl ImportConfig {
    /// Merge caller options with the baseline pattern lists and any extensions.
    ///
    /// Extensions are appended after the baseline; exact duplicates are dropped, the baseline
    /// entries never are.
    pub fn assemble(options: ImportOptions, extensions: PatternExtensions) -> Self {
        let config = ImportConfig {
            root: options.root,
            archon_url: options.archon_url,
            project_id: options.project_id,
            include_code_examples: options.include_code_examples,
            dry_run: options.dry_run,
            doc_patterns: merge(BASELINE_DOC_PATTERNS, extensions.doc_patterns),
            exclude_patterns: merge(BASELINE_EXCLUDE_PATTERNS, extensions.exclude_patterns),
            code_extensions: merge(
                BASELINE_CODE_EXTENSIONS,
                extensions
                    .code_extensions
                    .into_iter()
                    .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                    .collect(),
            ),
        };
        config.trace_loaded();
        config
    }

    /// Human navigation link for the target project: `{archon_url}/projects/{project_id}`.
    pub fn project_url(&self) -> String {
        format!("{}/projects/{}", self.archon_url, self.project_id)
    }

    pub fn trace_loaded(&self) {
        info!(
            root = %self.root.display(),
            archon_url = %self.archon_url,
            project_id = %self.project_id,
            include_code_examples = self.include_code_examples,
            dry_run = self.dry_run,
            doc_patterns = self.doc_patterns.len(),
            exclude_patterns = self.exclude_patterns.len(),
            "Assembled ImportConfig"
        );
        debug!(?self, "ImportConfig assembled (full debug)");
    }
}

fn merge(baseline: &[&str], extra: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = baseline.iter().map(|p| p.to_string()).collect();
    for pattern in extra {
        if !merged.contains(&pattern) {
            merged.push(pattern);
        }
    }
    merged
}
