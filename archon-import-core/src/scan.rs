//! Filesystem implementation of the [`Scanner`] capability.
//!
//! Walks the import root, drops anything matched by an exclusion pattern, and classifies the
//! rest into readmes, documentation and code. Patterns are tested against the root-relative
//! path in every component-suffix form (`a/b/c.md`, `b/c.md`, `c.md`), so `node_modules/**`
//! also catches `web/node_modules/...`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ImportConfig;
use crate::contract::{BoxError, ScanResult, Scanner};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Scan task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Readme,
    Documentation,
    Code,
}

#[derive(Debug, Clone)]
pub struct RepositoryScanner {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    /// Directory names taken from `<dir>/**` exclusions; matching directories are not descended.
    excluded_dirs: GlobSet,
    code_extensions: HashSet<String>,
}

impl RepositoryScanner {
    pub fn new(config: &ImportConfig) -> Result<Self, ScanError> {
        let dir_patterns: Vec<String> = config
            .exclude_patterns
            .iter()
            .filter_map(|p| p.strip_suffix("/**").map(str::to_string))
            .collect();

        Ok(RepositoryScanner {
            root: config.root.clone(),
            include: build_globset(&config.doc_patterns)?,
            exclude: build_globset(&config.exclude_patterns)?,
            excluded_dirs: build_globset(&dir_patterns)?,
            code_extensions: config
                .code_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        })
    }

    /// Synchronous scan of the whole tree.
    pub fn scan_tree(&self) -> Result<ScanResult, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::PathNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        info!(root = %self.root.display(), "Scanning repository");
        let mut result = ScanResult::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_descend(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Error accessing entry, skipping");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(rel) = self.relative(entry.path()) else {
                continue;
            };
            let Some(class) = self.classify(&entry, &rel) else {
                continue;
            };

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Could not read file size");
                    0
                }
            };
            result.estimated_size_bytes += size;

            let path = entry.into_path();
            debug!(path = %path.display(), ?class, "Classified file");
            match class {
                Class::Readme => result.readme_files.push(path),
                Class::Documentation => result.documentation.push(path),
                Class::Code => result.code_files.push(path),
            }
        }

        info!(
            readme_files = result.readme_files.len(),
            documentation = result.documentation.len(),
            code_files = result.code_files.len(),
            estimated_size_bytes = result.estimated_size_bytes,
            "Repository scan complete"
        );
        Ok(result)
    }

    fn should_descend(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        match self.relative(entry.path()) {
            Some(rel) if matches_any(&self.excluded_dirs, &rel) => {
                debug!(path = %entry.path().display(), "Skipping excluded directory");
                false
            }
            _ => true,
        }
    }

    /// Exclusion is checked first; an excluded path is never classified.
    fn classify(&self, entry: &DirEntry, rel: &str) -> Option<Class> {
        if matches_any(&self.exclude, rel) {
            return None;
        }

        let is_code = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| self.code_extensions.contains(&ext));

        // `readme.rs` and friends are source files, not readmes.
        let name = entry.file_name().to_string_lossy();
        if !is_code && name.to_ascii_uppercase().starts_with("README") {
            return Some(Class::Readme);
        }
        if matches_any(&self.include, rel) {
            return Some(Class::Documentation);
        }
        is_code.then_some(Class::Code)
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

#[async_trait]
impl Scanner for RepositoryScanner {
    async fn scan(&self) -> Result<ScanResult, BoxError> {
        let scanner = self.clone();
        let result = tokio::task::spawn_blocking(move || scanner.scan_tree())
            .await
            .map_err(|e| ScanError::Task(e.to_string()))??;
        Ok(result)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidPattern {
        pattern: patterns.join(","),
        source,
    })
}

fn matches_any(set: &GlobSet, rel: &str) -> bool {
    std::iter::once(rel)
        .chain(rel.match_indices('/').map(|(i, _)| &rel[i + 1..]))
        .any(|candidate| set.is_match(candidate))
}
