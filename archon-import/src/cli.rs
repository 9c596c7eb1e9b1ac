///
/// This module implements the CLI interface for archon-import: argument parsing, wiring the
/// concrete collaborators together, and printing the report.
///
/// All pipeline logic (sequencing, classification, result aggregation) lives in the
/// [`archon-import-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: run the installed `archon-import` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// The exit code is derived from the returned [`ImportResult`] by `main`, never here.
///
/// [`archon-import-core`]: ../../archon-import-core/
use crate::load_config::{load_config, Settings};
use crate::report::{render_banner, render_summary, ConsoleProgress, Target};
use crate::upload::{ArchonClient, ArchonClientConfig};
use anyhow::{Context, Result};
use archon_import_core::config::{ImportConfig, ImportOptions, DEFAULT_ARCHON_URL};
use archon_import_core::import::import_to_project;
use archon_import_core::result::{ImportResult, ImportStatus};
use archon_import_core::scan::RepositoryScanner;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// CLI for archon-import: add the current codebase to an existing Archon project.
#[derive(Parser, Debug)]
#[clap(
    name = "archon-import",
    version,
    about = "Import documentation and code examples into an existing Archon project"
)]
pub struct Cli {
    /// Existing Archon project ID to import into
    #[clap(long)]
    pub project_id: String,

    /// Archon backend URL
    #[clap(long, env = "ARCHON_URL", default_value = DEFAULT_ARCHON_URL)]
    pub archon_url: String,

    /// Extract code examples (default)
    #[clap(long, overrides_with = "no_code_examples")]
    pub include_code_examples: bool,

    /// Skip code example extraction
    #[clap(long, overrides_with = "include_code_examples")]
    pub no_code_examples: bool,

    /// Preview what would be imported without uploading anything
    #[clap(long)]
    pub dry_run: bool,

    /// Root of the tree to import (defaults to the current directory)
    #[clap(long)]
    pub path: Option<PathBuf>,

    /// YAML settings file with extra patterns and upload tuning
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Print the final result as JSON on stdout
    #[clap(long)]
    pub json: bool,
}

impl Cli {
    /// Code examples are on unless the last code-example flag given was `--no-code-examples`.
    pub fn code_examples_enabled(&self) -> bool {
        !self.no_code_examples
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
///
/// Setup failures (settings file, backend URL, scan patterns) are returned as errors. Under
/// `--json` a `failed` record is printed first so stdout always carries a result document.
pub async fn run(cli: Cli) -> Result<ImportResult> {
    tracing::info!("trace_initialised");

    let (config, client, scanner) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!(command = "import", error = %format!("{e:#}"), "Import setup failed");
            if cli.json {
                print_json(&setup_failure(&cli.project_id, &e))?;
            }
            return Err(e);
        }
    };

    let progress = ConsoleProgress::new(if cli.json {
        Target::Stderr
    } else {
        Target::Stdout
    });
    progress.print(&render_banner(&config));

    tracing::info!(command = "import", project_id = %config.project_id, "Starting import");
    let result = import_to_project(&config, &client, &scanner, &client, &progress).await;

    if cli.json {
        print_json(&result)?;
    } else {
        println!("{}", render_summary(&result, &config));
    }

    if result.status.is_success() {
        tracing::info!(command = "import", status = %result.status, "Import complete");
    } else {
        tracing::error!(command = "import", status = %result.status, errors = ?result.errors, "Import failed");
    }
    Ok(result)
}

/// Resolves settings and root, then builds the collaborators for one run.
fn prepare(cli: &Cli) -> Result<(ImportConfig, ArchonClient, RepositoryScanner)> {
    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };

    let root = match &cli.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let root = root.canonicalize().unwrap_or(root);

    let config = ImportConfig::assemble(
        ImportOptions {
            project_id: cli.project_id.clone(),
            archon_url: cli.archon_url.clone(),
            root,
            include_code_examples: cli.code_examples_enabled(),
            dry_run: cli.dry_run,
        },
        settings.pattern_extensions(),
    );

    let client = ArchonClient::new(ArchonClientConfig {
        base_url: config.archon_url.clone(),
        project_id: config.project_id.clone(),
        timeout: Duration::from_secs(settings.timeout_secs),
        concurrency: settings.upload_concurrency,
        knowledge_type: settings.knowledge_type.clone(),
        tags: settings.tags.clone(),
    })
    .context("Failed to construct Archon client")?;
    let scanner = RepositoryScanner::new(&config).context("Invalid scan patterns")?;

    Ok((config, client, scanner))
}

fn setup_failure(project_id: &str, e: &anyhow::Error) -> ImportResult {
    let mut result = ImportResult::new(project_id);
    result.push_error(format!("{e:#}"));
    result.finish(ImportStatus::Failed);
    result
}

fn print_json(result: &ImportResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
