use archon_import::cli::{run, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment
    dotenv::dotenv().ok();

    // Logs go to stderr so they never interleave with the printed report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let code = match run(cli).await {
        Ok(result) => {
            tracing::info!(status = %result.status, "CLI completed");
            result.status.exit_code()
        }
        Err(e) => {
            eprintln!("[ERROR] Import failed: {e:#}");
            tracing::error!(error = %e, "CLI exited with error");
            1
        }
    };
    std::process::exit(code);
}
