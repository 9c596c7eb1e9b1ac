use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use archon_import::upload::{HEALTH_PATH, RAG_SETTINGS_PATH, UPLOAD_PATH};

/// Two documentation files and one code file.
fn create_sample_repo() -> TempDir {
    let dir = tempdir().expect("Creating temp repo failed");
    let root = dir.path();
    create_dir_all(root.join("docs")).unwrap();
    create_dir_all(root.join("src")).unwrap();
    create_dir_all(root.join("node_modules/pkg")).unwrap();
    write(root.join("README.md"), "# Sample\n").unwrap();
    write(root.join("docs/guide.md"), "# Guide\n").unwrap();
    write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
    write(root.join("node_modules/pkg/README.md"), "ignored\n").unwrap();
    dir
}

async fn ready_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RAG_SETTINGS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"credentials": {"EMBEDDING_PROVIDER": "openai"}})),
        )
        .mount(&server)
        .await;
    server
}

fn cli_for(project: &str, url: &str, root: &Path) -> archon_import::Cli {
    archon_import::Cli {
        project_id: project.to_string(),
        archon_url: url.to_string(),
        include_code_examples: false,
        no_code_examples: false,
        dry_run: false,
        path: Some(root.to_path_buf()),
        config: None,
        json: false,
    }
}

#[test]
fn help_lists_flags() {
    let mut cmd = Command::cargo_bin("archon-import").expect("Binary exists");
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("--project-id")
            .and(predicate::str::contains("--archon-url"))
            .and(predicate::str::contains("--include-code-examples"))
            .and(predicate::str::contains("--no-code-examples"))
            .and(predicate::str::contains("--dry-run")),
    );
}

#[test]
fn missing_project_id_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("archon-import").expect("Binary exists");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("--project-id"));
}

#[test]
fn unreachable_backend_exits_non_zero() {
    let repo = create_sample_repo();
    let mut cmd = Command::cargo_bin("archon-import").expect("Binary exists");
    cmd.args(["--project-id", "proj-1", "--archon-url", "http://127.0.0.1:1", "--path"])
        .arg(repo.path())
        .env_remove("ARCHON_URL");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Backend not reachable"));
}

#[test]
fn invalid_settings_file_exits_non_zero() {
    let repo = create_sample_repo();
    let settings = repo.path().join("settings.yaml");
    write(&settings, "upload_concurrency: 0\n").unwrap();

    let mut cmd = Command::cargo_bin("archon-import").expect("Binary exists");
    cmd.args(["--project-id", "proj-1", "--path"])
        .arg(repo.path())
        .arg("--config")
        .arg(&settings);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("upload_concurrency"));
}

#[test]
fn invalid_settings_file_still_prints_json_result() {
    let repo = create_sample_repo();
    let settings = repo.path().join("settings.yaml");
    write(&settings, "timeout_secs: 0\n").unwrap();

    let output = Command::cargo_bin("archon-import")
        .expect("Binary exists")
        .args(["--project-id", "proj-1", "--json", "--path"])
        .arg(repo.path())
        .arg("--config")
        .arg(&settings)
        .output()
        .expect("binary runs");

    assert_eq!(output.status.code(), Some(1));
    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a single JSON document");
    assert_eq!(result["status"], "failed");
    assert_eq!(result["project_id"], "proj-1");
    assert!(result["errors"][0]
        .as_str()
        .is_some_and(|e| e.contains("timeout_secs")));
}

#[tokio::test(flavor = "multi_thread")]
async fn dry_run_json_reports_plan_without_uploading() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let repo = create_sample_repo();
    let root = repo.path().to_path_buf();
    let url = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("archon-import")
            .expect("Binary exists")
            .args(["--project-id", "proj-1", "--dry-run", "--json", "--archon-url", &url, "--path"])
            .arg(&root)
            .output()
            .expect("binary runs")
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a single JSON document");
    assert_eq!(result["status"], "success_dry_run");
    assert_eq!(result["project_id"], "proj-1");
    assert_eq!(result["documents_uploaded"], 0);
    // Progress goes to stderr in JSON mode.
    assert!(String::from_utf8_lossy(&output.stderr).contains("Dry run completed"));
}

#[tokio::test]
async fn run_imports_docs_and_code_examples() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let repo = create_sample_repo();
    let result = archon_import::run(cli_for("proj-1", &server.uri(), repo.path()))
        .await
        .expect("run completes");

    assert_eq!(result.status.as_str(), "success");
    assert_eq!(result.documents_uploaded, 2);
    assert_eq!(result.documents_failed, 0);
    assert_eq!(result.code_examples, 1);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
}

#[tokio::test]
async fn run_skips_extraction_when_disabled() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let repo = create_sample_repo();
    let mut cli = cli_for("proj-1", &server.uri(), repo.path());
    cli.no_code_examples = true;

    let result = archon_import::run(cli).await.expect("run completes");

    assert_eq!(result.status.as_str(), "success");
    assert_eq!(result.documents_uploaded, 2);
    assert_eq!(result.code_examples, 0);
}

#[tokio::test]
async fn run_fails_without_embedding_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RAG_SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let repo = create_sample_repo();
    let result = archon_import::run(cli_for("proj-1", &server.uri(), repo.path()))
        .await
        .expect("run completes");

    assert_eq!(result.status.as_str(), "failed");
    assert_eq!(result.errors, vec!["Embedding provider required".to_string()]);
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Collects the debug rendering of every emitted event.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    // A missing settings file stops the run right after start-up.
    let repo = create_sample_repo();
    let mut cli = cli_for("proj-1", "http://127.0.0.1:1", repo.path());
    cli.config = Some(repo.path().join("missing.yaml"));
    let _ = archon_import::run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
