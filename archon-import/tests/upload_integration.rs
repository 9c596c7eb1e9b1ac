use std::fs::write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use archon_import::upload::{ArchonClient, ArchonClientConfig, HEALTH_PATH, RAG_SETTINGS_PATH, UPLOAD_PATH};
use archon_import_core::contract::{Uploader, Validator};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str) -> ArchonClient {
    ArchonClient::new(ArchonClientConfig {
        base_url: base_url.to_string(),
        project_id: "proj-1".to_string(),
        timeout: Duration::from_secs(5),
        concurrency: 2,
        knowledge_type: "technical".to_string(),
        tags: vec!["imported".to_string()],
    })
    .expect("client builds")
}

#[tokio::test]
async fn validate_reports_ready_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RAG_SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credentials": {"EMBEDDING_PROVIDER": "openai", "EMBEDDING_MODEL": "text-embedding-3-small"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client_for(&server.uri()).validate().await.expect("validate");

    assert!(report.backend_reachable);
    assert!(report.embedding_provider_configured);
}

#[tokio::test]
async fn unhealthy_backend_skips_embedding_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RAG_SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = client_for(&server.uri()).validate().await.expect("validate");

    assert!(!report.backend_reachable);
    assert!(!report.embedding_provider_configured);
}

#[tokio::test]
async fn empty_rag_settings_mean_no_embedding_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RAG_SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"credentials": {}})))
        .mount(&server)
        .await;

    let report = client_for(&server.uri()).validate().await.expect("validate");

    assert!(report.backend_reachable);
    assert!(!report.embedding_provider_configured);
}

#[tokio::test]
async fn refused_connection_is_unreachable_not_an_error() {
    let report = client_for("http://127.0.0.1:1")
        .validate()
        .await
        .expect("validate never errors on transport failure");
    assert!(!report.backend_reachable);
}

#[tokio::test]
async fn upload_documents_posts_each_file_with_project_tag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let readme = tmp.path().join("README.md");
    let guide = tmp.path().join("guide.md");
    write(&readme, "# Readme").unwrap();
    write(&guide, "# Guide").unwrap();

    let outcome = client_for(&server.uri())
        .upload_documents(&[readme, guide])
        .await
        .expect("batch completes");

    assert_eq!(outcome.successful, 2);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.errors.is_empty());

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(body.contains("name=\"project_id\""), "body: {body}");
    assert!(body.contains("proj-1"));
    assert!(body.contains("project:proj-1"));
    assert!(body.contains("imported"));
    assert!(body.contains("technical"));
}

#[tokio::test]
async fn per_file_failures_are_counted_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("embedding quota exceeded"))
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let present = tmp.path().join("present.md");
    write(&present, "content").unwrap();
    let missing = tmp.path().join("missing.md");

    let outcome = client_for(&server.uri())
        .upload_documents(&[present.clone(), missing.clone()])
        .await
        .expect("batch completes");

    assert_eq!(outcome.successful, 0);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.errors.len(), 2);
    // Errors keep input order.
    assert!(outcome.errors[0].contains("present.md"));
    assert!(outcome.errors[0].contains("HTTP 500"));
    assert!(outcome.errors[0].contains("embedding quota exceeded"));
    assert!(outcome.errors[1].contains("missing.md"));
}

#[tokio::test]
async fn extraction_requests_code_examples() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let code = tmp.path().join("main.rs");
    write(&code, "fn main() {}").unwrap();

    let outcome = client_for(&server.uri())
        .extract_code_examples(&[code])
        .await
        .expect("batch completes");
    assert_eq!(outcome.successful, 1);

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    let flag = body
        .split("name=\"extract_code_examples\"")
        .nth(1)
        .expect("flag part present");
    assert!(flag.trim_start().starts_with("true"), "flag part: {flag}");
    assert!(body.contains("name=\"knowledge_type\"\r\n\r\ncode"));
}

#[tokio::test]
async fn lost_backend_aborts_the_batch() {
    let tmp = tempdir().unwrap();
    let doc = tmp.path().join("doc.md");
    write(&doc, "x").unwrap();

    let result = client_for("http://127.0.0.1:1")
        .upload_documents(&[doc, PathBuf::from("other.md")])
        .await;

    let err = result.expect_err("connection refused should abort");
    assert!(err.to_string().contains("lost connection"), "got: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn uploads_can_run_on_spawned_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let paths: Vec<PathBuf> = ["a.md", "b.md", "c.rs"]
        .iter()
        .map(|name| {
            let path = tmp.path().join(name);
            write(&path, name).unwrap();
            path
        })
        .collect();

    let client: Arc<dyn Uploader> = Arc::new(client_for(&server.uri()));
    let docs = {
        let client = Arc::clone(&client);
        let paths = paths[..2].to_vec();
        tokio::spawn(async move { client.upload_documents(&paths).await })
    };
    let code = {
        let client = Arc::clone(&client);
        let paths = paths[2..].to_vec();
        tokio::spawn(async move { client.extract_code_examples(&paths).await })
    };

    let docs = docs.await.unwrap().expect("batch completes");
    let code = code.await.unwrap().expect("batch completes");
    assert_eq!(docs.successful, 2);
    assert_eq!(code.successful, 1);
}
