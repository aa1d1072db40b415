//! # HTTP API Tests
//!
//! Runs the router on an ephemeral local port over an in-memory store and
//! talks to it with a real HTTP client.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

use procertify::model::Project;
use procertify::render::{FontBook, ImageLoader};
use procertify::server::{AppState, ServerConfig, router};
use procertify::store::{MemoryStore, Snapshot, Store};

struct TestServer {
    base: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(snapshot: Snapshot) -> Self {
        let store = Arc::new(MemoryStore::new(snapshot));
        let config = ServerConfig {
            listen_addr: "127.0.0.1:0".into(),
            store_path: PathBuf::from("unused.json"),
            font_dirs: Vec::new(),
        };
        let state = AppState::with_parts(
            config,
            store.clone(),
            FontBook::empty(),
            ImageLoader::new().unwrap(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(state))).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            store,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
    }

    async fn post_json(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base, path))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }
}

async fn json_body(response: reqwest::Response) -> Value {
    serde_json::from_slice(&response.bytes().await.unwrap()).unwrap()
}

fn two_projects() -> Snapshot {
    let mut first = Project::new("Kurs");
    first.id = "p1".into();
    first.back.bg_url = "data:image/png;base64,broken".into();
    let mut second = Project::new("Katılım");
    second.id = "p2".into();
    Snapshot {
        projects: vec![first, second],
        signatures: Vec::new(),
        companies: Vec::new(),
        active_project_id: Some("p2".into()),
    }
}

#[tokio::test]
async fn test_lists_projects() {
    let server = TestServer::start(two_projects()).await;
    let response = server.get("/api/projects").await;
    assert_eq!(response.status(), 200);

    let body = json_body(response).await;
    assert_eq!(body[0]["id"], "p1");
    assert_eq!(body[0]["sides"], json!(["front", "back"]));
    assert_eq!(body[0]["orientation"], "landscape");
    assert_eq!(body[0]["active"], false);
    assert_eq!(body[1]["sides"], json!(["front"]));
    assert_eq!(body[1]["labels"], json!(["Ad Soyad"]));
    assert_eq!(body[1]["active"], true);
}

#[tokio::test]
async fn test_fields_merge_selection() {
    let server = TestServer::start(two_projects()).await;
    let response = server
        .post_json("/api/fields", json!({"projectIds": ["p1", "p2"]}))
        .await;
    assert_eq!(response.status(), 200);

    let body = json_body(response).await;
    assert_eq!(body["fields"], json!([{"label": "Ad Soyad", "type": "TEXT"}]));
}

#[tokio::test]
async fn test_unknown_project_is_404() {
    let server = TestServer::start(two_projects()).await;
    let response = server
        .post_json("/api/fields", json!({"projectIds": ["nope"]}))
        .await;
    assert_eq!(response.status(), 404);

    let response = server
        .post_json("/api/preview", json!({"projectId": "nope"}))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_preview_returns_png() {
    let server = TestServer::start(two_projects()).await;
    let response = server
        .post_json(
            "/api/preview",
            json!({"projectId": "p1", "side": "back", "values": {"Ad Soyad": "Ali Veli"}}),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");

    let png = response.bytes().await.unwrap();
    let image = image::load_from_memory(&png).unwrap();
    assert_eq!((image.width(), image.height()), (2000, 1414));
}

#[tokio::test]
async fn test_export_downloads_pdf() {
    let server = TestServer::start(two_projects()).await;
    let response = server
        .post_json(
            "/api/export",
            json!({"projectIds": ["p2"], "values": {"Ad Soyad": "Ali Veli"}}),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("filename=\"Sertifika-Ali Veli.pdf\""));
    assert!(response.bytes().await.unwrap().starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_empty_export_is_no_content() {
    let server = TestServer::start(two_projects()).await;
    let response = server
        .post_json("/api/export", json!({"projectIds": []}))
        .await;
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_backup_round_trip() {
    let server = TestServer::start(two_projects()).await;

    let response = server.get("/api/backup").await;
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("procertify_yedek_")
    );
    let backup = json_body(response).await;
    assert_eq!(backup["version"], "1.2.4");

    // Restore a backup holding only the second project.
    let mut trimmed = backup.clone();
    trimmed["projects"] = json!([backup["projects"][1].clone()]);
    trimmed["activeProjectId"] = json!("p1");
    let response = server.post_json("/api/backup", trimmed).await;
    assert_eq!(response.status(), 200);
    let summary = json_body(response).await;
    assert_eq!(summary["projects"], 1);
    assert_eq!(summary["activeProjectId"], "p2");

    let stored = server.store.load().unwrap();
    assert_eq!(stored.projects.len(), 1);
    assert_eq!(stored.projects[0].id, "p2");
}

#[tokio::test]
async fn test_bad_backup_rejected_without_changes() {
    let server = TestServer::start(two_projects()).await;
    let response = server
        .post_json("/api/backup", json!({"projects": {"not": "a list"}}))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(server.store.load().unwrap().projects.len(), 2);
}
