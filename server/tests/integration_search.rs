use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use kensaku_core::build::{build_index, IndexConfig};
use kensaku_core::docstore::DocumentStore;
use kensaku_core::search::Searcher;
use kensaku_core::tokenizer::TokenizerKind;
use kensaku_server::{router, AppState};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn build_tiny_index(root: &Path, pairs: &[(&str, &str)]) {
    let docs = DocumentStore::from_corpus(pairs.iter().map(|(t, b)| (t.to_string(), b.to_string())));
    let config = IndexConfig::new(root).with_tokenizer(TokenizerKind::Whitespace);
    build_index(&config, &docs).unwrap();
}

fn app_for(root: &Path) -> Router {
    let searcher = Searcher::open(root).unwrap();
    router(AppState {
        index_root: root.to_path_buf(),
        searcher: Arc::new(RwLock::new(Some(searcher))),
        admin_token: Some(TOKEN.to_string()),
    })
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Bytes) {
    call(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn search_returns_first_seen_documents() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");
    build_tiny_index(&root, &[("Tokyo", "Tokyo is the capital"), ("Osaka", "Osaka is a city")]);
    let app = app_for(&root);

    let (status, body) = get(&app, "/search?query=city%20Tokyo").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 2);
    assert_eq!(json["Query"], "city Tokyo");
    let docs = json["Documents"].as_array().unwrap();
    assert_eq!(docs[0]["Id"], 1);
    assert_eq!(docs[0]["Title"], "Osaka");
    assert_eq!(docs[1]["Id"], 0);
    assert_eq!(docs[1]["Text"], "Tokyo is the capital");
}

#[tokio::test]
async fn form_post_and_misses() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");
    build_tiny_index(&root, &[("cat", "cat dog")]);
    let app = app_for(&root);

    let req = Request::post("/search")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("query=dog"))
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 1);

    let (status, body) = get(&app, "/search?query=bird").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 0);
    assert_eq!(json["Documents"].as_array().unwrap().len(), 0);

    let (status, _) = get(&app, "/search?query=").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn doc_lookup() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");
    build_tiny_index(&root, &[("cat", "cat dog")]);
    let app = app_for(&root);

    let (status, body) = get(&app, "/doc/0").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Title"], "cat");

    let (status, _) = get(&app, "/doc/5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_picks_up_rebuilt_index() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");
    build_tiny_index(&root, &[("cat", "cat dog")]);
    let app = app_for(&root);

    let unauthorized = Request::post("/admin/reload").body(Body::empty()).unwrap();
    let (status, _) = call(&app, unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    build_tiny_index(&root, &[("bird", "bird fish"), ("fish", "fish")]);
    let req = Request::post("/admin/reload").header("X-ADMIN-TOKEN", TOKEN).body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["num_docs"], 2);

    let (_, body) = get(&app, "/search?query=fish").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 2);
    let (_, body) = get(&app, "/search?query=cat").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 0);
}

fn reload_request() -> Request<Body> {
    Request::post("/admin/reload").header("X-ADMIN-TOKEN", TOKEN).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn failed_reload_keeps_serving_current_index() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");
    build_tiny_index(&root, &[("cat", "cat dog")]);
    let app = app_for(&root);

    std::fs::write(root.join("meta.json"), "{broken").unwrap();
    let (status, _) = call(&app, reload_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = get(&app, "/search?query=dog").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 1);
}

#[tokio::test]
async fn reload_of_unchanged_directory_succeeds() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");
    build_tiny_index(&root, &[("cat", "cat dog")]);
    let app = app_for(&root);

    let (status, body) = call(&app, reload_request()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["num_docs"], 1);

    let (_, body) = get(&app, "/search?query=cat").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["Hit"], 1);
}

#[tokio::test]
async fn unloaded_index_answers_service_unavailable() {
    let dir = tempdir().unwrap();
    let app = router(AppState {
        index_root: dir.path().join("index"),
        searcher: Arc::new(RwLock::new(None)),
        admin_token: Some(TOKEN.to_string()),
    });

    let (status, _) = get(&app, "/search?query=cat").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = get(&app, "/doc/0").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
