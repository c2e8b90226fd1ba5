use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use kensaku_core::search::{SearchResponse, Searcher};
use kensaku_core::{DocId, Document, ErrorKind, IndexError};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[derive(Clone)]
pub struct AppState {
    pub index_root: PathBuf,
    /// `None` only when a reload had to release the old store and could not reopen it.
    pub searcher: Arc<RwLock<Option<Searcher>>>,
    pub admin_token: Option<String>,
}

pub enum ApiError {
    Index(IndexError),
    Unavailable,
    Unauthorized(&'static str),
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        ApiError::Index(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Index(err) => {
                let status = match (&err, err.kind()) {
                    (IndexError::UnknownDocument(_), _) => StatusCode::NOT_FOUND,
                    (_, ErrorKind::InvalidRequest) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                (status, err.to_string())
            }
            ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "index not loaded".to_string()),
            ApiError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn build_app<P: AsRef<std::path::Path>>(index_root: P) -> Result<Router> {
    // Load the index at startup so a missing or broken index fails fast.
    let index_root = index_root.as_ref().to_path_buf();
    let searcher = Searcher::open(&index_root)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { index_root, searcher: Arc::new(RwLock::new(Some(searcher))), admin_token };
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_form_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn respond(state: &AppState, query: &str) -> Result<Json<SearchResponse>, ApiError> {
    let guard = state.searcher.read();
    let searcher = guard.as_ref().ok_or(ApiError::Unavailable)?;
    Ok(Json(searcher.respond(query)?))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    respond(&state, &params.query)
}

pub async fn search_form_handler(
    State(state): State<AppState>,
    Form(params): Form<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    respond(&state, &params.query)
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<Document>, ApiError> {
    let guard = state.searcher.read();
    let searcher = guard.as_ref().ok_or(ApiError::Unavailable)?;
    let doc = searcher.documents().get(doc_id).cloned().ok_or(IndexError::UnknownDocument(doc_id))?;
    Ok(Json(doc))
}

/// Reopens the index from disk, e.g. after the indexer rebuilt it.
///
/// The running searcher keeps serving unless a replacement opened
/// successfully. It is only closed up front when the new open collides with
/// its own keyed store lock, i.e. the directory was not swapped.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let mut guard = state.searcher.write();
    let searcher = match Searcher::open(&state.index_root) {
        Ok(searcher) => searcher,
        Err(e) if e.is_store_locked() => {
            tracing::debug!("index directory unchanged, releasing current store before reopening");
            if let Some(old) = guard.take() {
                close_quietly(old);
            }
            Searcher::open(&state.index_root)?
        }
        Err(e) => {
            tracing::warn!(error = %e, "reload failed, keeping current index");
            return Err(e.into());
        }
    };
    let num_docs = searcher.meta().num_docs;
    if let Some(old) = guard.replace(searcher) {
        close_quietly(old);
    }
    tracing::info!(num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "reloaded": true, "num_docs": num_docs })))
}

fn close_quietly(searcher: Searcher) {
    if let Err(e) = searcher.close() {
        tracing::warn!(error = %e, "closing previous index failed");
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token"))
    }
}
