//! HTTP JSON API.
//!
//! Exposes the application context to browser and script clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/documents` | List indexed documents |
//! | `POST`   | `/documents` | Process a PDF on the server's filesystem |
//! | `DELETE` | `/documents/{name}` | Remove one document |
//! | `DELETE` | `/documents` | Remove everything |
//! | `POST`   | `/search` | Ranked fragments for a query |
//! | `POST`   | `/ask` | Generated answer with its sources |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `extraction_failed` (422), `internal` (500).
//!
//! # Concurrency
//!
//! One [`AppContext`] sits behind a single mutex. Every handler takes the
//! lock on a blocking thread, so requests are served one at a time against
//! the index and slow LLM calls never stall the async runtime.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};

use aula_core::{DocumentSummary, ScoredFragment};

use crate::answer::Answer;
use crate::app::AppContext;
use crate::error::Error;

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    app: Arc<Mutex<AppContext>>,
}

/// Serve the API on `bind` until the process is terminated.
pub async fn run_server(app: Arc<Mutex<AppContext>>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    println!("Aula server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(app)).await?;
    Ok(())
}

/// Build the router with CORS open to every origin.
pub fn router(app: Arc<Mutex<AppContext>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/documents",
            get(handle_list_documents)
                .post(handle_add_document)
                .delete(handle_clear),
        )
        .route("/documents/{name}", delete(handle_remove_document))
        .route("/search", post(handle_search))
        .route("/ask", post(handle_ask))
        .layer(cors)
        .with_state(AppState { app })
}

/// Run `f` against the locked context on a blocking thread.
async fn with_app<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&mut AppContext) -> Result<T, AppError> + Send + 'static,
{
    let app = state.app.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = app
            .lock()
            .map_err(|_| internal("application state lock poisoned"))?;
        f(&mut guard)
    })
    .await
    .map_err(|e| internal(format!("request task failed: {}", e)))?
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::Extraction { .. } => AppError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                code: "extraction_failed",
                message: err.to_string(),
            },
            other => internal(other.to_string()),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

fn require_query(query: &str) -> Result<(), AppError> {
    if query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DocumentSummary>,
}

async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = with_app(&state, |app| Ok(app.documents())).await?;
    Ok(Json(DocumentListResponse { documents }))
}

#[derive(Deserialize)]
struct AddDocumentRequest {
    /// Path of the PDF on the server's filesystem.
    path: String,
    /// Display name; defaults to the file name of `path`.
    name: Option<String>,
}

#[derive(Serialize)]
struct AddDocumentResponse {
    document: String,
    fragments: usize,
}

/// Handler for `POST /documents`.
///
/// Returns `400` for an empty path or name, `404` if the file does not
/// exist, and `422` if no text can be extracted from it.
async fn handle_add_document(
    State(state): State<AppState>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<Json<AddDocumentResponse>, AppError> {
    if req.path.trim().is_empty() {
        return Err(bad_request("path must not be empty"));
    }
    let path = std::path::PathBuf::from(&req.path);
    if !path.is_file() {
        return Err(not_found(format!("no such file: {}", req.path)));
    }

    let document = match req.name {
        Some(name) if name.trim().is_empty() => {
            return Err(bad_request("name must not be empty"))
        }
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| bad_request("path has no file name"))?,
    };

    let name = document.clone();
    let fragments = with_app(&state, move |app| {
        app.process_and_index(&path, &name).map_err(AppError::from)
    })
    .await?;

    Ok(Json(AddDocumentResponse {
        document,
        fragments,
    }))
}

#[derive(Serialize)]
struct RemoveResponse {
    removed: usize,
}

async fn handle_remove_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RemoveResponse>, AppError> {
    let removed = with_app(&state, move |app| {
        let removed = app.remove_document(&name);
        if removed == 0 {
            return Err(not_found(format!("document not indexed: {}", name)));
        }
        Ok(removed)
    })
    .await?;
    Ok(Json(RemoveResponse { removed }))
}

#[derive(Serialize)]
struct ClearResponse {
    cleared: bool,
}

async fn handle_clear(State(state): State<AppState>) -> Result<Json<ClearResponse>, AppError> {
    with_app(&state, |app| {
        app.clear_all();
        Ok(())
    })
    .await?;
    Ok(Json(ClearResponse { cleared: true }))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    /// Defaults to `retrieval.top_k`.
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<ScoredFragment>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    require_query(&req.query)?;
    if req.limit == Some(0) {
        return Err(bad_request("limit must be >= 1"));
    }

    let results = with_app(&state, move |app| Ok(app.search(&req.query, req.limit))).await?;
    Ok(Json(SearchResponse { results }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    query: String,
}

/// Handler for `POST /ask`.
///
/// Generation failures are not HTTP errors: the answer text carries the
/// failure and the retrieved sources are still returned.
async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, AppError> {
    require_query(&req.query)?;
    let answer = with_app(&state, move |app| Ok(app.ask(&req.query))).await?;
    Ok(Json(answer))
}
