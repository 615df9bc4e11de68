//! The HTTP API server backing the dashboard.
//!
//! All routes live under `/api` and return JSON. Handlers are thin: they
//! parse query parameters, call into the `api` orchestration functions and
//! render the result.

use crate::api::{self, CostSource, Mode};
use crate::model::{FindingKind, Mover, Summary, Window};
use crate::{summary, Config};
use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for request handlers.
pub struct AppState {
    source: Box<dyn CostSource>,
    default_window: Window,
    mover_limit: usize,
}

impl AppState {
    pub fn new(source: Box<dyn CostSource>, default_window: Window, mover_limit: usize) -> Self {
        Self {
            source,
            default_window,
            mover_limit,
        }
    }
}

/// Binds the configured address and serves the API until the process is
/// stopped.
pub async fn run(config: &Config, mode: Mode) -> crate::Result<()> {
    let source = api::source(config, mode)?;
    let state = Arc::new(AppState::new(
        source,
        config.default_window(),
        config.mover_limit(),
    ));
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind '{addr}'"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .context("The HTTP server stopped unexpectedly")
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(get_root))
        .route("/api/summary", get(get_summary))
        .route("/api/products", get(get_products))
        .route("/api/movers", get(get_movers))
        .route("/api/findings", get(get_findings))
        .route("/api/resource/{id}", get(get_resource))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::not_found("No such route")
}

/// Unified error type that renders as a JSON `{"error": "..."}` response
/// with an appropriate HTTP status code.
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<crate::Error> for AppError {
    fn from(e: crate::Error) -> Self {
        error!("request failed: {e:#}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct WindowParams {
    window: Option<Window>,
}

#[derive(Deserialize)]
struct MoversParams {
    window: Option<Window>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct FindingsParams {
    limit: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<FindingKind>,
}

/// GET /api/
async fn get_root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": "costguard",
        "version": env!("CARGO_PKG_VERSION"),
        "default_window": state.default_window,
        "endpoints": [
            "/api/summary",
            "/api/products",
            "/api/movers",
            "/api/findings",
            "/api/resource/{id}",
        ],
    }))
}

/// GET /api/summary?window=30d
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Summary>, AppError> {
    let window = params.window.unwrap_or(state.default_window);
    let summary = api::build_summary(state.source.as_ref(), window).await?;
    Ok(Json(summary))
}

/// GET /api/products?window=30d
///
/// The per-product spend breakdown over the trailing window, sorted by spend
/// descending.
async fn get_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Value>, AppError> {
    let window = params.window.unwrap_or(state.default_window);
    let rows = state.source.costs_by_service(window).await?;
    let products = summary::product_breakdown(rows, window);
    Ok(Json(json!({ "window": window, "products": products })))
}

/// GET /api/movers?window=30d&limit=7
async fn get_movers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MoversParams>,
) -> Result<Json<Vec<Mover>>, AppError> {
    let window = params.window.unwrap_or(state.default_window);
    let limit = match params.limit {
        Some(0) => return Err(AppError::bad_request("limit must be a positive integer")),
        Some(limit) => limit,
        None => state.mover_limit,
    };
    let movers = api::top_movers(state.source.as_ref(), window, limit).await?;
    Ok(Json(movers))
}

/// GET /api/findings?type=orphan&limit=10
async fn get_findings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FindingsParams>,
) -> Result<Json<Value>, AppError> {
    let mut findings = api::findings(state.source.as_ref()).await?;
    if let Some(kind) = params.kind {
        findings.retain(|f| f.kind == kind);
    }
    if let Some(limit) = params.limit {
        findings.truncate(limit);
    }
    Ok(Json(json!({ "count": findings.len(), "findings": findings })))
}

/// GET /api/resource/{id}
///
/// Everything known about one resource: its inventory record, recent daily
/// costs, utilization samples and any findings against it.
async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    match api::resource_detail(state.source.as_ref(), &id).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(AppError::not_found(format!("No resource with id '{id}'"))),
    }
}
