//! HTTP handlers for the viewer server
//!
//! Page and fragment handlers resolve the manifest on every request. The
//! selection key is read from the raw query so unrelated parameters survive
//! untouched.

use std::time::Instant;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::models::Manifest;
use crate::render::FragmentLinks;
use crate::selection::{QueryState, SelectionCoordinator};

use super::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Resolved manifest with its origin
#[derive(Debug, Serialize)]
pub struct RacesResponse {
    /// Candidate that produced the manifest, `None` when all failed
    pub source: Option<String>,
    pub races: Manifest,
}

/// Picker change request
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    /// Current page query, with or without `?`
    #[serde(default)]
    pub query: String,
    pub race_id: String,
}

/// Location update for a picker change
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub race_id: String,
    pub search: String,
    pub changed: bool,
    pub fragment: String,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/fragments/{file}", get(fragment))
        .route("/api/races", get(list_races))
        .route("/api/selection", post(apply_selection))
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

fn finish(route: &str, started: Instant, response: Response) -> Response {
    metrics::record_http_request(
        route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

// ============================================================================
// Page Handlers
// ============================================================================

/// Race card page
async fn page(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let started = Instant::now();
    let manifest = state.resolver.resolve().await;
    let query = QueryState::parse(raw.as_deref().unwrap_or_default());
    let coordinator = SelectionCoordinator::new(manifest, query, state.query_param.as_str());

    let response = match state.renderer.render_page(&coordinator, FragmentLinks::Server) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    };

    finish("/", started, response)
}

/// Single race card for in-place navigation
async fn fragment(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let started = Instant::now();

    let Some(race_id) = file.strip_suffix(".html") else {
        return finish("/fragments", started, StatusCode::NOT_FOUND.into_response());
    };

    let manifest = state.resolver.resolve().await;
    let response = match manifest.find(race_id) {
        Some(race) => match state.renderer.render_fragment(race) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::error!(race_id, error = %e, "Failed to render fragment");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render fragment").into_response()
            }
        },
        None => (StatusCode::NOT_FOUND, format!("Unknown race: {race_id}")).into_response(),
    };

    finish("/fragments", started, response)
}

// ============================================================================
// JSON Handlers
// ============================================================================

/// Resolved manifest
async fn list_races(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let resolution = state.resolver.resolve_detailed().await;

    let response = Json(ApiResponse::success(RacesResponse {
        source: resolution.source.map(|s| s.location),
        races: resolution.manifest,
    }))
    .into_response();

    finish("/api/races", started, response)
}

/// Apply a picker change to the given query
async fn apply_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Response {
    let started = Instant::now();
    let manifest = state.resolver.resolve().await;
    let mut coordinator = SelectionCoordinator::new(
        manifest,
        QueryState::parse(&request.query),
        state.query_param.as_str(),
    );

    let response = match coordinator.choose(&request.race_id) {
        Ok(navigation) => Json(ApiResponse::success(SelectionResponse {
            fragment: FragmentLinks::Server.href(&navigation.race_id),
            search: navigation.search(),
            race_id: navigation.race_id,
            changed: navigation.changed,
        }))
        .into_response(),
        Err(e) => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    };

    finish("/api/selection", started, response)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

/// Prometheus metrics in text format
async fn metrics_handler() -> Response {
    match metrics::encode_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// ============================================================================
// Tests
// ============================================================================
