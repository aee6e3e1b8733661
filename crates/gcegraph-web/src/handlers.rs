//! HTTP request handlers: API endpoints and frontend serving.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{Json, Redirect};
use rust_embed::Embed;
use tracing::debug;

use gcegraph_core::api::{ApiHost, ApiInventory, ApiRegionSummary, ChartSpec};

use crate::state::AppState;

// ============================================================
// Embedded frontend assets
// ============================================================

#[derive(Embed)]
#[folder = "frontend/dist"]
struct FrontendAssets;

// ============================================================
// Health
// ============================================================

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

// ============================================================
// Inventory
// ============================================================

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses(
        (status = 200, description = "Per-region and global totals", body = ApiInventory)
    )
)]
pub(crate) async fn handle_inventory(State(state): AppState) -> Json<ApiInventory> {
    Json(state.inventory.clone())
}

#[utoipa::path(
    get,
    path = "/api/v1/hosts",
    responses(
        (status = 200, description = "Aggregated hosts sorted by name", body = Vec<ApiHost>)
    )
)]
pub(crate) async fn handle_hosts(State(state): AppState) -> Json<Vec<ApiHost>> {
    Json(state.hosts.clone())
}

// ============================================================
// Regions
// ============================================================

#[utoipa::path(
    get,
    path = "/api/v1/regions",
    responses(
        (status = 200, description = "Sorted region names", body = Vec<String>)
    )
)]
pub(crate) async fn handle_regions(State(state): AppState) -> Json<Vec<String>> {
    Json(state.region_names.clone())
}

#[utoipa::path(
    get,
    path = "/api/v1/regions/{region}",
    params(("region" = String, Path, description = "Region name, e.g. us-central1")),
    responses(
        (status = 200, description = "Totals for one region", body = ApiRegionSummary),
        (status = 404, description = "No hosts in this region")
    )
)]
pub(crate) async fn handle_region(
    State(state): AppState,
    Path(region): Path<String>,
) -> Result<Json<ApiRegionSummary>, StatusCode> {
    state
        .regions
        .get(&region)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

// ============================================================
// Charts
// ============================================================

#[utoipa::path(
    get,
    path = "/api/v1/charts/summary",
    responses(
        (status = 200, description = "Charts for the summary page", body = Vec<ChartSpec>)
    )
)]
pub(crate) async fn handle_summary_charts(State(state): AppState) -> Json<Vec<ChartSpec>> {
    Json(state.summary_charts.clone())
}

#[utoipa::path(
    get,
    path = "/api/v1/charts/regions/{region}",
    params(("region" = String, Path, description = "Region name, e.g. us-central1")),
    responses(
        (status = 200, description = "Charts for one region page", body = Vec<ChartSpec>),
        (status = 404, description = "No hosts in this region")
    )
)]
pub(crate) async fn handle_region_charts(
    State(state): AppState,
    Path(region): Path<String>,
) -> Result<Json<Vec<ChartSpec>>, StatusCode> {
    match state.region_charts.get(&region) {
        Some(charts) => Ok(Json(charts.clone())),
        None => {
            debug!(region, "charts requested for unknown region");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

// ============================================================
// Frontend
// ============================================================

pub(crate) async fn redirect_summary() -> Redirect {
    Redirect::to("/summary")
}

pub(crate) async fn serve_frontend(uri: Uri) -> axum::response::Response<Body> {
    let path = uri.path().trim_start_matches('/');

    // Exact asset match first
    if let Some(file) = FrontendAssets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return with_body(
            StatusCode::OK,
            mime.as_ref(),
            Body::from(file.data.into_owned()),
        );
    }

    // SPA fallback: /summary, /index.html and /{region} all render index.html
    if let Some(index) = FrontendAssets::get("index.html") {
        return with_body(
            StatusCode::OK,
            "text/html; charset=utf-8",
            Body::from(index.data.into_owned()),
        );
    }

    with_body(StatusCode::NOT_FOUND, "text/plain", Body::from("not found"))
}

fn with_body(status: StatusCode, content_type: &str, body: Body) -> axum::response::Response<Body> {
    let mut response = axum::response::Response::new(body);
    *response.status_mut() = status;
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}
