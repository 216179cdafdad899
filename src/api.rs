use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::models::{DashboardSummary, MonthList, OperationalSummary};
use crate::services::{DashboardError, DashboardService};

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: String,
}

/// `?months=julho/2025,agosto/2025`; omitted means the latest month
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub months: Option<String>,
}

impl DashboardParams {
    pub fn selection(&self) -> Option<Vec<String>> {
        self.months.as_ref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/months", get(get_months))
        .route("/dashboard", get(get_dashboard))
        .route("/operational", get(get_operational))
        .route("/cache/refresh", post(refresh_cache))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state))]
async fn get_months(State(state): State<AppState>) -> Json<MonthList> {
    debug!("Listing available months");
    let months = state.dashboard_service.months().await;
    info!("Retrieved {} months", months.months.len());
    Json(months)
}

#[instrument(skip(state))]
async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardSummary>, StatusCode> {
    let selection = params.selection();
    debug!("Building dashboard for selection {:?}", selection);

    let summary = state
        .dashboard_service
        .summary(selection)
        .await
        .map_err(|e| {
            warn!("Dashboard unavailable: {}", e);
            match e {
                DashboardError::NoData => StatusCode::SERVICE_UNAVAILABLE,
                DashboardError::NoSelection => StatusCode::BAD_REQUEST,
            }
        })?;

    info!(
        "Dashboard built for {} month(s), compared against {}",
        summary.selected_months.len(),
        summary.previous_months.len()
    );
    Ok(Json(summary))
}

#[instrument(skip(state))]
async fn get_operational(State(state): State<AppState>) -> Json<OperationalSummary> {
    debug!("Building operational indicators");
    Json(state.dashboard_service.operational().await)
}

#[instrument(skip(state))]
async fn refresh_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.dashboard_service.refresh().await;
    info!("Cache invalidated on request");
    let response = RefreshResponse {
        status: "invalidated".to_string(),
    };
    (StatusCode::ACCEPTED, Json(response))
}
