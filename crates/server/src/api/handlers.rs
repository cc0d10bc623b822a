use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use stashcast_core::{SanitizedConfig, SchedulerStatus};
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct StoreStatus {
    pub records: usize,
    pub matched_records: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub scheduler: SchedulerStatus,
    pub store: StoreStatus,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub started: bool,
    pub message: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let records = state.store().get_all().await;
    let store = StoreStatus {
        records: records.len(),
        matched_records: records.iter().filter(|r| r.has_matches()).count(),
        refreshed_at: state.store().refreshed_at().await,
    };

    Json(StatusResponse {
        scheduler: state.scheduler().status().await,
        store,
    })
}

/// POST /api/v1/refresh
///
/// Starts a cycle unless one is already in flight.
pub async fn trigger_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.scheduler().trigger().started() {
        (
            StatusCode::ACCEPTED,
            Json(RefreshResponse {
                started: true,
                message: "Refresh cycle started".to_string(),
            }),
        )
    } else {
        (
            StatusCode::CONFLICT,
            Json(RefreshResponse {
                started: false,
                message: "A refresh cycle is already running".to_string(),
            }),
        )
    }
}

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
