use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{addon, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Operator API
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route("/refresh", post(handlers::trigger_refresh));

    // Add-on resources, bare and behind a user config segment
    let addon_routes = Router::new()
        .route("/manifest.json", get(addon::manifest))
        .route("/{config}/manifest.json", get(addon::manifest))
        .route("/catalog/{kind}/{catalog_id}", get(addon::catalog))
        .route("/{config}/catalog/{kind}/{catalog_id}", get(addon::catalog))
        // Extra args (`genre=...`) are accepted and ignored
        .route("/catalog/{kind}/{catalog_id}/{extra}", get(addon::catalog))
        .route(
            "/{config}/catalog/{kind}/{catalog_id}/{extra}",
            get(addon::catalog),
        )
        .route("/meta/{kind}/{id}", get(addon::meta))
        .route("/{config}/meta/{kind}/{id}", get(addon::meta))
        .route("/stream/{kind}/{id}", get(addon::stream))
        .route("/{config}/stream/{kind}/{id}", get(addon::stream));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .merge(addon_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
