use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::DecisionStore,
    middleware::{make_span_with_request_id, request_id_middleware, require_user_middleware},
    services::{catalog::CatalogClient, feed::FeedSessions},
};

pub mod feed;
pub mod library;
pub mod titles;

/// Shared state handed to every handler
pub struct AppState {
    pub feeds: FeedSessions,
    pub catalog: Arc<dyn CatalogClient>,
    pub store: Arc<dyn DecisionStore>,
    /// Prefix joined with poster references in responses
    pub image_base_url: String,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1; all of them require a caller identity
fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/feed", delete(feed::close))
        .route("/feed/start", post(feed::start))
        .route("/feed/category", post(feed::switch_category))
        .route("/feed/current", get(feed::current))
        .route("/feed/classify", post(feed::classify))
        .route("/feed/state", get(feed::state))
        .route("/titles/search", get(titles::search))
        .route("/library/:category/:bucket", get(library::list))
        .route("/library/:category/:bucket/:item_id", delete(library::remove))
        .route(
            "/library/:category/:bucket/:item_id/watched",
            post(library::mark_watched),
        )
        .route_layer(middleware::from_fn(require_user_middleware))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
