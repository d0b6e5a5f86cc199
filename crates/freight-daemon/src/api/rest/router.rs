//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router.
///
/// The `/shipping` paths are consumed by an existing frontend and are fixed;
/// they are not nested under an API-version prefix.
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let mut router = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Shipping
        .route("/shipping/create", post(handlers::create_shipment))
        .route(
            "/shipping/track/:tracking_number",
            get(handlers::track_shipment),
        )
        .route("/shipping/:id", get(handlers::get_shipment))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
