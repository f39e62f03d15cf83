use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Root user
        .route("/root", post(handlers::load_root))
        // Followers
        .route("/followers", get(handlers::get_followers))
        .route(
            "/followers/:follower_id/ratings",
            post(handlers::load_follower_ratings),
        )
        .route("/followers/:follower_id/reset", post(handlers::reset_follower))
        .route("/followers/:follower_id/weight", post(handlers::toggle_weight))
        .route(
            "/followers/:follower_id/scores",
            get(handlers::get_follower_scores),
        )
        // Aggregates
        .route("/popularity", get(handlers::get_popularity))
        .route("/items/:item_id/stats", get(handlers::get_item_stats))
}
