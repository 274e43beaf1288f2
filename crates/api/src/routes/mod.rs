//! API routes

pub mod auth;
pub mod health;
pub mod posts;
pub mod users;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::require_auth, error::ApiError, state::AppState};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Protected routes: the auth gate runs before any handler here
    let protected_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
