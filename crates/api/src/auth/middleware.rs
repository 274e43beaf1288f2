//! Authentication middleware
//!
//! The gate in front of protected routes: extracts a bearer token, validates
//! it, and attaches the verified identity to the request before the inner
//! handler runs. A request that fails any step is rejected with a generic
//! 401 and never reaches the handler.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, state::AppState};

/// Verified identity attached to a request after the gate admits it.
///
/// Handlers read this from request extensions; only `require_auth` inserts
/// it, so its presence proves the token checked out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Pull a bearer token out of the Authorization header.
///
/// Absence and a wrong scheme are both ordinary outcomes, not errors.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Middleware that validates the session token on protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        tracing::debug!("require_auth: no bearer token on request");
        ApiError::Unauthorized
    })?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        // Specific failure stays in the logs; the client sees a generic 401
        tracing::debug!(error = %e, "require_auth: token rejected");
        ApiError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    fn test_state() -> AppState {
        // Lazy pool: never connects, the gate itself does no database I/O
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            database_url: "postgres://localhost/unused".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret-key-at-least-32-chars!".to_string(),
            jwt_expiry_hours: 24,
        };
        AppState::new(pool, config)
    }

    fn protected_router(state: AppState, invoked: Arc<AtomicBool>) -> Router {
        Router::new()
            .route(
                "/protected",
                get(move |Extension(user): Extension<AuthUser>| {
                    let invoked = invoked.clone();
                    async move {
                        invoked.store(true, Ordering::SeqCst);
                        user.email
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("Authorization", "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", "abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_missing_token_rejected_without_invoking_handler() {
        let invoked = Arc::new(AtomicBool::new(false));
        let app = protected_router(test_state(), invoked.clone());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_without_invoking_handler() {
        let invoked = Arc::new(AtomicBool::new(false));
        let app = protected_router(test_state(), invoked.clone());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_valid_token_admits_request() {
        let state = test_state();
        let token = state.jwt.issue_token(7, "a@x.com").unwrap();

        let invoked = Arc::new(AtomicBool::new(false));
        let app = protected_router(state, invoked.clone());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(invoked.load(Ordering::SeqCst));

        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], b"a@x.com");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            database_url: "postgres://localhost/unused".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret-key-at-least-32-chars!".to_string(),
            jwt_expiry_hours: -1,
        };
        let state = AppState::new(pool, config);
        let token = state.jwt.issue_token(7, "a@x.com").unwrap();

        let invoked = Arc::new(AtomicBool::new(false));
        let app = protected_router(state, invoked.clone());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!invoked.load(Ordering::SeqCst));
    }
}
