//! User management routes

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

use pinboard_shared::parse_birth_date;

use crate::{
    auth::{hash_password, AuthUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub dob: String,
}

/// Listing never exposes email addresses or password hashes
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub dob: Date,
}

// =============================================================================
// Handlers
// =============================================================================

/// List all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    let users: Vec<UserSummary> = sqlx::query_as("SELECT id, name, dob FROM users ORDER BY id")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(users))
}

/// Create a user (administrative path; the caller is already authenticated)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    super::auth::validate_profile(&req.name, &req.email)?;

    let dob = parse_birth_date(&req.dob).map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "create_user: password hashing failed");
        ApiError::Internal
    })?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, password_hash, dob)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(req.name.trim())
    .bind(req.email.to_lowercase())
    .bind(&password_hash)
    .bind(dob)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(user_id = %id, created_by = %actor.id, "create_user: user created");

    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            id,
            name: req.name.trim().to_string(),
            dob,
        }),
    ))
}
