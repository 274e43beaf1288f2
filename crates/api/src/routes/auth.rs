//! Authentication routes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use pinboard_shared::{parse_birth_date, User};

use crate::{
    auth::{hash_password, verify_password},
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Date of birth as `YYYY-MM-DD`; parsed and validated separately from
    /// the body decode
    pub dob: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_profile(&req.name, &req.email)?;

    let dob = parse_birth_date(&req.dob).map_err(|e| ApiError::Validation(e.to_string()))?;

    // Hash password
    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "register: password hashing failed");
        ApiError::Internal
    })?;

    let email_lower = req.email.to_lowercase();

    // Create user
    let (user_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, password_hash, dob)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(req.name.trim())
    .bind(&email_lower)
    .bind(&password_hash)
    .bind(dob)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "register: failed to insert user");
        ApiError::Database(e.to_string())
    })?;

    // Issue session token
    let token = state.jwt.issue_token(user_id, &email_lower).map_err(|e| {
        tracing::error!(error = %e, "register: token issuance failed");
        ApiError::Internal
    })?;

    tracing::info!(user_id = %user_id, "register: user created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse {
                id: user_id,
                name: req.name.trim().to_string(),
                email: email_lower,
            },
        }),
    ))
}

/// Login with email and password
///
/// Unknown email and wrong password produce the identical generic response
/// so the client cannot tell which field was wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email_lower = req.email.to_lowercase();

    // Find user by email
    let user: User = sqlx::query_as(
        r#"
        SELECT id, name, email, password_hash, dob
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&email_lower)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| {
        tracing::warn!(email = %email_lower, "login: user not found");
        ApiError::InvalidCredentials
    })?;

    // Verify password
    if !verify_password(&req.password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "login: password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    // Issue session token
    let token = state.jwt.issue_token(user.id, &user.email).map_err(|e| {
        tracing::error!(error = %e, "login: token issuance failed");
        ApiError::Internal
    })?;

    tracing::info!(user_id = %user.id, "login: success");

    Ok(Json(AuthResponse {
        token,
        user: UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

/// Validate the name/email fields shared by registration and user creation
pub(super) fn validate_profile(name: &str, email: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > 100 {
        return Err(ApiError::Validation(
            "Name must be between 1 and 100 characters".to_string(),
        ));
    }

    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));

        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@x.com."));
    }

    #[test]
    fn test_validate_profile() {
        assert!(validate_profile("A", "a@x.com").is_ok());

        assert!(validate_profile("", "a@x.com").is_err());
        assert!(validate_profile("   ", "a@x.com").is_err());
        assert!(validate_profile(&"x".repeat(101), "a@x.com").is_err());
        assert!(validate_profile("A", "not-an-email").is_err());
    }
}
