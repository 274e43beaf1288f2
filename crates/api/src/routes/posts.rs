//! Post routes

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use time::OffsetDateTime;

use pinboard_shared::Post;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

/// List all posts
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<Post>>> {
    let posts: Vec<Post> =
        sqlx::query_as("SELECT id, content, created_at FROM posts ORDER BY created_at")
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(posts))
}

/// Create a post
pub async fn create_post(
    State(state): State<AppState>,
    Extension(author): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Post content is required".to_string()));
    }

    let (id, created_at): (i64, OffsetDateTime) = sqlx::query_as(
        r#"
        INSERT INTO posts (content)
        VALUES ($1)
        RETURNING id, created_at
        "#,
    )
    .bind(&req.content)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(post_id = %id, author_id = %author.id, "create_post: post created");

    Ok((
        StatusCode::CREATED,
        Json(Post {
            id,
            content: req.content,
            created_at,
        }),
    ))
}
