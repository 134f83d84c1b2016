use super::{ApiError, AppState, DOCS_PATH};
use crate::store::{Post, LIST_LIMIT};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// GET /
pub(super) async fn root() -> Redirect {
    Redirect::temporary(DOCS_PATH)
}

/// GET /docs
///
/// Route listing plus an example payload.
pub(super) async fn docs() -> Json<Value> {
    Json(json!({
        "title": "posts",
        "routes": [
            { "method": "POST", "path": "/posts/", "description": "Create a new Post entry", "status": 201 },
            { "method": "GET", "path": "/posts/", "description": format!("List up to {LIST_LIMIT} posts"), "status": 200 },
            { "method": "GET", "path": "/posts/{post_id}", "description": "Get a single post by id", "status": 200 },
            { "method": "DELETE", "path": "/posts/{post_id}", "description": "Delete a post", "status": 204 },
        ],
        "example": {
            "post_id": "uj4z1w",
            "title": "...",
            "subreddit": "news",
            "author": "...",
            "created_utc": "2022-05-01 22:40:41",
            "domain": "nytimes.com",
            "url": "...",
            "num_comments": 10,
            "selftext": "...",
            "score": 10,
            "url_content": "..."
        }
    }))
}

/// POST /posts/
///
/// The payload is checked against the `Post` schema before the store is
/// touched; any rejection (syntax, missing field, content type) is a 422.
pub(super) async fn create_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Post>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let Json(post) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected post payload");
        ApiError::Validation(rejection.body_text())
    })?;

    let stored = state.store.insert(post).await?;
    info!(post_id = %stored.post.post_id, id = %stored.id, "Created post");
    Ok((StatusCode::CREATED, Json(stored.post)))
}

/// GET /posts/
pub(super) async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.store.list(LIST_LIMIT).await?;
    Ok(Json(posts.into_iter().map(|p| p.post).collect()))
}

/// GET /posts/{post_id}
pub(super) async fn find_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    match state.store.find_by_post_id(&post_id).await? {
        Some(stored) => Ok(Json(stored.post)),
        None => Err(ApiError::NotFound(post_id)),
    }
}

/// DELETE /posts/{post_id}
pub(super) async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_by_post_id(&post_id).await? {
        info!(post_id = %post_id, "Deleted post");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(post_id))
    }
}
