//! HTTP API over the post store: create, list, get by id, delete by id.
//!
//! The binary in `src/bin/posts_api.rs` builds the store from configuration
//! and serves `router`.

mod handlers;

use crate::store::PostStore;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where `GET /` redirects.
pub const DOCS_PATH: &str = "/docs";

// ============================================================================
// Application state
// ============================================================================

pub struct AppState {
    pub(crate) store: Arc<dyn PostStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponseBody {
    pub error: String,
    pub code: u16,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Post with ID {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(e) = &self {
            tracing::error!(error = %format!("{e:#}"), "Store operation failed");
        }
        let body = ErrorResponseBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Routing
// ============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(DOCS_PATH, get(handlers::docs))
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/{post_id}", get(handlers::find_post).delete(handlers::delete_post))
        .with_state(state)
}
