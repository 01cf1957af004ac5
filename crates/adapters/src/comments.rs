//! Comment endpoints.
//!
//! `GET /` lists every comment and `DELETE /:id` removes one. The adapter
//! holds no state of its own beyond the injected repository, so concurrent
//! requests are independent and see whatever the store's consistency model
//! gives them.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, MethodRouter};
use axum::{Json, Router};
use commentd_protocol::{Comment, CommentRepository, DataAccessError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ApiError, ErrorPolicy};

/// Confirmation text returned by a successful delete
pub const DELETED_MESSAGE: &str = "Comment deleted";

/// JSON body of a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Translates the comment HTTP operations into repository calls.
#[derive(Clone)]
pub struct CommentEndpointAdapter {
    repository: Arc<dyn CommentRepository>,
    policy: ErrorPolicy,
}

impl CommentEndpointAdapter {
    /// Creates an adapter over `repository` using [`ErrorPolicy::Uniform`].
    pub fn new(repository: Arc<dyn CommentRepository>) -> Self {
        Self {
            repository,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Routes relative to wherever the caller mounts them.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(list_comments))
            .route("/:id", delete(delete_comment))
            .with_state(self)
    }

    /// The list handler alone, for mounting at extra paths such as a base
    /// path with a trailing slash.
    pub fn list_route(&self) -> MethodRouter {
        get(list_comments).with_state(self.clone())
    }

    /// All comments, in store order.
    pub async fn list_comments(&self) -> Result<Vec<Comment>, ApiError> {
        match self.repository.find_all().await {
            Ok(comments) => {
                info!("Listed {} comments", comments.len());
                Ok(comments)
            }
            Err(e) => {
                error!("Failed to list comments: {}", e);
                Err(ApiError::from_data_access(&e, self.policy))
            }
        }
    }

    /// Delete one comment and wait for the store to finish.
    pub async fn delete_comment(&self, id: &str) -> Result<MessageBody, ApiError> {
        let outcome = match self.repository.find_by_id_and_delete(id).await {
            Ok(None) if self.policy.reports_missing() => Err(DataAccessError::NotFound {
                id: id.to_string(),
            }),
            other => other,
        };

        match outcome {
            Ok(deleted) => {
                info!("Deleted comment {} (existed: {})", id, deleted.is_some());
                Ok(MessageBody {
                    message: DELETED_MESSAGE.to_string(),
                })
            }
            Err(e) => {
                error!("Failed to delete comment {}: {}", id, e);
                Err(ApiError::from_data_access(&e, self.policy))
            }
        }
    }
}

async fn list_comments(
    State(adapter): State<CommentEndpointAdapter>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    adapter.list_comments().await.map(Json)
}

async fn delete_comment(
    State(adapter): State<CommentEndpointAdapter>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    adapter.delete_comment(&id).await.map(Json)
}
