//! In-memory comment store

use std::collections::BTreeMap;

use async_trait::async_trait;
use commentd_protocol::{Comment, CommentId, CommentRepository, DataAccessError};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// Comment store held entirely in memory.
///
/// Ordering and identifier rules match [`crate::SledCommentStore`].
#[derive(Default)]
pub struct MemoryCommentStore {
    comments: RwLock<BTreeMap<CommentId, Comment>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `comments`
    pub fn with_comments(comments: impl IntoIterator<Item = Comment>) -> Self {
        let comments = comments.into_iter().map(|c| (c.id, c)).collect();
        MemoryCommentStore {
            comments: RwLock::new(comments),
        }
    }

    pub async fn insert(&self, fields: Map<String, Value>) -> Comment {
        let comment = Comment::new(fields);
        self.insert_with_id(comment.clone()).await;
        comment
    }

    pub async fn insert_with_id(&self, comment: Comment) {
        self.comments.write().await.insert(comment.id, comment);
    }

    pub async fn len(&self) -> usize {
        self.comments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.comments.read().await.is_empty()
    }
}

#[async_trait]
impl CommentRepository for MemoryCommentStore {
    async fn find_all(&self) -> Result<Vec<Comment>, DataAccessError> {
        Ok(self.comments.read().await.values().cloned().collect())
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Comment>, DataAccessError> {
        let id = CommentId::parse(id)?;
        Ok(self.comments.write().await.remove(&id))
    }
}
