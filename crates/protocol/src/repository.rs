//! The data-access collaborator consumed by the HTTP adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::comment::Comment;
use crate::errors::DataAccessError;

/// Read and delete access to stored comments.
///
/// Implementations own identifier validation, connection handling and any
/// consistency guarantees between concurrent calls.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Every stored comment, in the store's default order.
    async fn find_all(&self) -> Result<Vec<Comment>, DataAccessError>;

    /// Delete the comment addressed by `id`, returning it if it existed.
    ///
    /// `id` is the raw caller-supplied string. A value that is not a valid
    /// identifier yields [`DataAccessError::MalformedId`]; a well-formed id
    /// with no matching record yields `Ok(None)`.
    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Comment>, DataAccessError>;
}

#[async_trait]
impl<T: CommentRepository + ?Sized> CommentRepository for Arc<T> {
    async fn find_all(&self) -> Result<Vec<Comment>, DataAccessError> {
        (**self).find_all().await
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Comment>, DataAccessError> {
        (**self).find_by_id_and_delete(id).await
    }
}
