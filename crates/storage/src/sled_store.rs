//! Persistent comment storage
//!
//! Comments live in a single sled tree keyed by the 12 raw id bytes, so
//! iteration order is id order, which is creation order for ids minted by
//! this crate.

use std::path::Path;

use async_trait::async_trait;
use commentd_protocol::{Comment, CommentId, CommentRepository, DataAccessError};
use serde_json::{Map, Value};
use sled::{Db, IVec, Tree};
use thiserror::Error;
use tracing::debug;

const COMMENTS_TREE: &str = "comments";

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {source}")]
    DatabaseError { source: sled::Error },

    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("Serialization error: {source}")]
    SerializationError { source: serde_json::Error },
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::DatabaseError { source: err }
    }
}

impl From<StorageError> for DataAccessError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DatabaseError { source } => DataAccessError::Unavailable {
                reason: source.to_string(),
            },
            StorageError::InvalidRecord { reason } => DataAccessError::Corrupt { reason },
            StorageError::SerializationError { source } => {
                DataAccessError::Serialization { source }
            }
        }
    }
}

/// Comment store persisted with sled
///
/// Cloning is cheap; clones share the same database handle.
#[derive(Clone)]
pub struct SledCommentStore {
    /// Main database
    db: Db,
    /// Comments tree (id bytes -> JSON record)
    comments: Tree,
}

impl SledCommentStore {
    /// Create or open a store at the given database path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let db = sled::open(db_path)?;
        Self::from_db(db)
    }

    /// Open a throwaway store that is deleted when dropped
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StorageError> {
        let comments = db.open_tree(COMMENTS_TREE)?;
        Ok(SledCommentStore { db, comments })
    }

    /// Insert a new comment with a freshly minted id
    pub fn insert(&self, fields: Map<String, Value>) -> Result<Comment, StorageError> {
        let comment = Comment::new(fields);
        self.insert_with_id(&comment)?;
        Ok(comment)
    }

    /// Store a comment under its own id, replacing any existing record
    pub fn insert_with_id(&self, comment: &Comment) -> Result<(), StorageError> {
        let json = serde_json::to_vec(comment)
            .map_err(|e| StorageError::SerializationError { source: e })?;

        self.comments.insert(comment.id.as_bytes(), json)?;
        self.db.flush()?;

        debug!("Stored comment {}", comment.id);
        Ok(())
    }

    /// Get a comment by id
    pub fn get(&self, id: &CommentId) -> Result<Option<Comment>, StorageError> {
        match self.comments.get(id.as_bytes())? {
            Some(bytes) => decode_record(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// All comments in key order
    pub fn all(&self) -> Result<Vec<Comment>, StorageError> {
        let mut comments = Vec::new();

        for result in self.comments.iter() {
            let (_, bytes) = result?;
            comments.push(decode_record(&bytes)?);
        }

        Ok(comments)
    }

    /// Remove a comment, returning it if present
    pub fn remove(&self, id: &CommentId) -> Result<Option<Comment>, StorageError> {
        let removed = match self.comments.remove(id.as_bytes())? {
            Some(bytes) => Some(decode_record(&bytes)?),
            None => None,
        };

        self.db.flush()?;
        Ok(removed)
    }

    /// Number of stored comments
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Run `op` on the blocking thread pool so sled scans and flushes do
    /// not stall async workers.
    async fn blocking<T, F>(&self, op: F) -> Result<T, DataAccessError>
    where
        T: Send + 'static,
        F: FnOnce(SledCommentStore) -> Result<T, StorageError> + Send + 'static,
    {
        let store = self.clone();
        let result = tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| DataAccessError::Unavailable {
                reason: format!("Storage task failed: {}", e),
            })?;
        Ok(result?)
    }

    #[cfg(test)]
    fn insert_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.comments.insert(key, value)?;
        Ok(())
    }
}

fn decode_record(bytes: &IVec) -> Result<Comment, StorageError> {
    let json = std::str::from_utf8(bytes).map_err(|_| StorageError::InvalidRecord {
        reason: "Invalid UTF-8 in comment data".to_string(),
    })?;

    serde_json::from_str(json).map_err(|e| StorageError::SerializationError { source: e })
}

#[async_trait]
impl CommentRepository for SledCommentStore {
    async fn find_all(&self) -> Result<Vec<Comment>, DataAccessError> {
        self.blocking(|store| store.all()).await
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Comment>, DataAccessError> {
        let id = CommentId::parse(id)?;
        self.blocking(move |store| store.remove(&id)).await
    }
}
