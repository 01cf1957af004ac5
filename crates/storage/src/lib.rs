//! Comment stores
//!
//! Concrete implementations of [`CommentRepository`]: a persistent document
//! store backed by sled, and an in-memory store with identical semantics.

pub mod memory;
pub mod sled_store;

// Re-export key types
pub use memory::MemoryCommentStore;
pub use sled_store::{SledCommentStore, StorageError};

pub use commentd_protocol::{Comment, CommentId, CommentRepository, DataAccessError};
