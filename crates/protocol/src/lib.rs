//! Commentd protocol types
//!
//! This crate defines the comment record, its document identifier, and the
//! data-access contract that the HTTP adapter consumes. Concrete stores live
//! in `commentd-storage`.

pub mod comment;
pub mod errors;
pub mod repository;

pub use comment::{Comment, CommentId};
pub use errors::{DataAccessError, ErrorKind};
pub use repository::CommentRepository;

/// Name of the document model, as it appears in store error messages
pub const MODEL_NAME: &str = "Comment";
