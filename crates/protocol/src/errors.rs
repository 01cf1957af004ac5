//! Data-access errors

use thiserror::Error;

/// Failures reported by a comment store.
#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error(
        "Cast to ObjectId failed for value \"{value}\" (type string) at path \"_id\" for model \"{model}\"",
        model = crate::MODEL_NAME
    )]
    MalformedId { value: String },

    #[error("Comment not found: {id}")]
    NotFound { id: String },

    #[error("Data store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Corrupt comment record: {reason}")]
    Corrupt { reason: String },

    #[error("Serialization error: {source}")]
    Serialization { source: serde_json::Error },
}

/// Coarse classification of a [`DataAccessError`].
///
/// Callers that want to tell "bad request" apart from "missing" and from
/// "store is broken" match on this instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Malformed,
    Unavailable,
}

impl DataAccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataAccessError::MalformedId { .. } => ErrorKind::Malformed,
            DataAccessError::NotFound { .. } => ErrorKind::NotFound,
            DataAccessError::Unavailable { .. }
            | DataAccessError::Corrupt { .. }
            | DataAccessError::Serialization { .. } => ErrorKind::Unavailable,
        }
    }

    pub fn malformed_id(value: impl Into<String>) -> Self {
        DataAccessError::MalformedId {
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for DataAccessError {
    fn from(err: serde_json::Error) -> Self {
        DataAccessError::Serialization { source: err }
    }
}
