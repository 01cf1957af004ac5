//! Error-to-response mapping.

use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use commentd_protocol::{DataAccessError, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How data-access failures are turned into HTTP status codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Every failure is a 500, and deleting a missing comment succeeds.
    #[default]
    Uniform,
    /// Malformed ids are 400, missing comments 404, store failures 503.
    Classified,
}

impl ErrorPolicy {
    pub fn status_for(&self, kind: ErrorKind) -> StatusCode {
        match (self, kind) {
            (ErrorPolicy::Uniform, _) => StatusCode::INTERNAL_SERVER_ERROR,
            (ErrorPolicy::Classified, ErrorKind::Malformed) => StatusCode::BAD_REQUEST,
            (ErrorPolicy::Classified, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (ErrorPolicy::Classified, ErrorKind::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether a delete that matched nothing is reported as an error.
    pub fn reports_missing(&self) -> bool {
        matches!(self, ErrorPolicy::Classified)
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Uniform => f.write_str("uniform"),
            ErrorPolicy::Classified => f.write_str("classified"),
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(ErrorPolicy::Uniform),
            "classified" => Ok(ErrorPolicy::Classified),
            other => Err(format!(
                "unknown error policy '{}', expected 'uniform' or 'classified'",
                other
            )),
        }
    }
}

/// JSON body of every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed request, ready to be rendered as `{"error": ...}`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    /// Map a store failure according to `policy`. The message is the
    /// failure's own text, unmodified.
    pub fn from_data_access(err: &DataAccessError, policy: ErrorPolicy) -> Self {
        ApiError::new(policy.status_for(err.kind()), err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
