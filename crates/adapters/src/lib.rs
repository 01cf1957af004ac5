//! HTTP adapter for comments
//!
//! This crate bridges HTTP requests to a [`commentd_protocol::CommentRepository`].
//! [`CommentEndpointAdapter`] owns the request/response mapping and
//! [`HttpServer`] mounts it and runs the listener.

pub mod comments;
pub mod error;
pub mod http_server;

pub use comments::{CommentEndpointAdapter, MessageBody, DELETED_MESSAGE};
pub use error::{ApiError, ErrorBody, ErrorPolicy};
pub use http_server::{ConfigError, HttpServer, ServerConfig};
