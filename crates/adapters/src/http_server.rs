//! HTTP server bootstrap.
//!
//! Builds the store named by [`ServerConfig`], mounts the comment endpoints
//! under the configured base path and serves them until a shutdown signal
//! fires.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use commentd_protocol::CommentRepository;
use commentd_storage::{MemoryCommentStore, SledCommentStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::comments::CommentEndpointAdapter;
use crate::error::ErrorPolicy;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid base path '{path}': {reason}")]
    InvalidBasePath { path: String, reason: String },

    #[error("Database path must not be empty")]
    EmptyDbPath,
}

/// Configuration for the comment HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen_addr: SocketAddr,
    /// Sled database path, ignored when `in_memory` is set
    pub db_path: String,
    /// Prefix the comment routes are mounted under
    pub base_path: String,
    /// Status mapping for failures
    pub error_policy: ErrorPolicy,
    /// Serve from a non-persistent store
    pub in_memory: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            db_path: ".commentd".to_string(),
            base_path: "/api/comments".to_string(),
            error_policy: ErrorPolicy::default(),
            in_memory: false,
        }
    }
}

impl ServerConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidBasePath {
                path: self.base_path.clone(),
                reason: "must start with '/'".to_string(),
            });
        }

        if self.base_path.contains(&['*', ':', '{', '}'][..]) {
            return Err(ConfigError::InvalidBasePath {
                path: self.base_path.clone(),
                reason: "must not contain route parameters or wildcards".to_string(),
            });
        }

        if !self.in_memory && self.db_path.trim().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }

        Ok(())
    }

    /// Base path without trailing slashes; `None` when mounted at the root.
    fn mount_point(&self) -> Option<&str> {
        let trimmed = self.base_path.trim_end_matches('/');
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// The comment HTTP server
pub struct HttpServer {
    config: ServerConfig,
    adapter: CommentEndpointAdapter,
}

impl HttpServer {
    /// Creates a new [`HttpServer`] serving `repository`.
    pub fn new(
        config: ServerConfig,
        repository: Arc<dyn CommentRepository>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let adapter = CommentEndpointAdapter::new(repository).with_error_policy(config.error_policy);
        Ok(Self { config, adapter })
    }

    /// Creates a server backed by the store the configuration names.
    pub fn open(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let repository: Arc<dyn CommentRepository> = if config.in_memory {
            info!("Using in-memory comment store");
            Arc::new(MemoryCommentStore::new())
        } else {
            info!("Opening comment store at {}", config.db_path);
            Arc::new(
                SledCommentStore::open(&config.db_path)
                    .with_context(|| format!("Failed to open database: {}", config.db_path))?,
            )
        };

        Ok(Self::new(config, repository)?)
    }

    /// The full application router.
    pub fn router(&self) -> Router {
        let comments = self.adapter.clone().router();
        match self.config.mount_point() {
            Some(base) => Router::new()
                .nest(base, comments)
                .route(&format!("{}/", base), self.adapter.list_route()),
            None => comments,
        }
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.listen_addr))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!(
            "Serving comments on http://{}{} ({} errors)",
            local_addr,
            self.config.mount_point().unwrap_or(""),
            self.config.error_policy
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use commentd_protocol::{Comment, CommentId};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    fn seeded_store() -> (Arc<MemoryCommentStore>, Comment) {
        let id = CommentId::from_parts(0x65a1_f0c2, [1; 5], 1);
        let comment = Comment::with_id(id, json!({ "text": "a" }).as_object().cloned().unwrap());
        let store = Arc::new(MemoryCommentStore::with_comments([comment.clone()]));
        (store, comment)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.base_path, "/api/comments");
        assert_eq!(config.error_policy, ErrorPolicy::Uniform);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_validation() {
        let config = ServerConfig {
            base_path: "api/comments".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBasePath { .. })
        ));

        let config = ServerConfig {
            base_path: "/api/:thing".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            db_path: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyDbPath));

        let config = ServerConfig {
            db_path: String::new(),
            in_memory: true,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("commentd.json");
        std::fs::write(
            &path,
            r#"{ "listen_addr": "0.0.0.0:8080", "error_policy": "classified" }"#,
        )
        .unwrap();

        let config = ServerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.error_policy, ErrorPolicy::Classified);
        assert_eq!(config.base_path, "/api/comments");

        assert!(ServerConfig::from_json_file(temp_dir.path().join("missing.json")).is_err());
    }

    #[tokio::test]
    async fn test_router_mounts_under_base_path() {
        let (store, comment) = seeded_store();
        let server = HttpServer::new(ServerConfig::default(), store).unwrap();

        let (status, body) = get_json(server.router(), "/api/comments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], comment.id.to_string());

        let (status, _) = get_json(server.router(), "/comments").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_answers_with_and_without_trailing_slash() {
        let (store, comment) = seeded_store();
        let config = ServerConfig {
            base_path: "/api/comments/".to_string(),
            ..Default::default()
        };
        let server = HttpServer::new(config, store).unwrap();

        for uri in ["/api/comments", "/api/comments/"] {
            let (status, body) = get_json(server.router(), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body, json!([{ "id": comment.id.to_string(), "text": "a" }]), "{uri}");
        }

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/comments/{}", comment.id))
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_mounts_at_root() {
        let (store, _) = seeded_store();
        let config = ServerConfig {
            base_path: "/".to_string(),
            ..Default::default()
        };
        let server = HttpServer::new(config, store).unwrap();

        let (status, body) = get_json(server.router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_uses_sled_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig {
            db_path: temp_dir.path().join("db").to_string_lossy().to_string(),
            ..Default::default()
        };

        let server = HttpServer::open(config).unwrap();
        let (status, body) = get_json(server.router(), "/api/comments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        let (store, comment) = seeded_store();
        let server = HttpServer::new(ServerConfig::default(), store).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = stop_rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                format!(
                    "DELETE /api/comments/{} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
                    comment.id, addr
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with(r#"{"message":"Comment deleted"}"#));

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
