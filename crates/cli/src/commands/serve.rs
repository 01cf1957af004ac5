//! Serve command implementation
//!
//! This module implements the `commentd serve` command: it layers command
//! line overrides on top of an optional JSON config file and runs the HTTP
//! server until Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use commentd_adapters::{ErrorPolicy, HttpServer, ServerConfig};
use tokio::signal;
use tracing::{error, info};

/// Arguments for the serve command
pub struct ServeArgs {
    /// JSON config file
    pub config: Option<String>,
    /// Port to listen on
    pub port: Option<u16>,
    /// Local database path
    pub db: Option<String>,
    /// Route prefix
    pub base_path: Option<String>,
    /// Failure status mapping
    pub error_policy: Option<ErrorPolicy>,
    /// Serve from memory
    pub in_memory: bool,
}

/// Execute the serve command
pub async fn execute_serve_command(args: ServeArgs) -> Result<()> {
    let config = build_config(args)?;

    println!("🌐 Starting commentd...");
    if config.in_memory {
        println!("📁 Store: in-memory");
    } else {
        println!("📁 Database: {}", config.db_path);
    }
    println!("🔌 Listening: {}", config.listen_addr);
    println!("🧭 Routes: {}", config.base_path);
    println!();

    let server = HttpServer::open(config).context("Failed to create HTTP server")?;

    server
        .run(wait_for_shutdown())
        .await
        .context("Failed to run HTTP server")?;

    println!("✅ Shutdown complete");
    Ok(())
}

/// Resolve the effective configuration: file (or defaults), then flags.
pub fn build_config(args: ServeArgs) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_json_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(port) = args.port {
        config.listen_addr = SocketAddr::new(config.listen_addr.ip(), port);
    }
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(base_path) = args.base_path {
        config.base_path = base_path;
    }
    if let Some(policy) = args.error_policy {
        config.error_policy = policy;
    }
    if args.in_memory {
        config.in_memory = true;
    }

    config
        .validate()
        .with_context(|| format!("Invalid configuration for {}", config.listen_addr))?;

    info!("Resolved server configuration: {:?}", config);
    Ok(config)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
