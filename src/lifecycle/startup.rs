//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize diagnostics, metrics, notifier and logger in that order
//! - Bind the listener last, so traffic only arrives when logging is ready
//! - On shutdown: drain the server, then give notifications a bounded wait
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A missing notification URL is not a startup error; it is reported
//!   each time a notification is attempted

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, load_from_env, ConfigError, ServiceConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::logging::{ErrorEvent, ErrorOptions, Logger, LoggerError};
use crate::notify::{NotifyClient, NotifyError};
use crate::observability;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logger: {0}")]
    Logger(#[from] LoggerError),

    #[error("notifier: {0}")]
    Notify(#[from] NotifyError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
}

/// Resolve the configuration: file (if any), then environment, then CLI.
pub fn resolve_config(options: &StartupOptions) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = &options.bind_address {
        config.listener.bind_address = bind.clone();
    }
    Ok(config)
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = resolve_config(&options)?;

    observability::tracing::init_tracing(&config.observability.log_level);
    tracing::info!("ops-logger v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let notifier = NotifyClient::new(&config.notify)?;
    if notifier.url().is_none() {
        tracing::warn!("No notification URL configured; error notifications will fail");
    }
    let logger = Logger::from_config(&config.logging, Arc::new(notifier))?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        log_dir = %config.logging.dir,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    let grace = Duration::from_secs(config.notify.shutdown_grace_secs);

    let server = HttpServer::new(config, logger.clone());
    if let Err(e) = server.run(listener, shutdown.signalled()).await {
        logger.error(
            ErrorEvent::new("HTTP server failed").with_source(&e),
            ErrorOptions::default(),
        );
    }

    let abandoned = logger.shutdown(grace).await;
    tracing::info!(abandoned, "Shutdown complete");
    Ok(())
}
