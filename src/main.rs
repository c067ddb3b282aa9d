//! ops-logger
//!
//! A minimal HTTP service whose access and application logs go through a
//! dual-channel, disk-rotating logger, with error records escalated to an
//! external notification endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http (axum) ──▶ handler
//!                      │   │
//!          access line │   │ error / panic
//!                      ▼   ▼
//!                 ┌──────────────────────────────────────┐
//!                 │               logging                │
//!                 │  http channel        app channel     │
//!                 │  console             console         │
//!                 │  request.<d>.log     server.<d>.log  │
//!                 │                      error.<d>.log   │
//!                 └──────────────────┬───────────────────┘
//!                                    │ error records
//!                                    ▼
//!                              escalation ──▶ notify ──▶ external endpoint
//!                                    ▲           │
//!                                    └───────────┘ failure, logged once, suppressed
//! ```

use std::path::PathBuf;

use clap::Parser;

use ops_logger::lifecycle::{self, StartupOptions};

#[derive(Parser, Debug)]
#[command(name = "ops-logger", version, about = "HTTP service with rotating logs and failure notifications")]
struct Cli {
    /// TOML configuration file; defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 127.0.0.1:3000).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    lifecycle::run(StartupOptions {
        config_path: cli.config,
        bind_address: cli.bind,
    })
    .await?;
    Ok(())
}
