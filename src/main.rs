//! Checkout gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               CHECKOUT GATEWAY               │
//!     Client Request     │  ┌─────────┐    ┌───────────┐                │
//!     ───────────────────┼─▶│  http   │───▶│ checkout  │                │
//!                        │  │ server  │    │orchestrator│               │
//!                        │  └─────────┘    └─────┬─────┘                │
//!                        │                       │ inventory lease      │
//!                        │                       │ pricing, saga        │
//!                        │                       ▼                      │
//!                        │                ┌────────────┐                │
//!     Client Response    │  ┌─────────┐   │ downstream │───────────────┼──▶ Product
//!     ◀──────────────────┼──│response │◀──│  clients   │───────────────┼──▶ Order
//!                        │  │translate│   └────────────┘───────────────┼──▶ Payment
//!                        │  └─────────┘                                 │
//!                        │  config · observability · lifecycle          │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use checkout_gateway::config::{load_config, load_from_env};
use checkout_gateway::lifecycle::startup;
use checkout_gateway::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "checkout-gateway", version, about = "E-commerce checkout gateway")]
struct Cli {
    /// Path to a TOML config file. Defaults plus environment overrides when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("checkout-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "checkout-gateway starting"
    );

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
