//! # MemoryDB Server
//!
//! Serve the person record store over a line-oriented TCP protocol.
//!
//! ## Design Principles
//!
//! 1. **Single Responsibility**: Framing, parsing and dispatch are isolated in modules.
//! 2. **Async First**: Tokio handles concurrent connections efficiently.
//! 3. **Contained Failures**: Client and transport errors are localized to the connection.
//! 4. **Graceful Exit**: Ctrl-C or SIGTERM warns clients and drains before exiting.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use mdb_engine::MemoryStore;
use mdb_server::{Server, cli::Cli};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.server_config();

    let store = Arc::new(MemoryStore::new());
    let server = Server::start(config, store)
        .with_context(|| format!("failed to start server on {}", cli.listen))?;

    server.run_until(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = ?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
