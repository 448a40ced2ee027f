//! foliod - sync-folder snapshot agent
//!
//! Binds the HTTP surface and wires the tracker, the sync daemon client and
//! the cloud client together.

use clap::Parser;
use folio_config::Config;
use folio_errors::Error;
use foliod::api;
use foliod::cli::Cli;
use foliod::state::AppState;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        error!("agent error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    info!("starting foliod v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    config.merge_env()?;
    if let Some(host) = cli.host {
        config.agent.host = host;
    }
    if let Some(port) = cli.port {
        config.agent.port = port;
    }

    let bind = format!("{}:{}", config.agent.host, config.agent.port);
    let state = Arc::new(AppState::new(config)?);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "foliod=debug,folio=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutting down");
}
