//! Dropfront storefront binary.

use dropfront::mint::RpcSubmitter;
use dropfront::queries::SnapshotQueries;
use dropfront::rpc::RpcClient;
use dropfront::{create_router, AppState, Config};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dropfront");

    let config: Config = config::Config::builder()
        .add_source(config::File::with_name("dropfront").required(false))
        .add_source(config::Environment::with_prefix("DROPFRONT"))
        .build()
        .and_then(|c| c.try_deserialize())
        .unwrap_or_else(|e| {
            // Fall back only when no config exists; parsing errors fail hard.
            let err_str = format!("{e}");
            if err_str.contains("not found") || err_str.contains("missing field") {
                warn!(error = %e, "No config file found, using defaults");
                Config::default()
            } else {
                error!(error = %e, "FATAL: Config error, fix env vars or dropfront.toml");
                std::process::exit(1);
            }
        });

    if config.default_contract.is_none() {
        warn!("No default contract; page requests must carry ?contract=");
    }
    info!(
        rpc = %config.rpc_url,
        mint_contract = %config.mint_contract,
        snapshot = %config.snapshot_path,
        "Configuration loaded"
    );

    let rpc = Arc::new(RpcClient::new(&config.rpc_url, &config.fallback_rpc_url));
    let queries = Arc::new(SnapshotQueries::new(
        config.snapshot_path.clone().into(),
        Arc::clone(&rpc),
    ));
    let submitter = Arc::new(RpcSubmitter::new(
        Arc::clone(&rpc),
        Duration::from_secs(config.receipt_timeout_secs),
    ));

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config, rpc, queries, submitter)?);

    let cancel = CancellationToken::new();
    let poller = tokio::spawn(
        Arc::clone(&state.cache).run_poller(Arc::clone(&state.queries), cancel.clone()),
    );

    let app = create_router(Arc::clone(&state));

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping read poller...");
    cancel.cancel();
    if let Err(e) = poller.await {
        error!(error = %e, "Read poller task failed");
    }

    info!("Dropfront shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
