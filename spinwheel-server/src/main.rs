use clap::Parser;
use spinwheel_core::{ChainClient, EvmChainClient, MemoryLedger, PaymentWatcher, SpinLedger};
use spinwheel_server::config::DEFAULT_LOG_FILTER;
use spinwheel_server::{router, AppState, ServerArgs};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    let filter = if args.verbose {
        EnvFilter::new("spinwheel=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let game_config = args.game_config()?;
    let chain: Arc<dyn ChainClient> = Arc::new(EvmChainClient::connect(&args.chain_config()).await?);
    let ledger: Arc<dyn SpinLedger> = Arc::new(MemoryLedger::new());
    let state = Arc::new(AppState::new(
        &game_config,
        chain.clone(),
        ledger.clone(),
        args.confirmation_timeout(),
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher = args.watch_interval().map(|interval| {
        info!("Payment watcher polling every {}s", interval.as_secs());
        let watcher = PaymentWatcher::new(chain.clone(), ledger.clone(), state.desk.clone());
        tokio::spawn(async move { watcher.run(interval, shutdown_rx).await })
    });

    let addr = args.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "listening on {addr} (distribution account {}, token {})",
        chain.distribution_address(),
        chain.token_address()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = watcher {
        handle.await?;
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
