//! mpunks-gateway
//!
//! HTTP gateway for mineable punks miners plus the optional pooled-miner
//! watcher. Startup refuses to serve on configuration errors but keeps
//! the console alive so the operator can read what went wrong.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ethers::utils::format_ether;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mpunks_chain::{ChainGateway, ContractAddresses, EthersGateway, LegacyPunkIndex};
use mpunks_gateway::config::{Config, DEFAULT_PORT};
use mpunks_gateway::pool::{HttpPoolFeed, PoolWatcher};
use mpunks_gateway::{app_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mpunks_gateway=info,mpunks_chain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        error!("failed to start gateway: {e:#}");
        info!("keeping the console up so the error stays visible; close whenever");
        loop {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }
}

async fn run() -> anyhow::Result<()> {
    info!("initializing...");
    let config = Config::from_env()?;

    if config.port != DEFAULT_PORT {
        warn!(
            port = config.port,
            "PORT has been changed from the default of {DEFAULT_PORT}"
        );
    }

    let addresses = ContractAddresses {
        mineable_punks: config.mineable_punks_addr,
        otherpunks: config.otherpunks_addr,
        public_cryptopunks_data: config.public_cryptopunks_data_addr,
    };
    let gateway =
        EthersGateway::connect(&config.rpc_url, addresses, config.private_key.as_deref()).await?;

    if let Some(wallet) = gateway.signer_address() {
        info!("fetching wallet balance as a startup probe...");
        let wei = gateway.balance(wallet).await?;
        info!(wallet = ?wallet, balance_eth = %format_ether(wei), "wallet balance");
    }

    let sender = config.sender_address().ok();
    let can_sign = config.private_key.is_some();
    let chain: Arc<dyn ChainGateway> = Arc::new(gateway);

    if config.poll_pooled_results {
        let url = config
            .pooled_result_url
            .clone()
            .context("POOLED_MINER_RESULT_URL must be set when POLL_POOLED_MINER_RESULTS is true")?;
        if !can_sign {
            anyhow::bail!("PRIVATE_KEY must be set to poll pooled miner results");
        }
        let wallet = sender.context("PRIVATE_KEY must be set to poll pooled miner results")?;

        let watcher = PoolWatcher::new(
            Box::new(HttpPoolFeed::new(url)),
            chain.clone(),
            wallet,
            config.max_gas_price_gwei.clone(),
            config.poll_interval,
        );
        tokio::spawn(watcher.run());
    }

    let state = AppState::new(
        chain,
        Arc::new(LegacyPunkIndex::bundled().clone()),
        sender,
        can_sign,
        config.max_gas_price_gwei.clone(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    info!("shutdown signal received");
}
