//! Pooled-miner result watcher.
//!
//! Polls the pool's result feed for the single most-recent record and,
//! when it belongs to the operating wallet, drives the gas gate and mint
//! submission. The watcher trusts the feed's `success` flag instead of
//! re-running nonce validation; if the feed misreports, an invalid nonce
//! would be submitted. That trade-off is inherited from the pool's own
//! validation guarantees.
//!
//! The loop never exits: a failed cycle is logged and the next one starts
//! after the fixed sleep.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, U256};
use serde::Deserialize;
use tracing::{debug, info, warn};

use mpunks_chain::{check_gas_price, submit_mint, ChainError, ChainGateway, GasStatus};

use crate::parse_nonce;

/// Latest record published by the pool.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolResult {
    pub address: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub success: bool,
    pub nonce: String,
    #[serde(default)]
    pub ts: Option<serde_json::Value>,
}

/// Source of pooled results.
#[async_trait]
pub trait PoolFeed: Send + Sync {
    /// Fetch the single most-recent result.
    async fn latest(&self) -> Result<PoolResult, ChainError>;
}

/// HTTP feed returning the latest result as JSON.
pub struct HttpPoolFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpPoolFeed {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl PoolFeed for HttpPoolFeed {
    async fn latest(&self) -> Result<PoolResult, ChainError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ChainError::Feed(e.to_string()))?;
        response
            .json::<PoolResult>()
            .await
            .map_err(|e| ChainError::Feed(format!("malformed pool result: {e}")))
    }
}

/// Long-running watcher for one wallet's pooled results.
pub struct PoolWatcher {
    feed: Box<dyn PoolFeed>,
    chain: Arc<dyn ChainGateway>,
    wallet: Address,
    max_gas_gwei: String,
    poll_interval: Duration,
    /// Nonces already sent for minting in this process run.
    submitted: HashSet<U256>,
}

impl PoolWatcher {
    pub fn new(
        feed: Box<dyn PoolFeed>,
        chain: Arc<dyn ChainGateway>,
        wallet: Address,
        max_gas_gwei: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            feed,
            chain,
            wallet,
            max_gas_gwei,
            poll_interval,
            submitted: HashSet::new(),
        }
    }

    /// Run forever. Cycle failures are logged and the loop continues.
    pub async fn run(mut self) {
        info!(wallet = ?self.wallet, "starting pooled-miner watcher");
        loop {
            if let Err(e) = self.cycle().await {
                warn!("pool cycle failed: {e}");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One poll cycle: fetch, filter, gate, submit.
    pub async fn cycle(&mut self) -> Result<(), ChainError> {
        let last = self.feed.latest().await?;
        debug!(last_address = %last.address, "polled pooled miner results");

        let Ok(result_address) = last.address.parse::<Address>() else {
            debug!(address = %last.address, "feed record has an unparseable address");
            return Ok(());
        };
        if result_address != self.wallet || last.error.is_some() || !last.success {
            return Ok(());
        }

        let nonce = parse_nonce(&last.nonce)?;
        if self.submitted.contains(&nonce) {
            return Ok(());
        }
        info!(%nonce, "pool found a valid nonce, will mint it if gas price allows");

        let gas_status = check_gas_price(self.chain.as_ref(), &self.max_gas_gwei).await?;
        if gas_status == GasStatus::GasTooHigh {
            // Leave the nonce unrecorded: it stays eligible once gas drops,
            // as long as it is still the latest feed result.
            info!(
                max_gas_gwei = %self.max_gas_gwei,
                "gas price is above the configured ceiling, waiting to submit"
            );
            return Ok(());
        }

        // Record before dispatching so a raced duplicate cannot submit twice.
        self.submitted.insert(nonce);
        let tx_hash = submit_mint(self.chain.as_ref(), nonce).await?;
        info!(%nonce, ?tx_hash, "pooled mint submitted");
        Ok(())
    }
}
