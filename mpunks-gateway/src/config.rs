//! Gateway configuration.
//!
//! One immutable struct loaded from the environment at startup. Missing
//! required variables and unacknowledged license/risk flags are fatal:
//! the process refuses to serve.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;

/// The port the miner tooling expects by default.
pub const DEFAULT_PORT: u16 = 17394;

/// Wallet address variable for read-only operation, kept name-compatible
/// with the original tooling's .env files.
pub const WALLET_ADDRESS_ENV: &str = "ONLY_NEEDED_IF_NOT_INCLUDING_PRIVATE_KEY_WALLET_ADDRESS";

const REQUIRED_ENV_VARIABLES: &[&str] = &[
    "WEB3_HOST",
    "PORT",
    "MINEABLE_PUNKS_ADDR",
    "PUBLIC_CRYPTOPUNKS_DATA_ADDR",
    "OTHERPUNKS_ADDR",
    "MAX_GAS_PRICE_GWEI",
    "ACCEPT_MAX_GAS_PRICE_GWEI_VALUE",
    "ACCEPT_LICENSE",
    "READ_NOTICE",
];

const LICENSE_ENV_VARIABLES: &[&str] = &[
    "ACCEPT_LICENSE",
    "READ_NOTICE",
    "ACCEPT_MAX_GAS_PRICE_GWEI_VALUE",
];

/// Gateway configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// HTTP listen port.
    pub port: u16,
    /// Mining contract address.
    pub mineable_punks_addr: Address,
    /// Legacy asset-registry contract address.
    pub public_cryptopunks_data_addr: Address,
    /// Asset-seed contract address.
    pub otherpunks_addr: Address,
    /// Gas ceiling as a decimal gwei string.
    pub max_gas_price_gwei: String,
    /// Signing key; submission endpoints and pooled mode need it.
    pub private_key: Option<String>,
    /// Read-only wallet address when no key is configured.
    pub wallet_address: Option<Address>,
    /// Whether to run the pooled-miner watcher.
    pub poll_pooled_results: bool,
    /// Pooled result feed URL.
    pub pooled_result_url: Option<String>,
    /// Watcher sleep between cycles.
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        for var in REQUIRED_ENV_VARIABLES {
            match env::var(var) {
                Ok(value) if !value.is_empty() => {}
                _ => bail!("required environment variable {var} is missing from .env.local"),
            }
        }

        for var in LICENSE_ENV_VARIABLES {
            if env::var(var).as_deref() != Ok("true") {
                bail!(
                    "must read the LICENSE and NOTICE files and inspect the default \
                     MAX_GAS_PRICE_GWEI, and IF YOU ACCEPT, set {} to \"true\" in .env.local",
                    LICENSE_ENV_VARIABLES.join(", ")
                );
            }
        }

        let rpc_url = env::var("WEB3_HOST").context("WEB3_HOST must be set")?;

        let port: u16 = env::var("PORT")
            .context("PORT must be set")?
            .parse()
            .context("PORT must be a valid port number")?;

        let mineable_punks_addr = parse_address("MINEABLE_PUNKS_ADDR")?;
        let public_cryptopunks_data_addr = parse_address("PUBLIC_CRYPTOPUNKS_DATA_ADDR")?;
        let otherpunks_addr = parse_address("OTHERPUNKS_ADDR")?;

        let max_gas_price_gwei =
            env::var("MAX_GAS_PRICE_GWEI").context("MAX_GAS_PRICE_GWEI must be set")?;

        let private_key = env::var("PRIVATE_KEY").ok().filter(|k| !k.is_empty());

        let wallet_address = match env::var(WALLET_ADDRESS_ENV) {
            Ok(raw) if !raw.is_empty() => Some(
                raw.parse::<Address>()
                    .with_context(|| format!("{WALLET_ADDRESS_ENV} is not a valid address"))?,
            ),
            _ => None,
        };

        let poll_pooled_results =
            env::var("POLL_POOLED_MINER_RESULTS").as_deref() == Ok("true");

        let pooled_result_url = env::var("POOLED_MINER_RESULT_URL").ok().filter(|u| !u.is_empty());
        if poll_pooled_results && pooled_result_url.is_none() {
            bail!("POOLED_MINER_RESULT_URL must be set when POLL_POOLED_MINER_RESULTS is true");
        }

        let poll_interval_secs: u64 = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            rpc_url,
            port,
            mineable_punks_addr,
            public_cryptopunks_data_addr,
            otherpunks_addr,
            max_gas_price_gwei,
            private_key,
            wallet_address,
            poll_pooled_results,
            pooled_result_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }

    /// The address requests are evaluated for: the signing wallet when a
    /// key is configured, otherwise the read-only wallet address.
    pub fn sender_address(&self) -> Result<Address> {
        if let Some(ref key) = self.private_key {
            let wallet: LocalWallet = key.parse().context("PRIVATE_KEY is not a valid key")?;
            return Ok(wallet.address());
        }
        self.wallet_address.with_context(|| {
            format!("PRIVATE_KEY or {WALLET_ADDRESS_ENV} must be set to use this endpoint")
        })
    }
}

fn parse_address(var: &str) -> Result<Address> {
    env::var(var)
        .with_context(|| format!("{var} must be set"))?
        .parse::<Address>()
        .with_context(|| format!("{var} is not a valid address"))
}
