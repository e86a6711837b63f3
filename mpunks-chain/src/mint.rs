//! Mint submission.
//!
//! Callers must have just re-checked [`crate::NonceStatus`] and
//! [`crate::GasStatus`]; this module only picks the gas limit and
//! dispatches. `numMined` is read again here because it may have advanced
//! since validation, and founder-slot mints need more gas.

use ethers::types::{TxHash, U256};
use tracing::info;

use crate::error::ChainError;
use crate::rpc::ChainGateway;
use crate::seed::is_founder_slot;

/// Gas limit for a founder-slot mint (every 33rd), which also writes the
/// derived asset set.
pub const FOUNDER_MINT_GAS_LIMIT: u64 = 1_400_000;

/// Gas limit for an ordinary mint.
pub const STANDARD_MINT_GAS_LIMIT: u64 = 700_000;

/// Broadcast a mint for `nonce` and return the transaction hash without
/// waiting for confirmation.
pub async fn submit_mint(chain: &dyn ChainGateway, nonce: U256) -> Result<TxHash, ChainError> {
    let num_mined = chain.num_mined().await?;
    let gas_limit = if is_founder_slot(num_mined) {
        FOUNDER_MINT_GAS_LIMIT
    } else {
        STANDARD_MINT_GAS_LIMIT
    };

    let tx_hash = chain.mint(nonce, U256::from(gas_limit)).await?;
    info!(%nonce, ?tx_hash, gas_limit, "submitted mint transaction");
    Ok(tx_hash)
}
