//! mpunks-chain
//!
//! Core library for the mineable punks miner gateway: typed access to the
//! three on-chain contracts, the nonce validity pipeline, the gas-price
//! gate and mint submission.
//!
//! Everything that talks to the chain goes through the [`ChainGateway`]
//! trait so the validation and submission logic can be exercised against
//! a scripted gateway in tests.

pub mod assets;
pub mod error;
pub mod gas;
pub mod inputs;
pub mod mint;
pub mod nonce;
pub mod rpc;
pub mod seed;

pub use assets::LegacyPunkIndex;
pub use error::ChainError;
pub use gas::{check_gas_price, GasStatus};
pub use inputs::{get_mining_inputs, MiningInputs};
pub use mint::{submit_mint, FOUNDER_MINT_GAS_LIMIT, STANDARD_MINT_GAS_LIMIT};
pub use nonce::{check_nonce, NonceStatus};
pub use rpc::{ChainGateway, ContractAddresses, EthersGateway};

#[cfg(test)]
pub(crate) mod test_util;
