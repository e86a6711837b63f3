//! Gas-price gate.
//!
//! Compares the live network gas price to the operator's configured
//! ceiling. The price is read fresh at every decision point; a stale read
//! risks an overpriced transaction.

use ethers::types::U256;
use ethers::utils::parse_units;
use serde::Serialize;

use crate::error::ChainError;
use crate::rpc::ChainGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GasStatus {
    GasTooHigh,
    GasValid,
}

impl std::fmt::Display for GasStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GasStatus::GasTooHigh => "GAS_TOO_HIGH",
            GasStatus::GasValid => "GAS_VALID",
        })
    }
}

/// Compare the current gas price against a decimal gwei ceiling.
pub async fn check_gas_price(
    chain: &dyn ChainGateway,
    max_gas_gwei: &str,
) -> Result<GasStatus, ChainError> {
    let ceiling: U256 = parse_units(max_gas_gwei, "gwei")
        .map_err(|e| ChainError::Config(format!("invalid gas ceiling {max_gas_gwei:?}: {e}")))?
        .into();

    let current = chain.gas_price().await?;
    if current > ceiling {
        Ok(GasStatus::GasTooHigh)
    } else {
        Ok(GasStatus::GasValid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockGateway;

    fn chain_at_50_gwei() -> MockGateway {
        MockGateway {
            gas_price: U256::from(50_000_000_000u64),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn reports_gas_too_high() {
        let chain = chain_at_50_gwei();
        let status = check_gas_price(&chain, "10").await.unwrap();
        assert_eq!(status, GasStatus::GasTooHigh);
    }

    #[tokio::test]
    async fn reports_gas_valid() {
        let chain = chain_at_50_gwei();
        let status = check_gas_price(&chain, "9999").await.unwrap();
        assert_eq!(status, GasStatus::GasValid);
    }

    #[tokio::test]
    async fn ceiling_is_inclusive() {
        let chain = chain_at_50_gwei();
        let status = check_gas_price(&chain, "50").await.unwrap();
        assert_eq!(status, GasStatus::GasValid);
    }

    #[tokio::test]
    async fn fractional_ceilings_parse() {
        let chain = chain_at_50_gwei();
        let status = check_gas_price(&chain, "49.5").await.unwrap();
        assert_eq!(status, GasStatus::GasTooHigh);
    }

    #[tokio::test]
    async fn garbage_ceiling_is_a_config_error() {
        let chain = chain_at_50_gwei();
        let err = check_gas_price(&chain, "not-a-number").await.unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
    }
}
