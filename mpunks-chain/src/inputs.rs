//! Mining-input snapshots for local miners.
//!
//! Advisory data only: miners use it to compose candidate nonces, it is
//! never consulted for submission decisions, so serving it from a
//! short-lived cache is safe.

use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::Serialize;

use crate::error::ChainError;
use crate::rpc::ChainGateway;
use crate::seed::last_72_address_bits;

/// Snapshot of everything a miner needs to search for nonces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningInputs {
    pub last_mined_assets: String,
    pub sender_address_bits: String,
    pub sender_address: String,
    pub difficulty_target: String,
}

/// Assemble a fresh snapshot for `sender`.
pub async fn get_mining_inputs(
    chain: &dyn ChainGateway,
    sender: Address,
) -> Result<MiningInputs, ChainError> {
    let last_mined_assets = chain.last_mined_punk_assets().await?;
    let difficulty_target = chain.difficulty_target().await?;
    let address_bits = last_72_address_bits(sender);

    Ok(MiningInputs {
        last_mined_assets: format!("{last_mined_assets:#x}"),
        sender_address_bits: format!("{address_bits:#x}"),
        sender_address: to_checksum(&sender, None),
        difficulty_target: format!("{difficulty_target:#x}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockGateway;
    use ethers::types::U256;

    #[tokio::test]
    async fn snapshot_carries_hex_fields_and_checksum_address() {
        let chain = MockGateway {
            last_mined_assets: U256::from(0x60u64),
            ..Default::default()
        };
        let sender: Address = "0x0102030405060708090a0b0c0d0e0f1011121314"
            .parse()
            .unwrap();

        let inputs = get_mining_inputs(&chain, sender).await.unwrap();

        assert_eq!(inputs.last_mined_assets, "0x60");
        assert_eq!(inputs.sender_address_bits, "0xc0d0e0f1011121314");
        assert!(inputs.sender_address.starts_with("0x"));
        assert_eq!(
            inputs.sender_address.to_lowercase(),
            "0x0102030405060708090a0b0c0d0e0f1011121314"
        );
    }

    #[tokio::test]
    async fn serializes_with_camel_case_keys() {
        let chain = MockGateway::default();
        let inputs = get_mining_inputs(&chain, Address::zero()).await.unwrap();
        let value = serde_json::to_value(&inputs).unwrap();

        assert!(value.get("lastMinedAssets").is_some());
        assert!(value.get("senderAddressBits").is_some());
        assert!(value.get("difficultyTarget").is_some());
    }
}
