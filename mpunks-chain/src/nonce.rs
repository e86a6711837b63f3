//! Nonce validation pipeline.
//!
//! A candidate nonce goes through three checks against live chain state:
//! the mining contract's difficulty test, collision with an already-minted
//! punk, and collision with an original punk's attribute combination. The
//! outcome is a [`NonceStatus`]; remote failures surface as
//! [`ChainError`] so callers can tell "invalid" apart from "unknown".
//!
//! Statuses are never cached: the remote state they depend on changes
//! between calls.

use ethers::types::{Address, U256};
use serde::Serialize;
use tracing::{debug, warn};

use crate::assets::LegacyPunkIndex;
use crate::error::ChainError;
use crate::rpc::ChainGateway;
use crate::seed;

/// Terminal classification of a nonce at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NonceStatus {
    FailsDifficultyTest,
    ProducesExistingMpunk,
    ProducesExistingOgPunk,
    Valid,
}

impl std::fmt::Display for NonceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NonceStatus::FailsDifficultyTest => "FAILS_DIFFICULTY_TEST",
            NonceStatus::ProducesExistingMpunk => "PRODUCES_EXISTING_MPUNK",
            NonceStatus::ProducesExistingOgPunk => "PRODUCES_EXISTING_OG_PUNK",
            NonceStatus::Valid => "VALID",
        };
        f.write_str(s)
    }
}

/// Classify `nonce` for `sender` against current chain state. Read-only.
///
/// On a founder slot (the next mint being every 33rd) the contract also
/// derives a second asset set from the hash of the primary seed, so both
/// candidates are checked for collisions.
pub async fn check_nonce(
    chain: &dyn ChainGateway,
    legacy: &LegacyPunkIndex,
    nonce: U256,
    sender: Address,
) -> Result<NonceStatus, ChainError> {
    if !chain.is_valid_nonce(sender, nonce).await? {
        debug!(%nonce, "nonce fails the difficulty test");
        return Ok(NonceStatus::FailsDifficultyTest);
    }

    let last_mined_assets = chain.last_mined_punk_assets().await?;
    let num_mined = chain.num_mined().await?;
    let address_bits = seed::last_72_address_bits(sender);
    let primary_seed = seed::mining_seed(last_mined_assets, address_bits, nonce);

    let mut candidates = vec![chain.seed_to_punk_assets(primary_seed).await?];
    if seed::is_founder_slot(num_mined) {
        let secondary = chain
            .seed_to_punk_assets(seed::derived_seed(primary_seed))
            .await?;
        candidates.push(secondary);
    }

    for packed in &candidates {
        let existing_id = chain.punk_assets_to_id(*packed).await?;
        if existing_id > U256::zero() {
            warn!(%nonce, punk_id = %existing_id, "nonce produces an existing mpunk");
            return Ok(NonceStatus::ProducesExistingMpunk);
        }
    }

    for packed in &candidates {
        let asset_names = chain.packed_asset_names(*packed).await?;
        if let Some(og_id) = legacy.lookup(&asset_names) {
            warn!(%nonce, og_id, "nonce produces an original punk's attributes");
            return Ok(NonceStatus::ProducesExistingOgPunk);
        }
    }

    Ok(NonceStatus::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockGateway;

    fn sender() -> Address {
        Address::from_low_u64_be(0x1234)
    }

    fn empty_legacy() -> LegacyPunkIndex {
        LegacyPunkIndex::from_entries(Vec::<(String, u64)>::new())
    }

    #[tokio::test]
    async fn difficulty_failure_stops_immediately() {
        let chain = MockGateway {
            difficulty_ok: false,
            ..Default::default()
        };

        let status = check_nonce(&chain, &empty_legacy(), U256::from(1u64), sender())
            .await
            .unwrap();

        assert_eq!(status, NonceStatus::FailsDifficultyTest);
        // No reads beyond the difficulty predicate.
        assert_eq!(chain.calls(), vec!["isValidNonce"]);
    }

    #[tokio::test]
    async fn existing_mpunk_collision_is_reported() {
        let mut chain = MockGateway::default();
        chain
            .existing_ids
            .insert(chain.fallback_packed, U256::from(77u64));

        let status = check_nonce(&chain, &empty_legacy(), U256::from(1u64), sender())
            .await
            .unwrap();

        assert_eq!(status, NonceStatus::ProducesExistingMpunk);
    }

    #[tokio::test]
    async fn og_punk_collision_is_reported() {
        let mut chain = MockGateway::default();
        chain
            .names
            .insert(chain.fallback_packed, "Male 2, Dark Hair".to_string());
        let legacy = LegacyPunkIndex::from_entries([("Male 2, Dark Hair", 8u64)]);

        let status = check_nonce(&chain, &legacy, U256::from(1u64), sender())
            .await
            .unwrap();

        assert_eq!(status, NonceStatus::ProducesExistingOgPunk);
    }

    #[tokio::test]
    async fn mpunk_collision_takes_precedence_over_og() {
        let mut chain = MockGateway::default();
        chain
            .existing_ids
            .insert(chain.fallback_packed, U256::from(3u64));
        chain
            .names
            .insert(chain.fallback_packed, "Male 2, Dark Hair".to_string());
        let legacy = LegacyPunkIndex::from_entries([("Male 2, Dark Hair", 8u64)]);

        let status = check_nonce(&chain, &legacy, U256::from(1u64), sender())
            .await
            .unwrap();

        assert_eq!(status, NonceStatus::ProducesExistingMpunk);
    }

    #[tokio::test]
    async fn founder_slot_checks_the_derived_candidate() {
        let nonce = U256::from(5u64);
        let mut chain = MockGateway {
            num_mined: U256::from(32u64), // next mint is the 33rd
            ..Default::default()
        };

        let primary = seed::mining_seed(
            chain.last_mined_assets,
            seed::last_72_address_bits(sender()),
            nonce,
        );
        let clean = U256::from(0xAAAAu64);
        let colliding = U256::from(0xBBBBu64);
        chain.seed_assets.insert(primary, clean);
        chain
            .seed_assets
            .insert(seed::derived_seed(primary), colliding);
        chain.existing_ids.insert(colliding, U256::from(9u64));

        let status = check_nonce(&chain, &empty_legacy(), nonce, sender())
            .await
            .unwrap();

        // The primary candidate is fresh, but the derived one collides.
        assert_eq!(status, NonceStatus::ProducesExistingMpunk);
    }

    #[tokio::test]
    async fn clean_nonce_is_valid_and_revalidation_agrees() {
        let chain = MockGateway::default();
        let legacy = empty_legacy();

        let first = check_nonce(&chain, &legacy, U256::from(1u64), sender())
            .await
            .unwrap();
        let second = check_nonce(&chain, &legacy, U256::from(1u64), sender())
            .await
            .unwrap();

        assert_eq!(first, NonceStatus::Valid);
        assert_eq!(second, NonceStatus::Valid);
    }
}
