//! Seed derivation for candidate nonces.
//!
//! The mining contract derives punk assets from
//! `keccak256(uint96 lastMinedAssets ‖ uint72 senderAddressBits ‖ uint88 nonce)`,
//! the tightly-packed Solidity encoding. Only the last 72 bits of the
//! sender address participate. Every 33rd mint is a founder slot and is
//! additionally checked against a second seed derived by hashing the first.

use ethers::types::{Address, U256};
use ethers::utils::keccak256;

/// Every `FOUNDER_INTERVAL`-th mint is reserved for a founder punk.
pub const FOUNDER_INTERVAL: u64 = 33;

/// Packed keccak seed over (uint96, uint72, uint88), matching the
/// contract's tightly-packed encoding: 12 + 9 + 11 = 32 bytes.
pub fn mining_seed(last_mined_assets: U256, address_bits: U256, nonce: U256) -> U256 {
    let mut buf = [0u8; 32];
    let mut packed = Vec::with_capacity(32);

    last_mined_assets.to_big_endian(&mut buf);
    packed.extend_from_slice(&buf[20..]); // low 96 bits
    address_bits.to_big_endian(&mut buf);
    packed.extend_from_slice(&buf[23..]); // low 72 bits
    nonce.to_big_endian(&mut buf);
    packed.extend_from_slice(&buf[21..]); // low 88 bits

    U256::from_big_endian(&keccak256(&packed))
}

/// Secondary seed for founder slots: the hash of the primary seed as a
/// full 256-bit word.
pub fn derived_seed(seed: U256) -> U256 {
    let mut buf = [0u8; 32];
    seed.to_big_endian(&mut buf);
    U256::from_big_endian(&keccak256(buf))
}

/// The low 72 bits (last 9 bytes) of a sender address.
pub fn last_72_address_bits(addr: Address) -> U256 {
    U256::from_big_endian(&addr.as_bytes()[11..])
}

/// Whether the next mint (the slot `num_mined + 1` would fill) is a
/// founder slot.
pub fn is_founder_slot(num_mined: U256) -> bool {
    (num_mined + U256::one()) % U256::from(FOUNDER_INTERVAL) == U256::zero()
}
