//! Scripted [`ChainGateway`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};

use crate::error::ChainError;
use crate::rpc::ChainGateway;

/// Gateway whose responses are scripted up front. Records every call so
/// tests can assert which remote reads happened.
pub struct MockGateway {
    pub difficulty_ok: bool,
    pub last_mined_assets: U256,
    pub num_mined: U256,
    pub gas_price: U256,
    pub wallet_balance: U256,
    /// seed -> packed assets; `fallback_packed` is used for unknown seeds.
    pub seed_assets: HashMap<U256, U256>,
    pub fallback_packed: U256,
    /// packed assets -> existing punk id (zero or absent means unminted).
    pub existing_ids: HashMap<U256, U256>,
    /// packed assets -> asset names.
    pub names: HashMap<U256, String>,
    pub calls: Mutex<Vec<&'static str>>,
    pub minted: Mutex<Vec<(U256, U256)>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            difficulty_ok: true,
            last_mined_assets: U256::from(0x60u64),
            num_mined: U256::from(10u64),
            gas_price: U256::from(1_000_000_000u64), // 1 gwei
            wallet_balance: U256::zero(),
            seed_assets: HashMap::new(),
            fallback_packed: U256::from(0xF00Du64),
            existing_ids: HashMap::new(),
            names: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            minted: Mutex::new(Vec::new()),
        }
    }
}

impl MockGateway {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn minted(&self) -> Vec<(U256, U256)> {
        self.minted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn is_valid_nonce(&self, _sender: Address, _nonce: U256) -> Result<bool, ChainError> {
        self.record("isValidNonce");
        Ok(self.difficulty_ok)
    }

    async fn last_mined_punk_assets(&self) -> Result<U256, ChainError> {
        self.record("lastMinedPunkAssets");
        Ok(self.last_mined_assets)
    }

    async fn difficulty_target(&self) -> Result<U256, ChainError> {
        self.record("difficultyTarget");
        Ok(U256::MAX >> 20)
    }

    async fn num_mined(&self) -> Result<U256, ChainError> {
        self.record("numMined");
        Ok(self.num_mined)
    }

    async fn punk_assets_to_id(&self, packed_assets: U256) -> Result<U256, ChainError> {
        self.record("punkAssetsToId");
        Ok(self
            .existing_ids
            .get(&packed_assets)
            .copied()
            .unwrap_or_default())
    }

    async fn seed_to_punk_assets(&self, seed: U256) -> Result<U256, ChainError> {
        self.record("seedToPunkAssets");
        Ok(self
            .seed_assets
            .get(&seed)
            .copied()
            .unwrap_or(self.fallback_packed))
    }

    async fn packed_asset_names(&self, packed_assets: U256) -> Result<String, ChainError> {
        self.record("getPackedAssetNames");
        Ok(self
            .names
            .get(&packed_assets)
            .cloned()
            .unwrap_or_else(|| format!("Unnamed {packed_assets}")))
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.record("gasPrice");
        Ok(self.gas_price)
    }

    async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
        self.record("balance");
        Ok(self.wallet_balance)
    }

    async fn mint(&self, nonce: U256, gas_limit: U256) -> Result<TxHash, ChainError> {
        self.record("mint");
        self.minted.lock().unwrap().push((nonce, gas_limit));
        Ok(TxHash::from_low_u64_be(0xBEEF))
    }
}
