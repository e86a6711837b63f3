//! Chain gateway: typed read/write access to the three contracts.
//!
//! All chain traffic goes through the [`ChainGateway`] trait; the
//! production implementation is [`EthersGateway`] over an HTTP JSON-RPC
//! provider. Reads only need the provider; `mint` additionally needs a
//! signing wallet and fails with [`ChainError::Wallet`] when none was
//! configured.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};
use tracing::debug;

use crate::error::ChainError;

abigen!(
    MineablePunks,
    r#"[
        function isValidNonce(uint88 nonce) external view returns (bool)
        function lastMinedPunkAssets() external view returns (uint96)
        function difficultyTarget() external view returns (uint256)
        function numMined() external view returns (uint256)
        function punkAssetsToId(uint96 packedAssets) external view returns (uint256)
        function mint(uint88 nonce, uint256 otherPunksOffset) external
    ]"#
);

abigen!(
    OtherPunks,
    r#"[
        function seedToPunkAssets(uint256 seed) external view returns (uint96)
    ]"#
);

abigen!(
    PublicCryptopunksData,
    r#"[
        function getPackedAssetNames(uint96 packedAssets) external view returns (string)
    ]"#
);

/// Read/write surface of the remote contracts and chain endpoint.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Whether `nonce` passes the mining contract's difficulty test,
    /// evaluated as if called by `sender`.
    async fn is_valid_nonce(&self, sender: Address, nonce: U256) -> Result<bool, ChainError>;

    async fn last_mined_punk_assets(&self) -> Result<U256, ChainError>;

    async fn difficulty_target(&self) -> Result<U256, ChainError>;

    /// Count of punks already minted.
    async fn num_mined(&self) -> Result<U256, ChainError>;

    /// Id of the punk minted from `packed_assets`, zero when unminted.
    async fn punk_assets_to_id(&self, packed_assets: U256) -> Result<U256, ChainError>;

    async fn seed_to_punk_assets(&self, seed: U256) -> Result<U256, ChainError>;

    /// Human-readable asset names for a packed asset combination.
    async fn packed_asset_names(&self, packed_assets: U256) -> Result<String, ChainError>;

    /// Current network gas price in wei.
    async fn gas_price(&self) -> Result<U256, ChainError>;

    async fn balance(&self, address: Address) -> Result<U256, ChainError>;

    /// Broadcast `mint(nonce, 0)` with the given gas limit and return the
    /// transaction hash without waiting for confirmation.
    async fn mint(&self, nonce: U256, gas_limit: U256) -> Result<TxHash, ChainError>;
}

/// Addresses of the three contracts the gateway talks to.
#[derive(Clone, Debug)]
pub struct ContractAddresses {
    pub mineable_punks: Address,
    pub otherpunks: Address,
    pub public_cryptopunks_data: Address,
}

type HttpClient = Provider<Http>;
type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

struct SignerHandle {
    address: Address,
    mineable: MineablePunks<SignerClient>,
}

/// Production gateway over an HTTP JSON-RPC endpoint.
pub struct EthersGateway {
    provider: Arc<HttpClient>,
    mineable: MineablePunks<HttpClient>,
    otherpunks: OtherPunks<HttpClient>,
    punk_data: PublicCryptopunksData<HttpClient>,
    signer: Option<SignerHandle>,
}

impl EthersGateway {
    /// Connect to `rpc_url`. When `private_key` is given the gateway can
    /// also submit mints; the chain id for signing is fetched from the
    /// endpoint.
    pub async fn connect(
        rpc_url: &str,
        addresses: ContractAddresses,
        private_key: Option<&str>,
    ) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Config(format!("invalid RPC URL {rpc_url}: {e}")))?;
        let provider = Arc::new(provider);

        let signer = match private_key {
            Some(key) => {
                let wallet: LocalWallet = key
                    .parse()
                    .map_err(|e| ChainError::Config(format!("invalid private key: {e}")))?;
                let address = wallet.address();
                let client = SignerMiddleware::new_with_provider_chain((*provider).clone(), wallet)
                    .await
                    .map_err(|e| ChainError::Rpc(e.to_string()))?;
                Some(SignerHandle {
                    address,
                    mineable: MineablePunks::new(addresses.mineable_punks, Arc::new(client)),
                })
            }
            None => None,
        };

        Ok(Self {
            mineable: MineablePunks::new(addresses.mineable_punks, provider.clone()),
            otherpunks: OtherPunks::new(addresses.otherpunks, provider.clone()),
            punk_data: PublicCryptopunksData::new(addresses.public_cryptopunks_data, provider.clone()),
            provider,
            signer,
        })
    }

    /// Address of the configured signing wallet, if any.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address)
    }
}

#[async_trait]
impl ChainGateway for EthersGateway {
    async fn is_valid_nonce(&self, sender: Address, nonce: U256) -> Result<bool, ChainError> {
        let nonce = to_uint88(nonce)?;
        self.mineable
            .is_valid_nonce(nonce)
            .from(sender)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("isValidNonce: {e}")))
    }

    async fn last_mined_punk_assets(&self) -> Result<U256, ChainError> {
        self.mineable
            .last_mined_punk_assets()
            .call()
            .await
            .map(U256::from)
            .map_err(|e| ChainError::Rpc(format!("lastMinedPunkAssets: {e}")))
    }

    async fn difficulty_target(&self) -> Result<U256, ChainError> {
        self.mineable
            .difficulty_target()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("difficultyTarget: {e}")))
    }

    async fn num_mined(&self) -> Result<U256, ChainError> {
        self.mineable
            .num_mined()
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("numMined: {e}")))
    }

    async fn punk_assets_to_id(&self, packed_assets: U256) -> Result<U256, ChainError> {
        let packed = to_uint96(packed_assets)?;
        self.mineable
            .punk_assets_to_id(packed)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("punkAssetsToId: {e}")))
    }

    async fn seed_to_punk_assets(&self, seed: U256) -> Result<U256, ChainError> {
        self.otherpunks
            .seed_to_punk_assets(seed)
            .call()
            .await
            .map(U256::from)
            .map_err(|e| ChainError::Rpc(format!("seedToPunkAssets: {e}")))
    }

    async fn packed_asset_names(&self, packed_assets: U256) -> Result<String, ChainError> {
        let packed = to_uint96(packed_assets)?;
        self.punk_data
            .get_packed_asset_names(packed)
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("getPackedAssetNames: {e}")))
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_gasPrice: {e}")))
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_getBalance: {e}")))
    }

    async fn mint(&self, nonce: U256, gas_limit: U256) -> Result<TxHash, ChainError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| ChainError::Wallet("no signing key configured".into()))?;
        let nonce = to_uint88(nonce)?;

        debug!(gas_limit = %gas_limit, "sending mint transaction");
        let call = signer.mineable.mint(nonce, U256::zero()).gas(gas_limit);
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        // Return as soon as the transaction is broadcast; confirmation is
        // the operator's concern.
        Ok(pending.tx_hash())
    }
}

fn to_uint88(nonce: U256) -> Result<u128, ChainError> {
    if nonce.bits() > 88 {
        return Err(ChainError::InvalidInput(format!(
            "nonce {nonce} exceeds 88 bits"
        )));
    }
    Ok(nonce.as_u128())
}

fn to_uint96(packed: U256) -> Result<u128, ChainError> {
    if packed.bits() > 96 {
        return Err(ChainError::InvalidInput(format!(
            "packed assets {packed} exceed 96 bits"
        )));
    }
    Ok(packed.as_u128())
}
