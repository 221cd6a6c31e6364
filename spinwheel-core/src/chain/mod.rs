pub mod abi;
pub mod evm;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod rpc;
pub mod signer;
pub mod tx;

pub use evm::EvmChainClient;
pub use signer::LocalSigner;

use crate::error::Result;
use crate::types::{Address, TokenAmount, TransferRequest, TxHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A transaction as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: u128,
    pub input: Vec<u8>,
    pub block_number: Option<u64>,
}

impl ChainTransaction {
    /// Decoded ERC-20 `transfer(to, value)` call, if this is one.
    pub fn token_transfer(&self) -> Option<(Address, TokenAmount)> {
        abi::decode_transfer(&self.input).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
}

/// Everything the prize service needs from the chain: sending token
/// transfers from the distribution account and reading back state.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The distribution account that pays prizes and receives purchases.
    fn distribution_address(&self) -> Address;

    /// The ERC-20 contract prizes are paid in.
    fn token_address(&self) -> Address;

    fn token_decimals(&self) -> u8;

    fn chain_id(&self) -> u64;

    /// Sign and broadcast `transfer(recipient, amount)` on the token
    /// contract. Returns once the node accepted the transaction.
    async fn send_token_transfer(&self, request: &TransferRequest) -> Result<TxHash>;

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>>;

    async fn transaction(&self, hash: &TxHash) -> Result<Option<ChainTransaction>>;

    async fn block_number(&self) -> Result<u64>;

    async fn block_transactions(&self, number: u64) -> Result<Vec<ChainTransaction>>;

    async fn token_balance(&self, owner: &Address) -> Result<TokenAmount>;
}
