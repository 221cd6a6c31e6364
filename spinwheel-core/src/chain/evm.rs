use crate::chain::rpc::{self, JsonRpcClient, RpcBlock, RpcReceipt, RpcTransaction};
use crate::chain::tx::LegacyTransaction;
use crate::chain::{abi, ChainClient, ChainTransaction, LocalSigner, Receipt};
use crate::config::{ChainConfig, GasPolicy};
use crate::error::{Result, SpinwheelError};
use crate::types::{Address, TokenAmount, TransferRequest, TxHash};
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

/// [`ChainClient`] backed by an Ethereum JSON-RPC node, signing locally
/// with the distribution key.
pub struct EvmChainClient {
    rpc: JsonRpcClient,
    signer: LocalSigner,
    token: Address,
    chain_id: u64,
    decimals: u8,
    gas: GasPolicy,
    // Held from nonce lookup until the node accepts the transaction.
    send_lock: Mutex<()>,
}

impl EvmChainClient {
    /// Build the client, asking the node for the chain id and the token
    /// for its decimals when the config leaves them unset.
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        config.validate()?;

        let rpc = JsonRpcClient::new(&config.provider_url)?;
        let signer = LocalSigner::from_hex(&config.private_key)?;

        let chain_id = match config.chain_id {
            Some(id) => id,
            None => {
                let raw: String = rpc.call("eth_chainId", json!([])).await?;
                rpc::parse_u64_quantity(&raw)?
            }
        };

        let decimals = match config.token_decimals {
            Some(decimals) => decimals,
            None => query_decimals(&rpc, &config.token_address).await?,
        };

        tracing::info!(
            "Connected to chain {} at {} as {} (token {}, {} decimals)",
            chain_id,
            config.provider_url,
            signer.address(),
            config.token_address,
            decimals
        );

        Ok(Self {
            rpc,
            signer,
            token: config.token_address,
            chain_id,
            decimals,
            gas: config.gas.clone(),
            send_lock: Mutex::new(()),
        })
    }

    async fn pending_nonce(&self) -> Result<u64> {
        let raw: String = self
            .rpc
            .call(
                "eth_getTransactionCount",
                json!([self.signer.address(), "pending"]),
            )
            .await?;
        rpc::parse_u64_quantity(&raw)
    }

    async fn gas_price(&self) -> u128 {
        let suggested = async {
            let raw: String = self.rpc.call("eth_gasPrice", json!([])).await?;
            rpc::parse_quantity(&raw)
        };
        match suggested.await {
            Ok(price) => self.gas.bumped(price),
            Err(e) => {
                tracing::warn!(
                    "eth_gasPrice failed, using fallback {} wei: {}",
                    self.gas.fallback_gas_price,
                    e
                );
                self.gas.fallback_gas_price
            }
        }
    }

    async fn eth_call(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        eth_call(&self.rpc, &self.token, data).await
    }
}

async fn eth_call(rpc: &JsonRpcClient, to: &Address, data: Vec<u8>) -> Result<Vec<u8>> {
    let raw: String = rpc
        .call(
            "eth_call",
            json!([{ "to": to, "data": rpc::to_data(&data) }, "latest"]),
        )
        .await?;
    rpc::parse_data(&raw)
}

async fn query_decimals(rpc: &JsonRpcClient, token: &Address) -> Result<u8> {
    let word = eth_call(rpc, token, abi::encode_decimals()).await?;
    let decimals = abi::decode_uint(&word)?;
    u8::try_from(decimals)
        .map_err(|_| SpinwheelError::decode(format!("token reports {} decimals", decimals)))
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn distribution_address(&self) -> Address {
        self.signer.address()
    }

    fn token_address(&self) -> Address {
        self.token
    }

    fn token_decimals(&self) -> u8 {
        self.decimals
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_token_transfer(&self, request: &TransferRequest) -> Result<TxHash> {
        let _guard = self.send_lock.lock().await;

        let nonce = self.pending_nonce().await?;
        let gas_price = self.gas_price().await;
        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit: self.gas.gas_limit,
            to: self.token,
            value: 0,
            data: abi::encode_transfer(&request.recipient, request.amount),
        };
        let raw = self.signer.sign_transaction(&tx, self.chain_id)?;

        tracing::debug!(
            request_id = %request.id,
            nonce,
            gas_price = %gas_price,
            "Broadcasting transfer of {} base units to {}",
            request.amount.base_units(),
            request.recipient
        );

        let hash: String = self
            .rpc
            .call("eth_sendRawTransaction", json!([rpc::to_data(&raw)]))
            .await?;
        hash.parse()
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        let raw: Option<RpcReceipt> = self
            .rpc
            .call("eth_getTransactionReceipt", json!([hash]))
            .await?;
        raw.map(Receipt::try_from).transpose()
    }

    async fn transaction(&self, hash: &TxHash) -> Result<Option<ChainTransaction>> {
        let raw: Option<RpcTransaction> = self
            .rpc
            .call("eth_getTransactionByHash", json!([hash]))
            .await?;
        raw.map(ChainTransaction::try_from).transpose()
    }

    async fn block_number(&self) -> Result<u64> {
        let raw: String = self.rpc.call("eth_blockNumber", json!([])).await?;
        rpc::parse_u64_quantity(&raw)
    }

    async fn block_transactions(&self, number: u64) -> Result<Vec<ChainTransaction>> {
        let block: Option<RpcBlock> = self
            .rpc
            .call(
                "eth_getBlockByNumber",
                json!([rpc::to_quantity(number as u128), true]),
            )
            .await?;
        let block = block
            .ok_or_else(|| SpinwheelError::decode(format!("block {} is not available", number)))?;
        block
            .transactions
            .into_iter()
            .map(ChainTransaction::try_from)
            .collect()
    }

    async fn token_balance(&self, owner: &Address) -> Result<TokenAmount> {
        let word = self.eth_call(abi::encode_balance_of(owner)).await?;
        Ok(TokenAmount::from_base_units(abi::decode_uint(&word)?))
    }
}
