pub mod chain;
pub mod tables;

pub use chain::{handle_account_command, handle_send_command, handle_tx_command};
pub use tables::{handle_check_command, handle_quote_command, handle_simulate_command};

use clap::Args;
use spinwheel_core::{Address, ChainConfig, EvmChainClient, Result};

/// Connection settings shared by the commands that talk to the chain.
#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Chain JSON-RPC endpoint
    #[arg(long, env = "PROVIDER_URL")]
    pub provider_url: String,

    /// Hex private key of the distribution account
    #[arg(long, env = "DISTRIBUTION_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// ERC-20 contract prizes are paid in
    #[arg(long, env = "TOKEN_ADDRESS")]
    pub token_address: Address,

    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    #[arg(long, env = "TOKEN_DECIMALS")]
    pub token_decimals: Option<u8>,
}

impl ChainArgs {
    pub fn config(&self) -> ChainConfig {
        ChainConfig {
            provider_url: self.provider_url.clone(),
            private_key: self.private_key.clone(),
            token_address: self.token_address,
            chain_id: self.chain_id,
            token_decimals: self.token_decimals,
            ..ChainConfig::default()
        }
    }

    pub async fn connect(&self) -> Result<EvmChainClient> {
        EvmChainClient::connect(&self.config()).await
    }
}
