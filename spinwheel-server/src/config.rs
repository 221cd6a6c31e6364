use clap::Parser;
use spinwheel_core::{Address, ChainConfig, GameConfig, GasPolicy, PurchaseCheck, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "spinwheel=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(name = "spinwheel-server")]
#[command(about = "Spin-to-win prize server paying ERC-20 prizes")]
#[command(version)]
pub struct ServerArgs {
    /// Chain JSON-RPC endpoint
    #[arg(long, env = "PROVIDER_URL")]
    pub provider_url: String,

    /// Hex private key of the distribution account
    #[arg(long, env = "DISTRIBUTION_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// ERC-20 contract prizes are paid in
    #[arg(long, env = "TOKEN_ADDRESS")]
    pub token_address: Address,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// EIP-155 chain id (queried from the node when omitted)
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Token decimals (queried from the contract when omitted)
    #[arg(long, env = "TOKEN_DECIMALS")]
    pub token_decimals: Option<u8>,

    /// JSON file with prize table, rewards and spin packs
    #[arg(long, env = "GAME_TABLES")]
    pub game_tables: Option<PathBuf>,

    #[arg(long, env = "GAS_LIMIT", default_value_t = 100_000)]
    pub gas_limit: u64,

    /// Percentage applied to the node's gas price
    #[arg(long, env = "GAS_PRICE_BUMP_PERCENT", default_value_t = 120)]
    pub gas_price_bump_percent: u32,

    #[arg(long, env = "CONFIRMATION_TIMEOUT_SECS", default_value_t = 120)]
    pub confirmation_timeout_secs: u64,

    /// Seconds between payment watcher polls (0 disables the watcher)
    #[arg(long, env = "WATCH_INTERVAL_SECS", default_value_t = 0)]
    pub watch_interval_secs: u64,

    /// Meter spins: one free spin per UTC day plus purchased spins
    #[arg(long, env = "METERED_SPINS")]
    pub metered_spins: bool,

    /// strict or existence-only (strict unless the tables file says otherwise)
    #[arg(long, env = "PURCHASE_CHECK")]
    pub purchase_check: Option<PurchaseCheck>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerArgs {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn watch_interval(&self) -> Option<Duration> {
        (self.watch_interval_secs > 0).then(|| Duration::from_secs(self.watch_interval_secs))
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            provider_url: self.provider_url.clone(),
            private_key: self.private_key.clone(),
            token_address: self.token_address,
            chain_id: self.chain_id,
            token_decimals: self.token_decimals,
            gas: GasPolicy {
                gas_limit: self.gas_limit,
                price_bump_percent: self.gas_price_bump_percent,
                ..GasPolicy::default()
            },
            confirmation_timeout: self.confirmation_timeout(),
            ..ChainConfig::default()
        }
    }

    /// Tables from `--game-tables`, or the built-in defaults, with the
    /// command-line switches applied.
    pub fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.game_tables {
            Some(path) => GameConfig::from_file(path)?,
            None => GameConfig::default(),
        };
        if let Some(check) = self.purchase_check {
            config.purchase_check = check;
        }
        config.metered_spins = config.metered_spins || self.metered_spins;
        config.validate()?;
        Ok(config)
    }
}
