use crate::error::{Result, SpinwheelError};
use crate::prize::PrizeTable;
use crate::reward::RewardTable;
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Game rules: what can be won, what it pays and what extra spins cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub token_symbol: String,
    pub prizes: PrizeTable,
    pub rewards: RewardTable,
    pub spin_packs: Vec<SpinPack>,
    pub purchase_check: PurchaseCheck,
    /// When set, each spin consumes the daily free spin or a purchased credit.
    /// Off by default: spins are then unlimited, and a wallet may re-spin
    /// until it draws a large prize. The award book only makes each drawn
    /// prize pay once.
    pub metered_spins: bool,
}

/// A purchasable bundle of extra spins, priced in whole tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinPack {
    pub spins: u32,
    pub cost: u64,
}

/// How much of a purchase transaction is checked before spins are credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurchaseCheck {
    /// Sender, token contract, recipient, amount and receipt status.
    #[default]
    Strict,
    /// Only that the transaction exists.
    ExistenceOnly,
}

impl std::str::FromStr for PurchaseCheck {
    type Err = SpinwheelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "existence-only" | "existence_only" => Ok(Self::ExistenceOnly),
            other => Err(SpinwheelError::config(format!(
                "unknown purchase check '{}' (expected strict or existence-only)",
                other
            ))),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            token_symbol: "GKY".to_string(),
            prizes: PrizeTable::default(),
            rewards: RewardTable::default(),
            spin_packs: vec![
                SpinPack { spins: 1, cost: 50 },
                SpinPack { spins: 3, cost: 125 },
                SpinPack { spins: 10, cost: 300 },
            ],
            purchase_check: PurchaseCheck::Strict,
            metered_spins: false,
        }
    }
}

impl GameConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            SpinwheelError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: GameConfig = serde_json::from_str(&data).map_err(|e| {
            SpinwheelError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_symbol.trim().is_empty() {
            return Err(SpinwheelError::config("token symbol must not be empty"));
        }

        self.prizes.validate()?;
        self.rewards.covers(&self.prizes)?;

        if self.spin_packs.is_empty() {
            return Err(SpinwheelError::config("at least one spin pack is required"));
        }
        let mut seen = HashSet::new();
        for pack in &self.spin_packs {
            if pack.spins == 0 || pack.cost == 0 {
                return Err(SpinwheelError::config(format!(
                    "spin pack {:?} must have non-zero spins and cost",
                    pack
                )));
            }
            if !seen.insert(pack.spins) {
                return Err(SpinwheelError::config(format!(
                    "duplicate spin pack size {}",
                    pack.spins
                )));
            }
        }

        Ok(())
    }

    pub fn spin_pack(&self, spins: u32) -> Option<SpinPack> {
        self.spin_packs.iter().copied().find(|p| p.spins == spins)
    }
}

/// Gas settings for prize transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasPolicy {
    pub gas_limit: u64,
    /// Percentage applied to the node's suggested gas price.
    pub price_bump_percent: u32,
    /// Used when the node cannot suggest a price (wei).
    pub fallback_gas_price: u128,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            gas_limit: 100_000,
            price_bump_percent: 120,
            fallback_gas_price: 50_000_000_000, // 50 gwei
        }
    }
}

impl GasPolicy {
    pub fn bumped(&self, node_price: u128) -> u128 {
        node_price.saturating_mul(self.price_bump_percent as u128) / 100
    }
}

/// Connection to the chain node and the distribution account.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub provider_url: String,
    pub private_key: String,
    pub token_address: Address,
    /// Queried from the node when unset.
    pub chain_id: Option<u64>,
    /// Queried from the token contract when unset.
    pub token_decimals: Option<u8>,
    pub gas: GasPolicy,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            provider_url: "http://localhost:8545".to_string(),
            private_key: String::new(),
            token_address: Address::ZERO,
            chain_id: None,
            token_decimals: None,
            gas: GasPolicy::default(),
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.provider_url.starts_with("http://") || self.provider_url.starts_with("https://")) {
            return Err(SpinwheelError::config(format!(
                "provider URL '{}' must be http(s)",
                self.provider_url
            )));
        }
        if self.private_key.trim().is_empty() {
            return Err(SpinwheelError::config("distribution private key is required"));
        }
        if self.token_address == Address::ZERO {
            return Err(SpinwheelError::config("token address is required"));
        }
        if self.gas.gas_limit == 0 {
            return Err(SpinwheelError::config("gas limit must be positive"));
        }
        if self.gas.price_bump_percent < 100 {
            return Err(SpinwheelError::config("gas price bump must be at least 100%"));
        }
        if self.poll_interval.is_zero() || self.confirmation_timeout < self.poll_interval {
            return Err(SpinwheelError::config(
                "confirmation timeout must cover at least one poll interval",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("provider_url", &self.provider_url)
            .field("private_key", &"<redacted>")
            .field("token_address", &self.token_address)
            .field("chain_id", &self.chain_id)
            .field("token_decimals", &self.token_decimals)
            .field("gas", &self.gas)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
