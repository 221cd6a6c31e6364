use crate::error::{Result, SpinwheelError};
use crate::prize::{Prize, PrizeTable};
use crate::types::TokenAmount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a prize is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reward {
    /// Whole tokens, scaled by the token's decimals when paid.
    Tokens(u64),
    /// Non-fungible reward; recorded but never transferred here.
    Collectible,
    Nothing,
}

/// Prize label to reward mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardTable(BTreeMap<Prize, Reward>);

impl Default for RewardTable {
    fn default() -> Self {
        let mut rewards = BTreeMap::new();
        rewards.insert(Prize::new("NFT BASISC"), Reward::Collectible);
        rewards.insert(Prize::new("NFT STARTER"), Reward::Collectible);
        for amount in [1000, 500, 250, 100, 50, 20, 10] {
            rewards.insert(Prize::new(format!("{} GKY", amount)), Reward::Tokens(amount));
        }
        rewards.insert(Prize::new("NO PRIZE"), Reward::Nothing);
        Self(rewards)
    }
}

impl RewardTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, prize: Prize, reward: Reward) -> Option<Reward> {
        self.0.insert(prize, reward)
    }

    pub fn remove(&mut self, prize: &Prize) -> Option<Reward> {
        self.0.remove(prize)
    }

    pub fn get(&self, prize: &Prize) -> Option<Reward> {
        self.0.get(prize).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Prize, &Reward)> {
        self.0.iter()
    }

    /// Every prize the table can draw must have a usable reward.
    pub fn covers(&self, prizes: &PrizeTable) -> Result<()> {
        for label in prizes.labels() {
            match self.get(label) {
                None => {
                    return Err(SpinwheelError::config(format!(
                        "prize '{}' has no reward entry",
                        label
                    )))
                }
                Some(Reward::Tokens(0)) => {
                    return Err(SpinwheelError::config(format!(
                        "prize '{}' pays zero tokens (use \"nothing\")",
                        label
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// A resolved prize, ready for the transfer submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payout {
    Transfer(TokenAmount),
    Collectible,
    Nothing,
}

/// Resolves prize labels to payouts in the token's base units.
#[derive(Debug, Clone)]
pub struct AmountResolver {
    rewards: RewardTable,
    decimals: u8,
}

impl AmountResolver {
    pub fn new(rewards: RewardTable, decimals: u8) -> Self {
        Self { rewards, decimals }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn resolve(&self, prize: &Prize) -> Result<Payout> {
        match self.rewards.get(prize) {
            Some(Reward::Tokens(units)) => {
                Ok(Payout::Transfer(TokenAmount::from_units(units, self.decimals)?))
            }
            Some(Reward::Collectible) => Ok(Payout::Collectible),
            Some(Reward::Nothing) => Ok(Payout::Nothing),
            None => Err(SpinwheelError::UnknownPrize(prize.to_string())),
        }
    }
}
