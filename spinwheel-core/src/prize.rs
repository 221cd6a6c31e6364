use crate::error::{Result, SpinwheelError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Upper end of the draw range. Bounds are percentiles.
pub const DRAW_RANGE: f64 = 100.0;

/// A prize label such as `"100 GKY"`, `"NFT STARTER"` or `"NO PRIZE"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prize(String);

impl Prize {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Prize {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeTier {
    /// Cumulative percentile; draws below it (and at or above the previous
    /// tier's bound) win this prize.
    pub upper_bound: f64,
    pub prize: Prize,
}

/// Cumulative probability table over `[0, 100)`. The fallback covers
/// everything from the last tier's bound up to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeTable {
    tiers: Vec<PrizeTier>,
    fallback: Prize,
}

impl Default for PrizeTable {
    fn default() -> Self {
        let tier = |upper_bound: f64, label: &str| PrizeTier {
            upper_bound,
            prize: Prize::new(label),
        };
        Self {
            tiers: vec![
                tier(0.02, "NFT BASISC"),
                tier(0.06, "NFT STARTER"),
                tier(2.0, "1000 GKY"),
                tier(4.0, "500 GKY"),
                tier(8.0, "250 GKY"),
                tier(15.0, "100 GKY"),
                tier(25.0, "50 GKY"),
                tier(45.0, "20 GKY"),
                tier(70.0, "10 GKY"),
            ],
            fallback: Prize::new("NO PRIZE"),
        }
    }
}

impl PrizeTable {
    /// Build and validate a table.
    pub fn new(tiers: Vec<PrizeTier>, fallback: Prize) -> Result<Self> {
        let table = Self { tiers, fallback };
        table.validate()?;
        Ok(table)
    }

    pub fn tiers(&self) -> &[PrizeTier] {
        &self.tiers
    }

    pub fn fallback(&self) -> &Prize {
        &self.fallback
    }

    /// Every label the table can produce, tiers first.
    pub fn labels(&self) -> impl Iterator<Item = &Prize> {
        self.tiers.iter().map(|t| &t.prize).chain(std::iter::once(&self.fallback))
    }

    pub fn contains(&self, prize: &Prize) -> bool {
        self.labels().any(|p| p == prize)
    }

    pub fn validate(&self) -> Result<()> {
        let mut previous = 0.0;
        for tier in &self.tiers {
            if !tier.upper_bound.is_finite()
                || tier.upper_bound <= previous
                || tier.upper_bound >= DRAW_RANGE
            {
                return Err(SpinwheelError::config(format!(
                    "prize '{}' has bound {} (bounds must increase strictly within (0, {}))",
                    tier.prize, tier.upper_bound, DRAW_RANGE
                )));
            }
            previous = tier.upper_bound;
        }

        let mut seen = HashSet::new();
        for label in self.labels() {
            if label.as_str().trim().is_empty() {
                return Err(SpinwheelError::config("prize labels must not be empty"));
            }
            if !seen.insert(label) {
                return Err(SpinwheelError::config(format!("duplicate prize '{}'", label)));
            }
        }

        Ok(())
    }

    /// Map a draw in `[0, 100)` to its prize.
    pub fn draw(&self, roll: f64) -> &Prize {
        let index = self.tiers.partition_point(|t| t.upper_bound <= roll);
        self.tiers
            .get(index)
            .map(|t| &t.prize)
            .unwrap_or(&self.fallback)
    }

    /// Each label with its probability in percent.
    pub fn probabilities(&self) -> Vec<(&Prize, f64)> {
        let mut previous = 0.0;
        let mut out = Vec::with_capacity(self.tiers.len() + 1);
        for tier in &self.tiers {
            out.push((&tier.prize, tier.upper_bound - previous));
            previous = tier.upper_bound;
        }
        out.push((&self.fallback, DRAW_RANGE - previous));
        out
    }
}

/// Draws prizes from a [`PrizeTable`].
pub struct PrizeSelector<R = StdRng> {
    table: PrizeTable,
    rng: parking_lot::Mutex<R>,
}

impl PrizeSelector<StdRng> {
    pub fn new(table: PrizeTable) -> Self {
        Self::with_rng(table, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(table: PrizeTable, seed: u64) -> Self {
        Self::with_rng(table, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PrizeSelector<R> {
    pub fn with_rng(table: PrizeTable, rng: R) -> Self {
        Self {
            table,
            rng: parking_lot::Mutex::new(rng),
        }
    }

    pub fn table(&self) -> &PrizeTable {
        &self.table
    }

    pub fn draw(&self) -> Prize {
        let roll: f64 = self.rng.lock().random_range(0.0..DRAW_RANGE);
        let prize = self.table.draw(roll).clone();
        tracing::debug!(roll, prize = %prize, "Prize drawn");
        prize
    }
}
