pub mod memory;

pub use memory::MemoryLedger;

use crate::error::Result;
use crate::prize::Prize;
use crate::types::{Address, TreasuryReport, TxHash};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a metered spin came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinSource {
    DailyFree,
    Credit,
}

/// Process state shared by the request handlers: purchased spins, used
/// purchase transactions, prizes awaiting distribution and treasury totals.
///
/// Implementations must make every method atomic with respect to the others.
pub trait SpinLedger: Send + Sync {
    fn credits(&self, wallet: &Address) -> u32;

    /// Add spins without a purchase transaction. Returns the new count.
    fn record_purchase(&self, wallet: &Address, spins: u32) -> u32;

    /// Credit spins paid for by `tx_hash` and book `cost` as income.
    /// Fails with `DuplicatePurchase` if the transaction was used before.
    fn credit_purchase(&self, wallet: &Address, spins: u32, tx_hash: &TxHash, cost: u64) -> Result<u32>;

    fn is_tx_used(&self, tx_hash: &TxHash) -> bool;

    /// Consume the wallet's free spin for `day`, or else one credit.
    fn take_spin(&self, wallet: &Address, day: NaiveDate) -> Option<SpinSource>;

    /// Remember the prize a wallet drew, replacing any earlier one.
    fn record_award(&self, wallet: &Address, prize: &Prize);

    fn pending_award(&self, wallet: &Address) -> Option<Prize>;

    /// Remove the wallet's pending award if it is `prize`.
    fn take_award(&self, wallet: &Address, prize: &Prize) -> bool;

    /// Put back an award whose distribution failed. A newer award drawn
    /// in the meantime is kept.
    fn restore_award(&self, wallet: &Address, prize: &Prize);

    /// Book tokens paid out, in display units.
    fn record_payout(&self, amount: u64);

    fn treasury(&self) -> TreasuryReport;
}
