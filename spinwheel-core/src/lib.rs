//! spinwheel - Core library for a spin-to-win token promotion
//!
//! Draws weighted prizes, resolves them to ERC-20 amounts and pays them
//! from a distribution account over Ethereum JSON-RPC. Extra spins can be
//! bought with the same token and are tracked in an in-memory ledger.

pub mod chain;
pub mod config;
pub mod error;
pub mod game;
pub mod ledger;
pub mod prize;
pub mod purchase;
pub mod reward;
pub mod transfer;
pub mod types;
pub mod watcher;

pub use chain::{ChainClient, EvmChainClient};
pub use config::{ChainConfig, GameConfig, GasPolicy, PurchaseCheck, SpinPack};
pub use error::{Result, SpinwheelError};
pub use game::{DistributionOutcome, SpinOutcome, SpinService};
pub use ledger::{MemoryLedger, SpinLedger, SpinSource};
pub use prize::{Prize, PrizeSelector, PrizeTable, PrizeTier};
pub use purchase::{PurchaseDesk, Quote};
pub use reward::{AmountResolver, Payout, Reward, RewardTable};
pub use transfer::TransferSubmitter;
pub use types::{Address, TokenAmount, TransferRequest, TransferResult, TreasuryReport, TxHash};
pub use watcher::PaymentWatcher;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_service_from_default_config() {
        let chain = Arc::new(MockChain::new());
        let ledger: Arc<dyn SpinLedger> = Arc::new(MemoryLedger::new());
        let service = SpinService::from_config(
            &GameConfig::default(),
            chain,
            ledger,
            Duration::from_secs(120),
            Duration::from_secs(2),
        )
        .unwrap();

        let wallet = Address::from_bytes([1; 20]);
        let outcome = service.spin(&wallet).unwrap();
        assert!(service.selector().table().contains(&outcome.prize));
        assert_eq!(service.ledger().pending_award(&wallet), Some(outcome.prize));
    }
}
