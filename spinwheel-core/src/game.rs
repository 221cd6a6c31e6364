use crate::chain::ChainClient;
use crate::config::GameConfig;
use crate::error::{Result, SpinwheelError};
use crate::ledger::{SpinLedger, SpinSource};
use crate::prize::{Prize, PrizeSelector};
use crate::reward::{AmountResolver, Payout};
use crate::transfer::TransferSubmitter;
use crate::types::{Address, TransferResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinOutcome {
    pub prize: Prize,
    /// Set when spins are metered.
    pub source: Option<SpinSource>,
}

#[derive(Debug, Clone)]
pub enum DistributionOutcome {
    Transferred(TransferResult),
    /// Non-fungible prize; nothing is sent from here.
    Collectible,
    NothingToSend,
}

/// The spin-to-win game: draws prizes, remembers who won what and pays
/// fungible prizes out of the distribution account.
pub struct SpinService {
    selector: PrizeSelector,
    resolver: AmountResolver,
    submitter: TransferSubmitter,
    ledger: Arc<dyn SpinLedger>,
    metered: bool,
}

impl SpinService {
    pub fn new(
        selector: PrizeSelector,
        resolver: AmountResolver,
        submitter: TransferSubmitter,
        ledger: Arc<dyn SpinLedger>,
        metered: bool,
    ) -> Self {
        Self {
            selector,
            resolver,
            submitter,
            ledger,
            metered,
        }
    }

    /// Wire the game from validated tables and a connected chain client.
    pub fn from_config(
        config: &GameConfig,
        chain: Arc<dyn ChainClient>,
        ledger: Arc<dyn SpinLedger>,
        confirmation_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = AmountResolver::new(config.rewards.clone(), chain.token_decimals());
        let submitter = TransferSubmitter::new(chain, confirmation_timeout, poll_interval);
        Ok(Self::new(
            PrizeSelector::new(config.prizes.clone()),
            resolver,
            submitter,
            ledger,
            config.metered_spins,
        ))
    }

    pub fn selector(&self) -> &PrizeSelector {
        &self.selector
    }

    pub fn resolver(&self) -> &AmountResolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &Arc<dyn SpinLedger> {
        &self.ledger
    }

    pub fn is_metered(&self) -> bool {
        self.metered
    }

    pub fn spin(&self, wallet: &Address) -> Result<SpinOutcome> {
        self.spin_at(wallet, Utc::now())
    }

    /// Draw a prize for `wallet` and record it as the wallet's pending award.
    pub fn spin_at(&self, wallet: &Address, now: DateTime<Utc>) -> Result<SpinOutcome> {
        let source = if self.metered {
            let source = self
                .ledger
                .take_spin(wallet, now.date_naive())
                .ok_or_else(|| SpinwheelError::NoSpinsLeft(wallet.to_string()))?;
            Some(source)
        } else {
            None
        };

        let prize = self.selector.draw();
        self.ledger.record_award(wallet, &prize);
        tracing::info!(source = ?source, "{} spun '{}'", wallet, prize);

        Ok(SpinOutcome { prize, source })
    }

    /// Pay `prize` to `wallet`. Token prizes must be the wallet's pending
    /// award from its last spin.
    pub async fn distribute(&self, wallet: &Address, prize: &Prize) -> Result<DistributionOutcome> {
        let payout = self.resolver.resolve(prize)?;

        let amount = match payout {
            Payout::Nothing => {
                self.ledger.take_award(wallet, prize);
                return Ok(DistributionOutcome::NothingToSend);
            }
            Payout::Collectible => {
                self.ledger.take_award(wallet, prize);
                tracing::info!("{} won collectible '{}'", wallet, prize);
                return Ok(DistributionOutcome::Collectible);
            }
            Payout::Transfer(amount) => amount,
        };

        if !self.ledger.take_award(wallet, prize) {
            return Err(SpinwheelError::PrizeNotAwarded {
                wallet: wallet.to_string(),
                prize: prize.to_string(),
            });
        }

        match self.submitter.submit(*wallet, amount).await {
            Ok(result) => {
                if let Some(units) = amount.whole_units(self.resolver.decimals()) {
                    self.ledger.record_payout(units);
                }
                Ok(DistributionOutcome::Transferred(result))
            }
            Err(e) => {
                // Only hand the award back when no tokens can have moved: a
                // reverted transfer, or one the node refused before broadcast.
                // A timeout or a dropped connection may still pay out.
                let nothing_sent = matches!(
                    e,
                    SpinwheelError::Reverted(_)
                        | SpinwheelError::Rpc { .. }
                        | SpinwheelError::Signing(_)
                        | SpinwheelError::InvalidAddress(_)
                        | SpinwheelError::InvalidAmount(_)
                );
                if nothing_sent {
                    self.ledger.restore_award(wallet, prize);
                }
                tracing::error!("Distribution of '{}' to {} failed: {}", prize, wallet, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{MockChain, SendBehavior};
    use crate::ledger::MemoryLedger;
    use crate::prize::{PrizeTable, PrizeTier};
    use crate::reward::{Reward, RewardTable};
    use chrono::TimeZone;

    fn service_with(table: PrizeTable, metered: bool) -> (Arc<MockChain>, Arc<MemoryLedger>, SpinService) {
        let chain = Arc::new(MockChain::new());
        let ledger = Arc::new(MemoryLedger::new());
        let service = SpinService::new(
            PrizeSelector::seeded(table, 42),
            AmountResolver::new(RewardTable::default(), chain.token_decimals()),
            TransferSubmitter::new(chain.clone(), Duration::from_secs(4), Duration::from_secs(2)),
            ledger.clone(),
            metered,
        );
        (chain, ledger, service)
    }

    /// Every draw yields `label`.
    fn always(label: &str) -> PrizeTable {
        PrizeTable::new(Vec::new(), Prize::new(label)).unwrap()
    }

    fn wallet() -> Address {
        Address::from_bytes([0x4e; 20])
    }

    #[tokio::test]
    async fn test_spin_then_distribute_tokens() {
        let (chain, ledger, service) = service_with(always("50 GKY"), false);

        let outcome = service.spin(&wallet()).unwrap();
        assert_eq!(outcome.prize.as_str(), "50 GKY");
        assert_eq!(outcome.source, None);

        let result = service.distribute(&wallet(), &outcome.prize).await.unwrap();
        assert!(matches!(result, DistributionOutcome::Transferred(_)));

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount.whole_units(18), Some(50));
        assert_eq!(ledger.treasury().total_out, 50);

        // the award is spent
        let err = service.distribute(&wallet(), &outcome.prize).await.unwrap_err();
        assert!(matches!(err, SpinwheelError::PrizeNotAwarded { .. }));
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unawarded_prize_is_refused() {
        let (chain, _ledger, service) = service_with(always("10 GKY"), false);
        service.spin(&wallet()).unwrap();

        let err = service
            .distribute(&wallet(), &Prize::new("1000 GKY"))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_no_prize_and_collectibles_never_transfer() {
        let (chain, _ledger, service) = service_with(PrizeTable::default(), false);

        let outcome = service.distribute(&wallet(), &Prize::new("NO PRIZE")).await.unwrap();
        assert!(matches!(outcome, DistributionOutcome::NothingToSend));

        let outcome = service
            .distribute(&wallet(), &Prize::new("NFT STARTER"))
            .await
            .unwrap();
        assert!(matches!(outcome, DistributionOutcome::Collectible));

        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_prize_is_rejected_before_chain() {
        let (chain, _ledger, service) = service_with(PrizeTable::default(), false);
        let err = service
            .distribute(&wallet(), &Prize::new("A PONY"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::UnknownPrize(_)));
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_transfer_restores_award() {
        let (chain, ledger, service) = service_with(always("20 GKY"), false);
        let prize = service.spin(&wallet()).unwrap().prize;

        chain.set_behavior(SendBehavior::Revert);
        let err = service.distribute(&wallet(), &prize).await.unwrap_err();
        assert!(matches!(err, SpinwheelError::Reverted(_)));
        assert_eq!(ledger.pending_award(&wallet()), Some(prize.clone()));
        assert_eq!(ledger.treasury().total_out, 0);

        chain.set_behavior(SendBehavior::Confirm);
        service.distribute(&wallet(), &prize).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_transfer_keeps_award_spent() {
        let (chain, ledger, service) = service_with(always("20 GKY"), false);
        let prize = service.spin(&wallet()).unwrap().prize;

        chain.set_behavior(SendBehavior::Stall);
        let err = service.distribute(&wallet(), &prize).await.unwrap_err();
        assert!(matches!(err, SpinwheelError::Timeout(_)));
        assert_eq!(ledger.pending_award(&wallet()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_receipt_lookup_pays_award_once() {
        let (chain, ledger, service) = service_with(always("1000 GKY"), false);
        let prize = service.spin(&wallet()).unwrap().prize;

        chain.fail_receipt_lookups(1);
        let result = service.distribute(&wallet(), &prize).await.unwrap();
        assert!(matches!(result, DistributionOutcome::Transferred(_)));
        assert_eq!(ledger.pending_award(&wallet()), None);

        let err = service.distribute(&wallet(), &prize).await.unwrap_err();
        assert!(matches!(err, SpinwheelError::PrizeNotAwarded { .. }));
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_outage_after_broadcast_keeps_award_spent() {
        let (chain, ledger, service) = service_with(always("1000 GKY"), false);
        let prize = service.spin(&wallet()).unwrap().prize;

        chain.fail_receipt_lookups(usize::MAX);
        let err = service.distribute(&wallet(), &prize).await.unwrap_err();
        assert!(matches!(err, SpinwheelError::Timeout(_)));
        assert_eq!(ledger.pending_award(&wallet()), None);

        chain.fail_receipt_lookups(0);
        assert!(service.distribute(&wallet(), &prize).await.is_err());
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_node_rejection_restores_award() {
        let (chain, ledger, service) = service_with(always("20 GKY"), false);
        let prize = service.spin(&wallet()).unwrap().prize;

        chain.set_behavior(SendBehavior::Fail);
        let err = service.distribute(&wallet(), &prize).await.unwrap_err();
        assert!(matches!(err, SpinwheelError::Rpc { .. }));
        assert!(chain.sent().is_empty());
        assert_eq!(ledger.pending_award(&wallet()), Some(prize));
    }

    #[test]
    fn test_metered_spins() {
        let (_chain, ledger, service) = service_with(always("NO PRIZE"), true);
        let morning = Utc.with_ymd_and_hms(2024, 5, 6, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 5, 6, 22, 0, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 5, 7, 0, 30, 0).unwrap();

        let outcome = service.spin_at(&wallet(), morning).unwrap();
        assert_eq!(outcome.source, Some(SpinSource::DailyFree));

        let err = service.spin_at(&wallet(), evening).unwrap_err();
        assert!(matches!(err, SpinwheelError::NoSpinsLeft(_)));

        ledger.record_purchase(&wallet(), 1);
        let outcome = service.spin_at(&wallet(), evening).unwrap();
        assert_eq!(outcome.source, Some(SpinSource::Credit));

        let outcome = service.spin_at(&wallet(), next_day).unwrap();
        assert_eq!(outcome.source, Some(SpinSource::DailyFree));
    }

    #[test]
    fn test_from_config_rejects_mismatched_tables() {
        let chain: Arc<dyn ChainClient> = Arc::new(MockChain::new());
        let ledger: Arc<dyn SpinLedger> = Arc::new(MemoryLedger::new());
        let mut config = GameConfig::default();
        config.prizes = PrizeTable::new(
            vec![PrizeTier {
                upper_bound: 50.0,
                prize: Prize::new("7 GKY"),
            }],
            Prize::new("NO PRIZE"),
        )
        .unwrap();

        let result = SpinService::from_config(
            &config,
            chain.clone(),
            ledger.clone(),
            Duration::from_secs(120),
            Duration::from_secs(2),
        );
        assert!(result.is_err());

        config.rewards.insert(Prize::new("7 GKY"), Reward::Tokens(7));
        assert!(SpinService::from_config(
            &config,
            chain,
            ledger,
            Duration::from_secs(120),
            Duration::from_secs(2),
        )
        .is_ok());
    }
}
