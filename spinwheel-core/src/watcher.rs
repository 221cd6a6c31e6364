use crate::chain::{ChainClient, ChainTransaction};
use crate::error::{Result, SpinwheelError};
use crate::ledger::SpinLedger;
use crate::purchase::PurchaseDesk;
use futures::{stream, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Blocks fetched per poll. A watcher that falls further behind catches
/// up over several polls.
pub const MAX_BLOCKS_PER_POLL: u64 = 50;

const CONCURRENT_BLOCK_FETCHES: usize = 4;

/// Credits spins for token transfers to the distribution account whose
/// value is exactly a pack price, without waiting for `confirmbuy`.
pub struct PaymentWatcher {
    chain: Arc<dyn ChainClient>,
    ledger: Arc<dyn SpinLedger>,
    desk: Arc<PurchaseDesk>,
    last_block: Mutex<Option<u64>>,
}

impl PaymentWatcher {
    pub fn new(chain: Arc<dyn ChainClient>, ledger: Arc<dyn SpinLedger>, desk: Arc<PurchaseDesk>) -> Self {
        Self {
            chain,
            ledger,
            desk,
            last_block: Mutex::new(None),
        }
    }

    pub fn last_block(&self) -> Option<u64> {
        *self.last_block.lock()
    }

    /// Scan blocks mined since the previous poll. The first poll only
    /// records the current head. Returns the number of purchases credited.
    pub async fn poll_once(&self) -> Result<usize> {
        let head = self.chain.block_number().await?;

        let Some(last) = self.last_block() else {
            tracing::info!("Payment watcher starting at block {}", head);
            *self.last_block.lock() = Some(head);
            return Ok(0);
        };
        if head <= last {
            return Ok(0);
        }

        let from = last + 1;
        let to = head.min(last + MAX_BLOCKS_PER_POLL);
        let chain = self.chain.clone();
        let blocks: Vec<Vec<ChainTransaction>> = stream::iter(from..=to)
            .map(|number| {
                let chain = chain.clone();
                async move { chain.block_transactions(number).await }
            })
            .buffered(CONCURRENT_BLOCK_FETCHES)
            .try_collect()
            .await?;

        let mut credited = 0;
        for tx in blocks.iter().flatten() {
            if self.credit_if_payment(tx).await? {
                credited += 1;
            }
        }

        *self.last_block.lock() = Some(to);
        tracing::debug!("Scanned blocks {}..={}, {} purchases credited", from, to, credited);
        Ok(credited)
    }

    async fn credit_if_payment(&self, tx: &ChainTransaction) -> Result<bool> {
        if tx.to != Some(self.chain.token_address()) {
            return Ok(false);
        }
        let Some((recipient, amount)) = tx.token_transfer() else {
            return Ok(false);
        };
        if recipient != self.chain.distribution_address() {
            return Ok(false);
        }
        let Some(pack) = self.desk.pack_for_amount(amount) else {
            tracing::debug!(tx_hash = %tx.hash, "Transfer to distribution account matches no pack");
            return Ok(false);
        };
        if self.ledger.is_tx_used(&tx.hash) {
            return Ok(false);
        }
        match self.chain.receipt(&tx.hash).await? {
            Some(receipt) if receipt.success => {}
            _ => return Ok(false),
        }

        match self
            .ledger
            .credit_purchase(&tx.from, pack.spins, &tx.hash, pack.cost)
        {
            Ok(credits) => {
                tracing::info!(
                    tx_hash = %tx.hash,
                    "Auto-credited {} spins to {} ({} total)",
                    pack.spins,
                    tx.from,
                    credits
                );
                Ok(true)
            }
            // confirmbuy got there first
            Err(SpinwheelError::DuplicatePurchase(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Poll every `interval` until `shutdown` flips to true. Poll errors
    /// are logged and retried on the next tick.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Payment watcher stopped");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::warn!("Payment watcher poll failed: {}", e);
                    }
                }
            }
        }
    }
}
