use crate::chain::{ChainClient, Receipt};
use crate::error::{Result, SpinwheelError};
use crate::types::{Address, TokenAmount, TransferRequest, TransferResult, TxHash};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Sends token transfers from the distribution account and waits for
/// them to be mined.
///
/// Failed transfers are never retried: a submission that errors on this
/// side may still have been mined. Once a transfer is broadcast, `submit`
/// only fails with `Reverted` or `Timeout`; every other error means the
/// node never accepted it.
pub struct TransferSubmitter {
    chain: Arc<dyn ChainClient>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl TransferSubmitter {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        confirmation_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            chain,
            confirmation_timeout,
            poll_interval,
        }
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// Submit `transfer(recipient, amount)` and wait for a successful receipt.
    pub async fn submit(&self, recipient: Address, amount: TokenAmount) -> Result<TransferResult> {
        if recipient == Address::ZERO {
            return Err(SpinwheelError::InvalidAddress(
                "refusing to transfer to the zero address".to_string(),
            ));
        }
        if amount.is_zero() {
            return Err(SpinwheelError::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }

        let request = TransferRequest::new(recipient, amount);
        tracing::info!(
            request_id = %request.id,
            "Submitting transfer of {} base units to {}",
            amount.base_units(),
            recipient
        );

        let tx_hash = self.chain.send_token_transfer(&request).await?;
        tracing::info!(request_id = %request.id, tx_hash = %tx_hash, "Transfer broadcast");

        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if !receipt.success {
            tracing::error!(request_id = %request.id, tx_hash = %tx_hash, "Transfer reverted");
            return Err(SpinwheelError::Reverted(tx_hash.to_string()));
        }

        tracing::info!(
            request_id = %request.id,
            tx_hash = %tx_hash,
            block = receipt.block_number,
            "Transfer confirmed"
        );

        Ok(TransferResult {
            request_id: request.id,
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            confirmed_at: Utc::now(),
        })
    }

    /// Poll for a receipt until one appears or the confirmation timeout
    /// elapses. Lookup errors are logged and polled through.
    pub async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            match self.chain.receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, "Receipt lookup failed: {}", e);
                }
            }
            if Instant::now() + self.poll_interval > deadline {
                return Err(SpinwheelError::Timeout(format!(
                    "{} not mined within {}s",
                    tx_hash,
                    self.confirmation_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{MockChain, SendBehavior};

    fn submitter(chain: Arc<MockChain>) -> TransferSubmitter {
        TransferSubmitter::new(chain, Duration::from_secs(10), Duration::from_secs(2))
    }

    fn winner() -> Address {
        Address::from_bytes([0x4e; 20])
    }

    #[tokio::test]
    async fn test_submit_confirms() {
        let chain = Arc::new(MockChain::new());
        let result = submitter(chain.clone())
            .submit(winner(), TokenAmount::from_base_units(500))
            .await
            .unwrap();

        assert_eq!(result.block_number, 1);
        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, winner());
        assert_eq!(sent[0].id, result.request_id);
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests_without_sending() {
        let chain = Arc::new(MockChain::new());
        let submitter = submitter(chain.clone());

        let err = submitter
            .submit(winner(), TokenAmount::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::InvalidAmount(_)));

        let err = submitter
            .submit(Address::ZERO, TokenAmount::from_base_units(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::InvalidAddress(_)));

        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_transfer_fails() {
        let chain = Arc::new(MockChain::new());
        chain.set_behavior(SendBehavior::Revert);
        let err = submitter(chain)
            .submit(winner(), TokenAmount::from_base_units(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::Reverted(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_node_rejection_is_reported() {
        let chain = Arc::new(MockChain::new());
        chain.set_behavior(SendBehavior::Fail);
        let err = submitter(chain)
            .submit(winner(), TokenAmount::from_base_units(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::Rpc { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_lookup_errors_are_polled_through() {
        let chain = Arc::new(MockChain::new());
        chain.fail_receipt_lookups(2);
        let result = submitter(chain.clone())
            .submit(winner(), TokenAmount::from_base_units(1))
            .await
            .unwrap();
        assert_eq!(result.block_number, 1);
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_lookups_end_in_timeout() {
        let chain = Arc::new(MockChain::new());
        chain.fail_receipt_lookups(usize::MAX);
        let err = submitter(chain)
            .submit(winner(), TokenAmount::from_base_units(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transfer_times_out() {
        let chain = Arc::new(MockChain::new());
        chain.set_behavior(SendBehavior::Stall);
        let err = submitter(chain.clone())
            .submit(winner(), TokenAmount::from_base_units(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::Timeout(_)));
        // submitted once, never resent
        assert_eq!(chain.sent().len(), 1);
    }
}
