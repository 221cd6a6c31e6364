use crate::chain::{ChainClient, ChainTransaction};
use crate::config::{PurchaseCheck, SpinPack};
use crate::error::{Result, SpinwheelError};
use crate::ledger::SpinLedger;
use crate::types::{Address, TokenAmount, TxHash};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Price of a spin pack and where to pay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub spins: u32,
    /// Whole tokens.
    pub cost: u64,
    pub pay_to: Address,
}

/// Sells extra spins: quotes packs and credits confirmed payments.
pub struct PurchaseDesk {
    chain: Arc<dyn ChainClient>,
    ledger: Arc<dyn SpinLedger>,
    packs: Vec<SpinPack>,
    check: PurchaseCheck,
}

impl PurchaseDesk {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        ledger: Arc<dyn SpinLedger>,
        packs: Vec<SpinPack>,
        check: PurchaseCheck,
    ) -> Self {
        Self {
            chain,
            ledger,
            packs,
            check,
        }
    }

    pub fn packs(&self) -> &[SpinPack] {
        &self.packs
    }

    fn pack(&self, spins: u32) -> Result<SpinPack> {
        self.packs
            .iter()
            .copied()
            .find(|p| p.spins == spins)
            .ok_or(SpinwheelError::InvalidSpinPack(spins))
    }

    fn cost_in_base_units(&self, pack: &SpinPack) -> Result<TokenAmount> {
        TokenAmount::from_units(pack.cost, self.chain.token_decimals())
    }

    pub fn quote(&self, spins: u32) -> Result<Quote> {
        let pack = self.pack(spins)?;
        Ok(Quote {
            spins: pack.spins,
            cost: pack.cost,
            pay_to: self.chain.distribution_address(),
        })
    }

    /// The pack whose price is exactly `amount`, if any.
    pub fn pack_for_amount(&self, amount: TokenAmount) -> Option<SpinPack> {
        self.packs
            .iter()
            .copied()
            .find(|p| self.cost_in_base_units(p).ok() == Some(amount))
    }

    /// Verify the payment `tx_hash` for a `spins` pack and credit `wallet`.
    /// Returns the wallet's new credit count.
    pub async fn confirm(&self, wallet: Address, spins: u32, tx_hash: TxHash) -> Result<u32> {
        let pack = self.pack(spins)?;

        if self.ledger.is_tx_used(&tx_hash) {
            return Err(SpinwheelError::DuplicatePurchase(tx_hash.to_string()));
        }

        let tx = self
            .chain
            .transaction(&tx_hash)
            .await?
            .ok_or_else(|| SpinwheelError::TransactionNotFound(tx_hash.to_string()))?;

        if self.check == PurchaseCheck::Strict {
            self.verify_payment(&tx, &wallet, &pack).await?;
        }

        let credits = self
            .ledger
            .credit_purchase(&wallet, pack.spins, &tx_hash, pack.cost)?;

        tracing::info!(
            tx_hash = %tx_hash,
            "Credited {} spins to {} ({} total)",
            pack.spins,
            wallet,
            credits
        );
        Ok(credits)
    }

    async fn verify_payment(&self, tx: &ChainTransaction, wallet: &Address, pack: &SpinPack) -> Result<()> {
        if tx.from != *wallet {
            return Err(SpinwheelError::purchase_rejected(format!(
                "{} was sent by {}, not {}",
                tx.hash, tx.from, wallet
            )));
        }
        if tx.to != Some(self.chain.token_address()) {
            return Err(SpinwheelError::purchase_rejected(format!(
                "{} is not a call to the token contract",
                tx.hash
            )));
        }

        let (recipient, amount) = tx.token_transfer().ok_or_else(|| {
            SpinwheelError::purchase_rejected(format!("{} is not a token transfer", tx.hash))
        })?;
        if recipient != self.chain.distribution_address() {
            return Err(SpinwheelError::purchase_rejected(format!(
                "{} pays {}, not the distribution account",
                tx.hash, recipient
            )));
        }

        let cost = self.cost_in_base_units(pack)?;
        if amount < cost {
            let decimals = self.chain.token_decimals();
            return Err(SpinwheelError::purchase_rejected(format!(
                "{} pays {} tokens, pack costs {}",
                tx.hash,
                amount.format_units(decimals),
                pack.cost
            )));
        }

        match self.chain.receipt(&tx.hash).await? {
            Some(receipt) if receipt.success => Ok(()),
            Some(_) => Err(SpinwheelError::purchase_rejected(format!(
                "{} reverted",
                tx.hash
            ))),
            None => Err(SpinwheelError::purchase_rejected(format!(
                "{} is not mined yet",
                tx.hash
            ))),
        }
    }
}
