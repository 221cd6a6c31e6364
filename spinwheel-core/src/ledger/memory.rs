use crate::error::{Result, SpinwheelError};
use crate::ledger::{SpinLedger, SpinSource};
use crate::prize::Prize;
use crate::types::{Address, TreasuryReport, TxHash};
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct LedgerState {
    credits: HashMap<Address, u32>,
    used_txs: HashSet<TxHash>,
    last_free_spin: HashMap<Address, NaiveDate>,
    awards: HashMap<Address, Prize>,
    total_in: u64,
    total_out: u64,
}

/// [`SpinLedger`] kept in process memory; lost on restart.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpinLedger for MemoryLedger {
    fn credits(&self, wallet: &Address) -> u32 {
        self.state.read().credits.get(wallet).copied().unwrap_or(0)
    }

    fn record_purchase(&self, wallet: &Address, spins: u32) -> u32 {
        let mut state = self.state.write();
        let credits = state.credits.entry(*wallet).or_insert(0);
        *credits = credits.saturating_add(spins);
        *credits
    }

    fn credit_purchase(&self, wallet: &Address, spins: u32, tx_hash: &TxHash, cost: u64) -> Result<u32> {
        let mut state = self.state.write();
        if !state.used_txs.insert(*tx_hash) {
            return Err(SpinwheelError::DuplicatePurchase(tx_hash.to_string()));
        }
        state.total_in = state.total_in.saturating_add(cost);
        let credits = state.credits.entry(*wallet).or_insert(0);
        *credits = credits.saturating_add(spins);
        Ok(*credits)
    }

    fn is_tx_used(&self, tx_hash: &TxHash) -> bool {
        self.state.read().used_txs.contains(tx_hash)
    }

    fn take_spin(&self, wallet: &Address, day: NaiveDate) -> Option<SpinSource> {
        let mut state = self.state.write();
        if state.last_free_spin.get(wallet) != Some(&day) {
            state.last_free_spin.insert(*wallet, day);
            return Some(SpinSource::DailyFree);
        }
        match state.credits.get_mut(wallet) {
            Some(credits) if *credits > 0 => {
                *credits -= 1;
                Some(SpinSource::Credit)
            }
            _ => None,
        }
    }

    fn record_award(&self, wallet: &Address, prize: &Prize) {
        self.state.write().awards.insert(*wallet, prize.clone());
    }

    fn pending_award(&self, wallet: &Address) -> Option<Prize> {
        self.state.read().awards.get(wallet).cloned()
    }

    fn take_award(&self, wallet: &Address, prize: &Prize) -> bool {
        let mut state = self.state.write();
        if state.awards.get(wallet) == Some(prize) {
            state.awards.remove(wallet);
            true
        } else {
            false
        }
    }

    fn restore_award(&self, wallet: &Address, prize: &Prize) {
        self.state
            .write()
            .awards
            .entry(*wallet)
            .or_insert_with(|| prize.clone());
    }

    fn record_payout(&self, amount: u64) {
        let mut state = self.state.write();
        state.total_out = state.total_out.saturating_add(amount);
    }

    fn treasury(&self) -> TreasuryReport {
        let state = self.state.read();
        TreasuryReport::new(state.total_in, state.total_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn wallet(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn hash(byte: u8) -> TxHash {
        TxHash::from_bytes([byte; 32])
    }

    #[test]
    fn test_credits_start_at_zero_and_accumulate() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.credits(&wallet(1)), 0);
        assert_eq!(ledger.record_purchase(&wallet(1), 3), 3);
        assert_eq!(ledger.record_purchase(&wallet(1), 10), 13);
        assert_eq!(ledger.credits(&wallet(2)), 0);
    }

    #[test]
    fn test_purchase_tx_credits_once() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.credit_purchase(&wallet(1), 3, &hash(9), 125).unwrap(), 3);
        assert!(ledger.is_tx_used(&hash(9)));

        let err = ledger
            .credit_purchase(&wallet(2), 3, &hash(9), 125)
            .unwrap_err();
        assert!(matches!(err, SpinwheelError::DuplicatePurchase(_)));
        assert_eq!(ledger.credits(&wallet(2)), 0);
        assert_eq!(ledger.treasury().total_in, 125);
    }

    #[test]
    fn test_concurrent_credits_are_not_lost() {
        let ledger = Arc::new(MemoryLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        ledger.record_purchase(&wallet(1), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.credits(&wallet(1)), 8000);
    }

    #[test]
    fn test_daily_free_spin_then_credits() {
        let ledger = MemoryLedger::new();
        let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let tuesday = monday.succ_opt().unwrap();

        assert_eq!(ledger.take_spin(&wallet(1), monday), Some(SpinSource::DailyFree));
        assert_eq!(ledger.take_spin(&wallet(1), monday), None);

        ledger.record_purchase(&wallet(1), 1);
        assert_eq!(ledger.take_spin(&wallet(1), monday), Some(SpinSource::Credit));
        assert_eq!(ledger.take_spin(&wallet(1), monday), None);

        assert_eq!(ledger.take_spin(&wallet(1), tuesday), Some(SpinSource::DailyFree));
    }

    #[test]
    fn test_awards_are_taken_once() {
        let ledger = MemoryLedger::new();
        let prize = Prize::new("50 GKY");
        ledger.record_award(&wallet(1), &prize);

        assert!(!ledger.take_award(&wallet(1), &Prize::new("1000 GKY")));
        assert!(!ledger.take_award(&wallet(2), &prize));
        assert!(ledger.take_award(&wallet(1), &prize));
        assert!(!ledger.take_award(&wallet(1), &prize));

        ledger.restore_award(&wallet(1), &prize);
        assert_eq!(ledger.pending_award(&wallet(1)), Some(prize));
    }

    #[test]
    fn test_restore_keeps_newer_award() {
        let ledger = MemoryLedger::new();
        let old = Prize::new("50 GKY");
        let newer = Prize::new("10 GKY");
        ledger.record_award(&wallet(1), &old);
        assert!(ledger.take_award(&wallet(1), &old));

        // wallet spun again while the first payout was in flight
        ledger.record_award(&wallet(1), &newer);
        ledger.restore_award(&wallet(1), &old);
        assert_eq!(ledger.pending_award(&wallet(1)), Some(newer));
    }

    #[test]
    fn test_treasury_totals() {
        let ledger = MemoryLedger::new();
        ledger.credit_purchase(&wallet(1), 1, &hash(1), 50).unwrap();
        ledger.record_payout(100);
        ledger.record_payout(10);
        let report = ledger.treasury();
        assert_eq!(report.total_in, 50);
        assert_eq!(report.total_out, 110);
        assert_eq!(report.balance, -60);
    }
}
