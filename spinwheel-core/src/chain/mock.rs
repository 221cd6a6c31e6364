//! In-memory [`ChainClient`] for tests.

use crate::chain::{abi, ChainClient, ChainTransaction, Receipt};
use crate::error::{Result, SpinwheelError};
use crate::types::{Address, TokenAmount, TransferRequest, TxHash};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// How the mock answers receipt queries for transfers it sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBehavior {
    /// Mined immediately with a successful receipt.
    Confirm,
    /// Mined immediately but reverted.
    Revert,
    /// Accepted but never mined.
    Stall,
    /// Rejected by the node.
    Fail,
}

#[derive(Default)]
struct MockState {
    sent: Vec<TransferRequest>,
    receipts: HashMap<TxHash, Receipt>,
    transactions: HashMap<TxHash, ChainTransaction>,
    blocks: HashMap<u64, Vec<ChainTransaction>>,
    head: u64,
    balance: TokenAmount,
    counter: u64,
    receipt_failures: usize,
}

pub struct MockChain {
    distribution: Address,
    token: Address,
    decimals: u8,
    behavior: Mutex<SendBehavior>,
    state: Mutex<MockState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            distribution: Address::from_bytes([0xd1; 20]),
            token: Address::from_bytes([0x70; 20]),
            decimals: 18,
            behavior: Mutex::new(SendBehavior::Confirm),
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn set_behavior(&self, behavior: SendBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn set_balance(&self, balance: TokenAmount) {
        self.state.lock().balance = balance;
    }

    /// Make the next `count` receipt lookups fail as a rate-limited node
    /// would.
    pub fn fail_receipt_lookups(&self, count: usize) {
        self.state.lock().receipt_failures = count;
    }

    /// Transfers submitted through [`ChainClient::send_token_transfer`].
    pub fn sent(&self) -> Vec<TransferRequest> {
        self.state.lock().sent.clone()
    }

    fn next_hash(state: &mut MockState) -> TxHash {
        state.counter += 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&state.counter.to_be_bytes());
        TxHash::from_bytes(bytes)
    }

    /// Mine a token transfer from `from` to `to` in a new block and return
    /// the transaction.
    pub fn mine_token_transfer(&self, from: Address, to: Address, amount: TokenAmount) -> ChainTransaction {
        self.mine_call(from, self.token, abi::encode_transfer(&to, amount), true)
    }

    /// Mine an arbitrary call in a new block.
    pub fn mine_call(&self, from: Address, to: Address, input: Vec<u8>, success: bool) -> ChainTransaction {
        let mut state = self.state.lock();
        let hash = Self::next_hash(&mut state);
        state.head += 1;
        let block_number = state.head;

        let tx = ChainTransaction {
            hash,
            from,
            to: Some(to),
            value: 0,
            input,
            block_number: Some(block_number),
        };
        state.transactions.insert(hash, tx.clone());
        state.receipts.insert(
            hash,
            Receipt {
                tx_hash: hash,
                block_number,
                gas_used: 52_000,
                success,
            },
        );
        state.blocks.entry(block_number).or_default().push(tx.clone());
        tx
    }

    /// Advance the head by `count` empty blocks.
    pub fn mine_empty(&self, count: u64) {
        self.state.lock().head += count;
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn distribution_address(&self) -> Address {
        self.distribution
    }

    fn token_address(&self) -> Address {
        self.token
    }

    fn token_decimals(&self) -> u8 {
        self.decimals
    }

    fn chain_id(&self) -> u64 {
        31337
    }

    async fn send_token_transfer(&self, request: &TransferRequest) -> Result<TxHash> {
        let behavior = *self.behavior.lock();
        if behavior == SendBehavior::Fail {
            return Err(SpinwheelError::Rpc {
                code: -32000,
                message: "insufficient funds for gas * price + value".to_string(),
            });
        }

        let mut state = self.state.lock();
        state.sent.push(request.clone());
        let hash = Self::next_hash(&mut state);

        let tx = ChainTransaction {
            hash,
            from: self.distribution,
            to: Some(self.token),
            value: 0,
            input: abi::encode_transfer(&request.recipient, request.amount),
            block_number: None,
        };
        state.transactions.insert(hash, tx);

        if behavior != SendBehavior::Stall {
            state.head += 1;
            let block_number = state.head;
            state.receipts.insert(
                hash,
                Receipt {
                    tx_hash: hash,
                    block_number,
                    gas_used: 51_000,
                    success: behavior == SendBehavior::Confirm,
                },
            );
            if let Some(tx) = state.transactions.get_mut(&hash) {
                tx.block_number = Some(block_number);
            }
        }

        Ok(hash)
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        let mut state = self.state.lock();
        if state.receipt_failures > 0 {
            state.receipt_failures -= 1;
            return Err(SpinwheelError::Rpc {
                code: -32005,
                message: "limit exceeded".to_string(),
            });
        }
        Ok(state.receipts.get(hash).cloned())
    }

    async fn transaction(&self, hash: &TxHash) -> Result<Option<ChainTransaction>> {
        Ok(self.state.lock().transactions.get(hash).cloned())
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().head)
    }

    async fn block_transactions(&self, number: u64) -> Result<Vec<ChainTransaction>> {
        let state = self.state.lock();
        if number > state.head {
            return Err(SpinwheelError::decode(format!("block {} is not available", number)));
        }
        Ok(state.blocks.get(&number).cloned().unwrap_or_default())
    }

    async fn token_balance(&self, _owner: &Address) -> Result<TokenAmount> {
        Ok(self.state.lock().balance)
    }
}
