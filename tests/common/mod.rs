//! Shared test doubles for the integration suite

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use mev_bundler::chain::{
    BundleSimulator, ChainClient, ChainError, Receipt, SignedTransaction, SimulationReport,
};
use mev_bundler::utils::types::{Address, BundleCandidate, PendingTransaction, TxHash};

pub const GWEI: u64 = 1_000_000_000;
pub const ETH: u128 = 1_000_000_000_000_000_000;

/// Build a pending transaction with the fields the pipeline cares about
pub fn tx(
    hash: &str,
    from: &str,
    to: Option<&str>,
    value: u128,
    gas_price: u64,
    nonce: u64,
) -> PendingTransaction {
    PendingTransaction {
        hash: TxHash::from(hash),
        from: Address::from(from),
        to: to.map(Address::from),
        value,
        gas_price,
        gas_limit: 21_000,
        nonce,
        data: Vec::new(),
    }
}

/// Chain client double with switchable failure modes and a send log
pub struct MockChainClient {
    pub gas_price_wei: AtomicU64,
    pub base_fee_wei: AtomicU64,
    pub gas_price_fails: AtomicBool,
    pub base_fee_fails: AtomicBool,
    pub estimate_fails: AtomicBool,
    pub gas_estimate: AtomicU64,
    pub next_nonce: AtomicU64,
    pub receipt_success: AtomicBool,
    pub receipt_gas_used: AtomicU64,
    pub pending: Mutex<Vec<PendingTransaction>>,
    pub sent: Mutex<Vec<SignedTransaction>>,
}

impl MockChainClient {
    pub fn new(gas_price_wei: u64, base_fee_wei: u64) -> Self {
        Self {
            gas_price_wei: AtomicU64::new(gas_price_wei),
            base_fee_wei: AtomicU64::new(base_fee_wei),
            gas_price_fails: AtomicBool::new(false),
            base_fee_fails: AtomicBool::new(false),
            estimate_fails: AtomicBool::new(false),
            gas_estimate: AtomicU64::new(21_000),
            next_nonce: AtomicU64::new(0),
            receipt_success: AtomicBool::new(true),
            receipt_gas_used: AtomicU64::new(21_000),
            pending: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn pending_transactions(&self) -> Result<Vec<PendingTransaction>, ChainError> {
        Ok(self.pending.lock().await.clone())
    }

    async fn gas_price(&self) -> Result<u64, ChainError> {
        if self.gas_price_fails.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("gas price unavailable".to_string()));
        }
        Ok(self.gas_price_wei.load(Ordering::SeqCst))
    }

    async fn base_fee(&self) -> Result<u64, ChainError> {
        if self.base_fee_fails.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("base fee unavailable".to_string()));
        }
        Ok(self.base_fee_wei.load(Ordering::SeqCst))
    }

    async fn estimate_gas(&self, _tx: &PendingTransaction) -> Result<u64, ChainError> {
        if self.estimate_fails.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("estimation unavailable".to_string()));
        }
        Ok(self.gas_estimate.load(Ordering::SeqCst))
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<TxHash, ChainError> {
        self.sent.lock().await.push(tx.clone());
        Ok(tx.hash.clone())
    }

    async fn wait_for_receipt(
        &self,
        hash: &TxHash,
        _timeout: Duration,
    ) -> Result<Receipt, ChainError> {
        Ok(Receipt {
            transaction_hash: hash.clone(),
            block_number: 1,
            gas_used: self.receipt_gas_used.load(Ordering::SeqCst),
            success: self.receipt_success.load(Ordering::SeqCst),
        })
    }

    async fn transaction_count(&self, _address: &Address) -> Result<u64, ChainError> {
        Ok(self.next_nonce.load(Ordering::SeqCst))
    }
}

/// Simulator double with fixed profit, switchable outcome, and call counters
pub struct MockSimulator {
    pub profit: Decimal,
    pub succeed: AtomicBool,
    pub estimate_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,
}

impl MockSimulator {
    pub fn new(profit: Decimal, succeed: bool) -> Self {
        Self {
            profit,
            succeed: AtomicBool::new(succeed),
            estimate_calls: AtomicUsize::new(0),
            simulate_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BundleSimulator for MockSimulator {
    async fn estimate_profit(&self, _transactions: &[PendingTransaction]) -> Decimal {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        self.profit
    }

    async fn simulate(&self, _bundle: &BundleCandidate) -> SimulationReport {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed.load(Ordering::SeqCst) {
            SimulationReport {
                success: true,
                profit: self.profit,
                error: None,
            }
        } else {
            SimulationReport {
                success: false,
                profit: Decimal::ZERO,
                error: Some("state changed under bundle".to_string()),
            }
        }
    }
}
