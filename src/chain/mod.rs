//! Chain node collaborator interfaces
//!
//! The core never speaks a wire protocol directly; it goes through the
//! traits defined here. `rpc` provides the JSON-RPC implementation used
//! by the binary.

pub mod rpc;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::types::{Address, BundleCandidate, PendingTransaction, TxHash};

/// Errors surfaced by chain node collaborators
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("node returned malformed response: {0}")]
    Malformed(String),

    #[error("timed out waiting for receipt of {0}")]
    ReceiptTimeout(TxHash),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// A signed, submit-ready transaction payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub hash: TxHash,
    pub raw: Vec<u8>,
}

/// Mined transaction receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
}

/// Read/write access to a chain node
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Transactions currently in the node's pending pool
    async fn pending_transactions(&self) -> Result<Vec<PendingTransaction>, ChainError>;

    /// Current gas price in wei
    async fn gas_price(&self) -> Result<u64, ChainError>;

    /// Latest block base fee in wei
    async fn base_fee(&self) -> Result<u64, ChainError>;

    /// Gas estimate for a transaction
    async fn estimate_gas(&self, tx: &PendingTransaction) -> Result<u64, ChainError>;

    /// Submit a signed transaction, returning its hash
    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<TxHash, ChainError>;

    /// Block until the transaction is mined or the timeout elapses
    async fn wait_for_receipt(
        &self,
        hash: &TxHash,
        timeout: Duration,
    ) -> Result<Receipt, ChainError>;

    /// Confirmed transaction count (next nonce) for an address
    async fn transaction_count(&self, address: &Address) -> Result<u64, ChainError>;
}

/// Holds key material outside the core and signs raw transactions
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, tx: &PendingTransaction) -> Result<SignedTransaction, ChainError>;
}

/// Result of simulating a bundle before submission
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub success: bool,
    pub profit: Decimal,
    pub error: Option<String>,
}

/// Bundle simulation collaborator
///
/// Profit estimation feeds bundle metrics; full simulation gates each
/// submission attempt.
#[async_trait]
pub trait BundleSimulator: Send + Sync {
    /// Estimated profit for a candidate transaction set, in native units
    async fn estimate_profit(&self, transactions: &[PendingTransaction]) -> Decimal;

    /// Simulate the ordered bundle against current chain state
    async fn simulate(&self, bundle: &BundleCandidate) -> SimulationReport;
}

/// Signer for dry-run operation: produces an unsigned payload
///
/// Real key management lives outside the core; this stand-in lets the
/// pipeline run end to end without key material. Submissions built from
/// it are rejected by any real node.
#[derive(Debug, Default)]
pub struct DryRunSigner;

#[async_trait]
impl Signer for DryRunSigner {
    async fn sign(&self, tx: &PendingTransaction) -> Result<SignedTransaction, ChainError> {
        let raw = serde_json::to_vec(tx).map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(SignedTransaction {
            hash: tx.hash.clone(),
            raw,
        })
    }
}

/// Simulator stand-in until a real simulation backend is wired
///
/// Estimates zero profit, which keeps every bundle below the profit
/// threshold; safe default for dry-run deployments.
#[derive(Debug, Default)]
pub struct NullSimulator;

#[async_trait]
impl BundleSimulator for NullSimulator {
    async fn estimate_profit(&self, _transactions: &[PendingTransaction]) -> Decimal {
        Decimal::ZERO
    }

    async fn simulate(&self, _bundle: &BundleCandidate) -> SimulationReport {
        SimulationReport {
            success: true,
            profit: Decimal::ZERO,
            error: None,
        }
    }
}
