//! Common types shared across the bot
//!
//! This module defines the data model exchanged between the mempool
//! scanner, bundle builder, risk gate, and strategy executor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account address on the target chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A transaction observed in the pending pool, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    /// Value transferred, in wei
    pub value: u128,
    /// Gas price offered, in wei
    pub gas_price: u64,
    pub gas_limit: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
}

/// Outcome of analyzing a pending transaction for interestingness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_interesting: bool,
    pub reason: String,
    pub priority: u32,
    pub estimated_profit: Decimal,
}

impl AnalysisResult {
    /// Result for a transaction not worth tracking
    pub fn uninteresting() -> Self {
        Self {
            is_interesting: false,
            reason: String::new(),
            priority: 0,
            estimated_profit: Decimal::ZERO,
        }
    }
}

/// A mempool transaction flagged for tracking, with its analysis
#[derive(Debug, Clone)]
pub struct TrackedOpportunity {
    pub transaction: PendingTransaction,
    pub analysis: AnalysisResult,
    pub discovered_at: DateTime<Utc>,
}

/// Aggregate metrics for a transaction bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleMetrics {
    pub total_gas: u64,
    pub total_value: u128,
    pub transaction_count: usize,
    /// Expected profit in the chain's native unit
    pub expected_profit: Decimal,
    pub risk_score: Decimal,
}

/// Lifecycle status of a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleStatus {
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

/// An ordered, validated, metric-annotated set of transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleCandidate {
    pub id: String,
    pub transactions: Vec<PendingTransaction>,
    pub metrics: BundleMetrics,
    pub status: BundleStatus,
    pub created_at: DateTime<Utc>,
    /// Opportunistic bundles use the short receipt timeout
    pub opportunistic: bool,
}

/// Execution lifecycle states; Completed and Failed are terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Initializing,
    Running,
    Completed,
    Failed { reason: String },
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Record of one strategy invocation
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub id: String,
    pub strategy: String,
    pub params: serde_json::Value,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<ExecutionOutcome>,
}

/// Successful execution payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub profit: Decimal,
    pub gas_used: u64,
    pub transaction_hashes: Vec<TxHash>,
}

/// Why the risk gate rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskRejection {
    RateLimitExceeded,
    PositionSizeExceeded,
    GasPriceExceeded,
}

impl std::fmt::Display for RiskRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::RateLimitExceeded => "rate limit exceeded",
            Self::PositionSizeExceeded => "position size exceeds limit",
            Self::GasPriceExceeded => "gas price too high",
        };
        f.write_str(msg)
    }
}

/// Overall risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Transient result of one risk gate evaluation
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub approved: bool,
    pub reason: Option<RiskRejection>,
    pub risk_level: RiskLevel,
}

impl RiskAssessment {
    pub fn approved(level: RiskLevel) -> Self {
        Self {
            approved: true,
            reason: None,
            risk_level: level,
        }
    }

    pub fn rejected(reason: RiskRejection, level: RiskLevel) -> Self {
        Self {
            approved: false,
            reason: Some(reason),
            risk_level: level,
        }
    }
}

/// Gas price priority tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityTier {
    Low,
    Medium,
    High,
    Urgent,
}

impl PriorityTier {
    /// Base-fee multiplier for this tier
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Low => 1.1,
            Self::Medium => 1.3,
            Self::High => 1.5,
            Self::Urgent => 2.0,
        }
    }
}

/// Health status for components
#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub last_active: u64,
    pub error_count: u64,
    pub status_message: String,
}

/// Engine-wide health status
#[derive(Debug, Clone)]
pub struct EngineHealth {
    pub overall_healthy: bool,
    pub mempool: ComponentHealth,
    pub gas: ComponentHealth,
}
