//! Mempool scanner
//!
//! Polls the node's pending pool, filters transactions against the active
//! predicates, and keeps a bounded table of analyzed opportunities.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::chain::ChainClient;
use crate::storage::MempoolRepository;
use crate::utils::config::MempoolConfig;
use crate::utils::logger;
use crate::utils::types::{
    Address, AnalysisResult, ComponentHealth, PendingTransaction, TrackedOpportunity, TxHash,
};

/// Pluggable transaction analysis heuristic
///
/// The scanner only needs the result shape; concrete heuristics are a
/// strategy surface.
#[async_trait]
pub trait TransactionAnalyzer: Send + Sync {
    async fn analyze(&self, tx: &PendingTransaction) -> AnalysisResult;
}

/// Default heuristic: flag high-value transactions, score by value and fee
#[derive(Debug)]
pub struct ValueHeuristicAnalyzer {
    /// Minimum value in wei for a transaction to be considered interesting
    pub min_interesting_value: u128,
}

impl Default for ValueHeuristicAnalyzer {
    fn default() -> Self {
        Self {
            // 1 native unit
            min_interesting_value: 1_000_000_000_000_000_000,
        }
    }
}

#[async_trait]
impl TransactionAnalyzer for ValueHeuristicAnalyzer {
    async fn analyze(&self, tx: &PendingTransaction) -> AnalysisResult {
        if tx.value < self.min_interesting_value {
            return AnalysisResult::uninteresting();
        }

        let priority = (tx.value / self.min_interesting_value).min(u32::MAX as u128) as u32;

        AnalysisResult {
            is_interesting: true,
            reason: "value above tracking threshold".to_string(),
            priority,
            // Placeholder estimate until simulation prices the opportunity
            estimated_profit: Decimal::ZERO,
        }
    }
}

/// Partial update to the active filter set
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub min_value: Option<u128>,
    pub min_gas_price: Option<u64>,
    pub target_contracts: Option<Vec<Address>>,
}

#[derive(Debug, Clone)]
struct FilterSet {
    min_value: u128,
    min_gas_price: u64,
    target_contracts: Vec<Address>,
}

#[derive(Debug, Default)]
struct TrackedTable {
    entries: HashMap<TxHash, TrackedOpportunity>,
    insertion_order: VecDeque<TxHash>,
}

/// Mempool scanning and opportunity tracking component
pub struct MempoolScanner {
    config: MempoolConfig,
    chain: Arc<dyn ChainClient>,
    repository: Arc<dyn MempoolRepository>,
    analyzer: Arc<dyn TransactionAnalyzer>,
    filters: Arc<RwLock<FilterSet>>,
    tracked: Arc<RwLock<TrackedTable>>,
    running: Arc<RwLock<bool>>,
    error_count: Arc<RwLock<u64>>,
    last_scan_unix: Arc<RwLock<u64>>,
}

impl MempoolScanner {
    pub fn new(
        config: MempoolConfig,
        chain: Arc<dyn ChainClient>,
        repository: Arc<dyn MempoolRepository>,
        analyzer: Arc<dyn TransactionAnalyzer>,
    ) -> Self {
        let filters = FilterSet {
            min_value: config.min_value,
            min_gas_price: config.min_gas_price,
            target_contracts: config.target_contracts.clone(),
        };

        Self {
            config,
            chain,
            repository,
            analyzer,
            filters: Arc::new(RwLock::new(filters)),
            tracked: Arc::new(RwLock::new(TrackedTable::default())),
            running: Arc::new(RwLock::new(false)),
            error_count: Arc::new(RwLock::new(0)),
            last_scan_unix: Arc::new(RwLock::new(0)),
        }
    }

    /// Apply the filter predicates, preserving input order
    ///
    /// Pure predicate evaluation; no side effects on rejection.
    pub async fn scan(&self, raw: &[PendingTransaction]) -> Vec<PendingTransaction> {
        let filters = self.filters.read().await;
        raw.iter()
            .filter(|tx| Self::matches(&filters, tx))
            .cloned()
            .collect()
    }

    fn matches(filters: &FilterSet, tx: &PendingTransaction) -> bool {
        if tx.value < filters.min_value {
            return false;
        }

        if tx.gas_price < filters.min_gas_price {
            return false;
        }

        if !filters.target_contracts.is_empty() {
            match &tx.to {
                Some(to) if filters.target_contracts.contains(to) => {}
                _ => return false,
            }
        }

        true
    }

    /// Persist and analyze filtered transactions, tracking the interesting ones
    pub async fn process(&self, transactions: &[PendingTransaction]) {
        for tx in transactions {
            if let Err(e) = self.repository.save_transaction(tx).await {
                error!(tx_hash = %tx.hash, error = %e, "Failed to persist mempool transaction");
            }

            let analysis = self.analyzer.analyze(tx).await;
            if !analysis.is_interesting {
                continue;
            }

            logger::log_opportunity_detected(
                tx.hash.as_str(),
                &analysis.reason,
                analysis.priority,
                analysis.estimated_profit.to_f64().unwrap_or(0.0),
            );

            let mut tracked = self.tracked.write().await;
            if tracked.entries.insert(
                tx.hash.clone(),
                TrackedOpportunity {
                    transaction: tx.clone(),
                    analysis,
                    discovered_at: Utc::now(),
                },
            ).is_none() {
                tracked.insertion_order.push_back(tx.hash.clone());
            }

            // Bounded history: evict oldest first.
            while tracked.entries.len() > self.config.max_tracked {
                if let Some(oldest) = tracked.insertion_order.pop_front() {
                    tracked.entries.remove(&oldest);
                } else {
                    break;
                }
            }
        }
    }

    /// Merge new filter values into the active configuration
    pub async fn update_filters(&self, update: FilterUpdate) {
        let mut filters = self.filters.write().await;

        if let Some(min_value) = update.min_value {
            filters.min_value = min_value;
        }
        if let Some(min_gas_price) = update.min_gas_price {
            filters.min_gas_price = min_gas_price;
        }
        if let Some(contracts) = update.target_contracts {
            filters.target_contracts = contracts;
        }

        info!("Transaction filters updated");
    }

    /// Snapshot of tracked opportunities
    pub async fn tracked_opportunities(&self) -> Vec<TrackedOpportunity> {
        let tracked = self.tracked.read().await;
        tracked
            .insertion_order
            .iter()
            .filter_map(|hash| tracked.entries.get(hash).cloned())
            .collect()
    }

    /// Remove and return an opportunity consumed by a bundle
    pub async fn consume_opportunity(&self, hash: &TxHash) -> Option<TrackedOpportunity> {
        let mut tracked = self.tracked.write().await;
        let entry = tracked.entries.remove(hash);
        if entry.is_some() {
            tracked.insertion_order.retain(|h| h != hash);
        }
        entry
    }

    /// Run the periodic scan loop until stopped
    ///
    /// Errors during one iteration are logged and the loop backs off to the
    /// next interval rather than terminating.
    pub async fn run_scan_loop(&self) {
        *self.running.write().await = true;
        info!(
            interval_secs = self.config.scan_interval_secs,
            "Mempool scanner started"
        );

        let interval = Duration::from_secs_f64(self.config.scan_interval_secs);

        while *self.running.read().await {
            match self.chain.pending_transactions().await {
                Ok(raw) => {
                    let filtered = self.scan(&raw).await;
                    self.process(&filtered).await;
                    *self.last_scan_unix.write().await = unix_now();
                }
                Err(e) => {
                    *self.error_count.write().await += 1;
                    error!(error = %e, "Mempool scan iteration failed");
                }
            }

            tokio::time::sleep(interval).await;
        }

        info!("Mempool scanner stopped");
    }

    /// Stop scheduling further scan iterations
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    /// Health check for monitoring
    pub async fn health_check(&self) -> ComponentHealth {
        let last_active = *self.last_scan_unix.read().await;
        let error_count = *self.error_count.read().await;
        let now = unix_now();
        let stale_after = (self.config.scan_interval_secs * 10.0).max(60.0) as u64;
        let healthy = last_active > 0 && now.saturating_sub(last_active) < stale_after;

        ComponentHealth {
            healthy,
            last_active,
            error_count,
            status_message: if healthy {
                "mempool scanner active".to_string()
            } else {
                "mempool scanner inactive".to_string()
            },
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
