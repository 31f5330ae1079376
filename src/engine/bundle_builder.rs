//! Bundle construction
//!
//! Turns a candidate transaction set into a validated, dependency-ordered,
//! metric-annotated bundle, or rejects it. Safe to call speculatively:
//! every failure path inside `create_bundle` resolves to "no bundle
//! produced" rather than an error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::chain::BundleSimulator;
use crate::storage::BundleRepository;
use crate::utils::config::BundleConfig;
use crate::utils::logger;
use crate::utils::types::{
    BundleCandidate, BundleMetrics, BundleStatus, PendingTransaction,
};

/// Bundle construction component
pub struct BundleBuilder {
    config: BundleConfig,
    simulator: Arc<dyn BundleSimulator>,
    repository: Arc<dyn BundleRepository>,
    active_bundles: RwLock<HashMap<String, BundleCandidate>>,
    bundles_created: RwLock<u64>,
    bundles_rejected: RwLock<u64>,
}

impl BundleBuilder {
    pub fn new(
        config: BundleConfig,
        simulator: Arc<dyn BundleSimulator>,
        repository: Arc<dyn BundleRepository>,
    ) -> Self {
        Self {
            config,
            simulator,
            repository,
            active_bundles: RwLock::new(HashMap::new()),
            bundles_created: RwLock::new(0),
            bundles_rejected: RwLock::new(0),
        }
    }

    /// Build a bundle from a candidate transaction set
    ///
    /// Returns `None` for every rejection: invalid input, nonce conflicts,
    /// below-threshold profit, or a storage failure. A below-threshold
    /// result is a normal outcome, not an error. Opportunistic bundles get
    /// the short receipt timeout downstream.
    pub async fn create_bundle(
        &self,
        transactions: Vec<PendingTransaction>,
        opportunistic: bool,
    ) -> Option<BundleCandidate> {
        if !self.validate_transactions(&transactions) {
            warn!(count = transactions.len(), "Invalid transaction bundle");
            *self.bundles_rejected.write().await += 1;
            return None;
        }

        let ordered = self.optimize_transaction_order(transactions);
        let metrics = self.calculate_bundle_metrics(&ordered).await;

        if metrics.expected_profit < self.config.min_profit_threshold {
            info!(
                expected_profit = metrics.expected_profit.to_f64().unwrap_or(0.0),
                "Bundle profit below threshold"
            );
            *self.bundles_rejected.write().await += 1;
            return None;
        }

        let bundle = BundleCandidate {
            id: format!("bundle_{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()),
            transactions: ordered,
            metrics,
            status: BundleStatus::Pending,
            created_at: Utc::now(),
            opportunistic,
        };

        let stored = match self.repository.save(bundle).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to store bundle");
                *self.bundles_rejected.write().await += 1;
                return None;
            }
        };

        self.active_bundles
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        *self.bundles_created.write().await += 1;

        logger::log_bundle_created(
            &stored.id,
            stored.metrics.transaction_count,
            stored.metrics.expected_profit.to_f64().unwrap_or(0.0),
        );

        Some(stored)
    }

    /// Validate the candidate set as a whole; no partial bundles
    fn validate_transactions(&self, transactions: &[PendingTransaction]) -> bool {
        if transactions.is_empty() || transactions.len() > self.config.max_transactions {
            return false;
        }

        for tx in transactions {
            if !Self::validate_single_transaction(tx) {
                return false;
            }
        }

        !self.has_conflicts(transactions)
    }

    /// Each transaction must carry recipient, value, data, and gas limit
    fn validate_single_transaction(tx: &PendingTransaction) -> bool {
        tx.to.is_some() && tx.gas_limit > 0
    }

    /// Two same-sender transactions must strictly increase nonce, or the
    /// second invalidates the first on-chain
    fn has_conflicts(&self, transactions: &[PendingTransaction]) -> bool {
        let mut last_nonce: HashMap<&str, u64> = HashMap::new();

        for tx in transactions {
            if let Some(prev) = last_nonce.get(tx.from.as_str()) {
                if tx.nonce <= *prev {
                    return true;
                }
            }
            last_nonce.insert(tx.from.as_str(), tx.nonce);
        }

        false
    }

    /// Deterministic baseline sort, then dependency resolution
    fn optimize_transaction_order(
        &self,
        mut transactions: Vec<PendingTransaction>,
    ) -> Vec<PendingTransaction> {
        if self.config.order_by_gas_price_ascending {
            transactions.sort_by_key(|tx| (tx.gas_price, tx.nonce));
        } else {
            transactions.sort_by_key(|tx| (std::cmp::Reverse(tx.gas_price), tx.nonce));
        }

        self.resolve_dependencies(transactions)
    }

    /// Depth-first dependency resolution with front insertion
    ///
    /// Transaction i depends on j when i pays the account that sent j, or
    /// when both share a sender and i carries the higher nonce. Back-edges
    /// into open nodes are skipped, so a cyclic subset keeps its
    /// input-relative order.
    fn resolve_dependencies(
        &self,
        transactions: Vec<PendingTransaction>,
    ) -> Vec<PendingTransaction> {
        let n = transactions.len();
        let mut graph: Vec<Vec<usize>> = vec![Vec::new(); n];

        for i in 0..n {
            for j in 0..n {
                if i != j && Self::is_dependent(&transactions[i], &transactions[j]) {
                    graph[i].push(j);
                }
            }
        }

        let mut ordered: Vec<usize> = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        let mut open = vec![false; n];

        fn visit(
            i: usize,
            graph: &[Vec<usize>],
            visited: &mut [bool],
            open: &mut [bool],
            ordered: &mut Vec<usize>,
        ) {
            if open[i] {
                // Cycle: treat the offending edge as absent.
                warn!(index = i, "Cyclic bundle dependency skipped");
                return;
            }
            if visited[i] {
                return;
            }

            open[i] = true;
            for &j in &graph[i] {
                visit(j, graph, visited, open, ordered);
            }
            open[i] = false;
            visited[i] = true;
            ordered.insert(0, i);
        }

        for i in 0..n {
            if !visited[i] {
                visit(i, &graph, &mut visited, &mut open, &mut ordered);
            }
        }

        debug!(order = ?ordered, "Bundle dependency order resolved");
        let mut slots: Vec<Option<PendingTransaction>> =
            transactions.into_iter().map(Some).collect();
        ordered
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    }

    fn is_dependent(tx: &PendingTransaction, other: &PendingTransaction) -> bool {
        if let Some(to) = &tx.to {
            if *to == other.from {
                return true;
            }
        }

        tx.from == other.from && tx.nonce > other.nonce
    }

    /// Aggregate metrics over the ordered set
    async fn calculate_bundle_metrics(
        &self,
        transactions: &[PendingTransaction],
    ) -> BundleMetrics {
        let total_gas = transactions.iter().map(|tx| tx.gas_limit).sum();
        let total_value = transactions.iter().map(|tx| tx.value).sum();
        let expected_profit = self.simulator.estimate_profit(transactions).await;

        BundleMetrics {
            total_gas,
            total_value,
            transaction_count: transactions.len(),
            expected_profit,
            risk_score: Self::calculate_risk_score(transactions),
        }
    }

    /// Risk scoring hook; neutral until a scoring model is wired in
    fn calculate_risk_score(_transactions: &[PendingTransaction]) -> Decimal {
        Decimal::ZERO
    }

    /// Look up an active bundle by id
    pub async fn get_bundle(&self, id: &str) -> Option<BundleCandidate> {
        self.active_bundles.read().await.get(id).cloned()
    }

    /// Snapshot of all active bundles
    pub async fn get_all_bundles(&self) -> Vec<BundleCandidate> {
        self.active_bundles.read().await.values().cloned().collect()
    }

    /// Update a tracked bundle's lifecycle status, in memory and in storage
    pub async fn mark_status(&self, id: &str, status: BundleStatus) {
        if let Some(bundle) = self.active_bundles.write().await.get_mut(id) {
            bundle.status = status;
        }
        if let Err(e) = self.repository.update_status(id, status).await {
            warn!(bundle_id = id, error = %e, "Failed to update stored bundle status");
        }
    }

    /// Counters for monitoring: (created, rejected)
    pub async fn counters(&self) -> (u64, u64) {
        (
            *self.bundles_created.read().await,
            *self.bundles_rejected.read().await,
        )
    }
}
