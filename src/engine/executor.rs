//! Strategy executor
//!
//! Orchestrates one strategy invocation end to end: risk gate, strategy
//! transaction build, bundle construction, simulation-gated submission
//! with retries, and execution lifecycle tracking. Active and historical
//! records share one lock; a record moves from the active table to
//! history exactly once, atomically with its terminal transition.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chain::{BundleSimulator, ChainClient, Signer};
use crate::engine::bundle_builder::BundleBuilder;
use crate::engine::gas::GasPriceAdvisor;
use crate::notify::{NotificationSink, NotifyPriority};
use crate::storage::ExecutionRepository;
use crate::strategies::{Strategy, StrategyContext};
use crate::utils::config::ExecutionConfig;
use crate::utils::logger;
use crate::utils::risk::RiskGate;
use crate::utils::types::{
    Address, BundleCandidate, BundleStatus, ExecutionOutcome, ExecutionRecord, ExecutionStatus,
    RiskRejection, TxHash,
};

/// Terminal failure of one strategy invocation
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("risk assessment failed: {reason}")]
    RiskRejected { reason: RiskRejection },

    #[error("failed to build strategy transactions: {0}")]
    BuildFailed(String),

    #[error("no valid bundle produced")]
    BundleRejected,

    #[error("execution failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl ExecutionError {
    /// Stable category for callers deciding whether to retry or abandon
    pub fn category(&self) -> &'static str {
        match self {
            Self::RiskRejected { .. } => "risk_rejected",
            Self::BuildFailed(_) => "build_failed",
            Self::BundleRejected => "bundle_rejected",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

#[derive(Debug, Default)]
struct ExecutionTables {
    active: HashMap<String, ExecutionRecord>,
    history: Vec<ExecutionRecord>,
}

/// Strategy execution orchestrator
pub struct StrategyExecutor {
    config: ExecutionConfig,
    sender: Address,
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn Signer>,
    simulator: Arc<dyn BundleSimulator>,
    gas: Arc<GasPriceAdvisor>,
    risk: Arc<RiskGate>,
    bundles: Arc<BundleBuilder>,
    repository: Arc<dyn ExecutionRepository>,
    notifier: Arc<dyn NotificationSink>,
    tables: Mutex<ExecutionTables>,
}

impl StrategyExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ExecutionConfig,
        sender: Address,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn Signer>,
        simulator: Arc<dyn BundleSimulator>,
        gas: Arc<GasPriceAdvisor>,
        risk: Arc<RiskGate>,
        bundles: Arc<BundleBuilder>,
        repository: Arc<dyn ExecutionRepository>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            sender,
            chain,
            signer,
            simulator,
            gas,
            risk,
            bundles,
            repository,
            notifier,
            tables: Mutex::new(ExecutionTables::default()),
        }
    }

    /// Execute a strategy end to end
    ///
    /// Every failure is recorded on the execution record and returned as a
    /// typed error; raw infrastructure errors never cross this boundary.
    pub async fn execute_strategy(
        &self,
        strategy: Strategy,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let label = strategy.label();
        let execution_id = format!(
            "{label}_{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );

        self.register(&execution_id, &strategy).await;

        let assessment = self.risk.assess_risk(label, strategy.amount()).await;
        if !assessment.approved {
            let reason = assessment
                .reason
                .unwrap_or(RiskRejection::PositionSizeExceeded);
            let error = ExecutionError::RiskRejected { reason };
            self.finish_failed(&execution_id, label, &error).await;
            return Err(error);
        }

        self.transition(&execution_id, ExecutionStatus::Running).await;

        let ctx = StrategyContext {
            sender: self.sender.clone(),
            chain: self.chain.clone(),
            gas: self.gas.clone(),
        };

        let transactions = match strategy.build_transactions(&ctx).await {
            Ok(txs) => txs,
            Err(e) => {
                let error = ExecutionError::BuildFailed(e.to_string());
                self.finish_failed(&execution_id, label, &error).await;
                return Err(error);
            }
        };

        let bundle = match self
            .bundles
            .create_bundle(transactions, strategy.is_opportunistic())
            .await
        {
            Some(bundle) => bundle,
            None => {
                let error = ExecutionError::BundleRejected;
                self.finish_failed(&execution_id, label, &error).await;
                return Err(error);
            }
        };

        match self.execute_with_retries(&bundle).await {
            Ok(outcome) => {
                self.finish_completed(&execution_id, label, outcome.clone())
                    .await;
                Ok(outcome)
            }
            Err(error) => {
                self.bundles
                    .mark_status(&bundle.id, BundleStatus::Failed)
                    .await;
                self.finish_failed(&execution_id, label, &error).await;
                Err(error)
            }
        }
    }

    /// Simulate, submit, and confirm the bundle, retrying on failure
    ///
    /// Fixed delay between attempts; a simulation failure aborts the
    /// attempt, not the retry loop.
    async fn execute_with_retries(
        &self,
        bundle: &BundleCandidate,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_retries {
            match self.attempt_once(bundle).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    warn!(
                        bundle_id = %bundle.id,
                        attempt = attempt,
                        error = %e,
                        "Bundle execution attempt failed"
                    );
                    last_error = e;
                }
            }

            if attempt < self.config.max_retries {
                tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
            }
        }

        Err(ExecutionError::RetriesExhausted {
            attempts: self.config.max_retries,
            last_error,
        })
    }

    async fn attempt_once(&self, bundle: &BundleCandidate) -> Result<ExecutionOutcome, String> {
        let simulation = self.simulator.simulate(bundle).await;
        if !simulation.success {
            return Err(format!(
                "bundle simulation failed: {}",
                simulation.error.unwrap_or_else(|| "unknown".to_string())
            ));
        }

        let mut hashes: Vec<TxHash> = Vec::with_capacity(bundle.transactions.len());
        for tx in &bundle.transactions {
            let signed = self.signer.sign(tx).await.map_err(|e| e.to_string())?;
            let hash = self
                .chain
                .send_raw_transaction(&signed)
                .await
                .map_err(|e| e.to_string())?;
            hashes.push(hash);
        }

        self.bundles
            .mark_status(&bundle.id, BundleStatus::Submitted)
            .await;

        let timeout = if bundle.opportunistic {
            Duration::from_secs(self.config.opportunistic_receipt_timeout_secs)
        } else {
            Duration::from_secs(self.config.receipt_timeout_secs)
        };

        let mut gas_used = 0u64;
        for hash in &hashes {
            let receipt = self
                .chain
                .wait_for_receipt(hash, timeout)
                .await
                .map_err(|e| e.to_string())?;
            if !receipt.success {
                return Err(format!("transaction {hash} reverted"));
            }
            gas_used += receipt.gas_used;
        }

        self.bundles
            .mark_status(&bundle.id, BundleStatus::Confirmed)
            .await;

        Ok(ExecutionOutcome {
            profit: simulation.profit,
            gas_used,
            transaction_hashes: hashes,
        })
    }

    /// Snapshot of in-flight executions
    pub async fn get_active_executions(&self) -> Vec<ExecutionRecord> {
        self.tables.lock().await.active.values().cloned().collect()
    }

    /// Snapshot of finished executions
    pub async fn get_execution_history(&self) -> Vec<ExecutionRecord> {
        self.tables.lock().await.history.clone()
    }

    async fn register(&self, execution_id: &str, strategy: &Strategy) {
        let record = ExecutionRecord {
            id: execution_id.to_string(),
            strategy: strategy.label().to_string(),
            params: strategy.params_json(),
            status: ExecutionStatus::Initializing,
            start_time: Utc::now(),
            end_time: None,
            result: None,
        };

        self.tables
            .lock()
            .await
            .active
            .insert(execution_id.to_string(), record.clone());

        if let Err(e) = self.repository.save(record).await {
            warn!(execution_id = execution_id, error = %e, "Failed to persist execution record");
        }
    }

    async fn transition(&self, execution_id: &str, status: ExecutionStatus) {
        let mut tables = self.tables.lock().await;

        let Some(record) = tables.active.get_mut(execution_id) else {
            return;
        };
        if record.status.is_terminal() {
            return;
        }

        record.status = status.clone();

        if status.is_terminal() {
            record.end_time = Some(Utc::now());
            if let Some(finished) = tables.active.remove(execution_id) {
                tables.history.push(finished.clone());
                drop(tables);

                if let Err(e) = self.repository.save(finished).await {
                    warn!(execution_id = execution_id, error = %e, "Failed to persist execution record");
                }
            }
        }
    }

    async fn finish_completed(&self, execution_id: &str, label: &str, outcome: ExecutionOutcome) {
        {
            let mut tables = self.tables.lock().await;
            if let Some(record) = tables.active.get_mut(execution_id) {
                record.result = Some(outcome.clone());
            }
        }
        self.transition(execution_id, ExecutionStatus::Completed)
            .await;

        logger::log_execution_finished(
            execution_id,
            label,
            true,
            outcome.profit.to_f64().unwrap_or(0.0),
            outcome.gas_used,
        );
    }

    async fn finish_failed(&self, execution_id: &str, label: &str, error: &ExecutionError) {
        self.transition(
            execution_id,
            ExecutionStatus::Failed {
                reason: error.to_string(),
            },
        )
        .await;

        // Business-rule rejections are expected outcomes, not errors.
        match error {
            ExecutionError::RiskRejected { .. } | ExecutionError::BundleRejected => {
                info!(
                    execution_id = execution_id,
                    strategy = label,
                    category = error.category(),
                    "Execution not approved"
                );
            }
            _ => {
                logger::log_execution_finished(execution_id, label, false, 0.0, 0);
                self.notifier
                    .send(
                        NotifyPriority::Warning,
                        "Strategy execution failed",
                        &error.to_string(),
                        serde_json::json!({
                            "execution_id": execution_id,
                            "strategy": label,
                            "category": error.category(),
                        }),
                    )
                    .await;
            }
        }
    }
}
