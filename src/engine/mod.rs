//! Core bundle pipeline engine
//!
//! Wires the mempool scanner, gas advisor, risk gate, bundle builder, and
//! strategy executor together, and owns the background loops.

pub mod bundle_builder;
pub mod executor;
pub mod gas;
pub mod mempool_scanner;

use std::sync::Arc;

use tracing::info;

use crate::chain::{BundleSimulator, ChainClient, Signer};
use crate::engine::bundle_builder::BundleBuilder;
use crate::engine::executor::StrategyExecutor;
use crate::engine::gas::GasPriceAdvisor;
use crate::engine::mempool_scanner::{MempoolScanner, TransactionAnalyzer};
use crate::notify::NotificationSink;
use crate::storage::{BundleRepository, ExecutionRepository, MempoolRepository};
use crate::utils::config::Config;
use crate::utils::risk::RiskGate;
use crate::utils::types::{Address, EngineHealth};

/// Collaborator handles the engine is constructed from
pub struct EngineDeps {
    pub chain: Arc<dyn ChainClient>,
    pub signer: Arc<dyn Signer>,
    pub simulator: Arc<dyn BundleSimulator>,
    pub analyzer: Arc<dyn TransactionAnalyzer>,
    pub bundle_repository: Arc<dyn BundleRepository>,
    pub execution_repository: Arc<dyn ExecutionRepository>,
    pub mempool_repository: Arc<dyn MempoolRepository>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Top-level engine owning all pipeline components
pub struct Engine {
    scanner: Arc<MempoolScanner>,
    gas: Arc<GasPriceAdvisor>,
    risk: Arc<RiskGate>,
    bundles: Arc<BundleBuilder>,
    executor: Arc<StrategyExecutor>,
}

impl Engine {
    pub fn new(config: Config, deps: EngineDeps) -> Self {
        let gas = Arc::new(GasPriceAdvisor::new(
            config.gas.clone(),
            deps.chain.clone(),
        ));

        let scanner = Arc::new(MempoolScanner::new(
            config.mempool.clone(),
            deps.chain.clone(),
            deps.mempool_repository,
            deps.analyzer,
        ));

        let risk = Arc::new(RiskGate::new(config.risk.clone(), deps.chain.clone()));

        let bundles = Arc::new(BundleBuilder::new(
            config.bundle.clone(),
            deps.simulator.clone(),
            deps.bundle_repository,
        ));

        let executor = Arc::new(StrategyExecutor::new(
            config.execution.clone(),
            Address::new(config.chain.sender_address.clone()),
            deps.chain,
            deps.signer,
            deps.simulator,
            gas.clone(),
            risk.clone(),
            bundles.clone(),
            deps.execution_repository,
            deps.notifier,
        ));

        Self {
            scanner,
            gas,
            risk,
            bundles,
            executor,
        }
    }

    /// Start the background loops; returns once both loops have exited
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting bundle pipeline engine");

        let scanner = self.scanner.clone();
        let scan_handle = tokio::spawn(async move {
            scanner.run_scan_loop().await;
        });

        let gas = self.gas.clone();
        let gas_handle = tokio::spawn(async move {
            gas.run_sampling().await;
        });

        tokio::try_join!(scan_handle, gas_handle)?;
        Ok(())
    }

    /// Stop scheduling further loop iterations; in-flight work finishes
    pub async fn stop(&self) {
        info!("Stopping bundle pipeline engine");
        self.scanner.stop().await;
        self.gas.stop().await;
    }

    /// Aggregate health across background components
    pub async fn health_check(&self) -> EngineHealth {
        let mempool = self.scanner.health_check().await;
        let gas = self.gas.health_check().await;

        EngineHealth {
            overall_healthy: mempool.healthy && gas.healthy,
            mempool,
            gas,
        }
    }

    pub fn scanner(&self) -> &Arc<MempoolScanner> {
        &self.scanner
    }

    pub fn gas(&self) -> &Arc<GasPriceAdvisor> {
        &self.gas
    }

    pub fn risk(&self) -> &Arc<RiskGate> {
        &self.risk
    }

    pub fn bundles(&self) -> &Arc<BundleBuilder> {
        &self.bundles
    }

    pub fn executor(&self) -> &Arc<StrategyExecutor> {
        &self.executor
    }
}
