//! Gas price advisor
//!
//! Tracks rolling gas price and base fee samples, recommends a gas price
//! per priority tier, and decides when a stuck transaction is worth
//! replacing. Chain read failures always degrade to the last known value;
//! this component never propagates a transient RPC error to its caller.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::info;

use crate::chain::ChainClient;
use crate::utils::config::GasConfig;
use crate::utils::logger;
use crate::utils::types::{ComponentHealth, PendingTransaction, PriorityTier};

/// Replacement-transaction minimum bump, mirroring common node rules
const MIN_REPLACEMENT_BUMP: f64 = 1.125;

/// Per-block escalation applied while a transaction waits
const WAIT_ESCALATION_PER_BLOCK: f64 = 0.125;

/// Summary statistics over the sampled gas history
#[derive(Debug, Clone)]
pub struct GasStats {
    pub current: u64,
    pub average: u64,
    pub max: u64,
    pub min: u64,
    pub base_fee: Option<u64>,
}

#[derive(Debug, Default)]
struct SampleState {
    gas_price_history: VecDeque<u64>,
    base_fee_history: VecDeque<u64>,
    error_count: u64,
    last_sample_unix: u64,
}

/// Gas price recommendation component
pub struct GasPriceAdvisor {
    config: GasConfig,
    min_gas_price: u64,
    max_gas_price: u64,
    chain: Arc<dyn ChainClient>,
    state: Arc<RwLock<SampleState>>,
    running: Arc<RwLock<bool>>,
}

impl GasPriceAdvisor {
    pub fn new(config: GasConfig, chain: Arc<dyn ChainClient>) -> Self {
        let min_gas_price = config.min_gas_price_gwei * 1_000_000_000;
        let max_gas_price = config.max_gas_price_gwei * 1_000_000_000;

        Self {
            config,
            min_gas_price,
            max_gas_price,
            chain,
            state: Arc::new(RwLock::new(SampleState::default())),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Recommend a gas price for the given priority tier, in wei
    ///
    /// `base_fee * tier_multiplier * buffer`, clamped to the configured
    /// bounds. Falls back to the node's current gas price when the base
    /// fee is unavailable.
    pub async fn optimal_gas_price(&self, tier: PriorityTier) -> u64 {
        let base = match self.chain.base_fee().await {
            Ok(fee) => fee,
            Err(e) => {
                logger::log_degraded("gas_advisor", &format!("base fee read failed: {e}"));
                match self.chain.gas_price().await {
                    Ok(price) => price,
                    Err(e) => {
                        logger::log_degraded(
                            "gas_advisor",
                            &format!("gas price read failed: {e}"),
                        );
                        self.last_known_gas_price().await
                    }
                }
            }
        };

        let optimal = (base as f64 * tier.multiplier() * self.config.price_buffer) as u64;
        optimal.clamp(self.min_gas_price, self.max_gas_price)
    }

    /// Decide whether a pending transaction should be replaced
    ///
    /// The candidate price escalates with blocks waited, is capped at the
    /// current high-priority optimal price, and must clear the 12.5%
    /// minimum bump or no replacement is reported.
    pub async fn should_replace(
        &self,
        old_gas_price: u64,
        blocks_waiting: u32,
    ) -> (bool, Option<u64>) {
        if blocks_waiting < 1 {
            return (false, None);
        }

        let ceiling = self.optimal_gas_price(PriorityTier::High).await;

        let multiplier = (1.0 + blocks_waiting as f64 * WAIT_ESCALATION_PER_BLOCK).min(1.5);
        let mut candidate = (old_gas_price as f64 * multiplier) as u64;
        if candidate > ceiling {
            candidate = ceiling;
        }

        if candidate as f64 > old_gas_price as f64 * MIN_REPLACEMENT_BUMP {
            (true, Some(candidate))
        } else {
            (false, None)
        }
    }

    /// Estimate a gas limit for a transaction, buffered
    pub async fn estimate_gas_limit(&self, tx: &PendingTransaction) -> u64 {
        match self.chain.estimate_gas(tx).await {
            Ok(estimate) => (estimate as f64 * self.config.price_buffer) as u64,
            Err(e) => {
                logger::log_degraded("gas_advisor", &format!("gas estimate failed: {e}"));
                self.config.default_gas_limit
            }
        }
    }

    /// Summary statistics over the sample history, if any samples exist
    pub async fn gas_stats(&self) -> Option<GasStats> {
        let state = self.state.read().await;
        if state.gas_price_history.is_empty() {
            return None;
        }

        let current = *state.gas_price_history.back()?;
        let sum: u128 = state.gas_price_history.iter().map(|p| *p as u128).sum();

        Some(GasStats {
            current,
            average: (sum / state.gas_price_history.len() as u128) as u64,
            max: *state.gas_price_history.iter().max()?,
            min: *state.gas_price_history.iter().min()?,
            base_fee: state.base_fee_history.back().copied(),
        })
    }

    /// Take one gas price / base fee sample
    pub async fn sample_once(&self) {
        let gas_price = match self.chain.gas_price().await {
            Ok(price) => price,
            Err(e) => {
                let mut state = self.state.write().await;
                state.error_count += 1;
                logger::log_degraded("gas_advisor", &format!("sampling failed: {e}"));
                return;
            }
        };

        let base_fee = match self.chain.base_fee().await {
            Ok(fee) => fee,
            Err(_) => gas_price,
        };

        let mut state = self.state.write().await;
        state.gas_price_history.push_back(gas_price);
        state.base_fee_history.push_back(base_fee);

        while state.gas_price_history.len() > self.config.history_size {
            state.gas_price_history.pop_front();
        }
        while state.base_fee_history.len() > self.config.history_size {
            state.base_fee_history.pop_front();
        }

        state.last_sample_unix = unix_now();
    }

    /// Run the background sampling loop until stopped
    pub async fn run_sampling(&self) {
        *self.running.write().await = true;
        info!(
            interval_secs = self.config.update_interval_secs,
            "Gas sampling started"
        );

        while *self.running.read().await {
            self.sample_once().await;
            tokio::time::sleep(Duration::from_secs(self.config.update_interval_secs)).await;
        }
    }

    /// Stop scheduling further samples; an in-flight sample finishes
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    /// Health check for monitoring
    pub async fn health_check(&self) -> ComponentHealth {
        let state = self.state.read().await;
        let now = unix_now();
        let healthy = state.last_sample_unix > 0
            && now.saturating_sub(state.last_sample_unix) < self.config.update_interval_secs * 4;

        ComponentHealth {
            healthy,
            last_active: state.last_sample_unix,
            error_count: state.error_count,
            status_message: if healthy {
                format!("{} samples held", state.gas_price_history.len())
            } else {
                "gas sampling stale".to_string()
            },
        }
    }

    async fn last_known_gas_price(&self) -> u64 {
        let state = self.state.read().await;
        state
            .gas_price_history
            .back()
            .copied()
            .unwrap_or(self.min_gas_price)
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
