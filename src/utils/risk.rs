//! Risk gate consulted before any strategy execution
//!
//! Evaluates rate limits, position-size limits, and the gas price ceiling
//! in a fixed order, short-circuiting on the first failure. All mutable
//! bookkeeping lives behind one lock.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::chain::ChainClient;
use crate::utils::config::RiskConfig;
use crate::utils::logger;
use crate::utils::types::{RiskAssessment, RiskLevel, RiskRejection};

/// Snapshot of the gate's aggregate risk metrics
#[derive(Debug, Clone)]
pub struct RiskMetrics {
    pub total_exposure: Decimal,
    pub active_positions: usize,
    pub current_gas_price: u64,
    pub risk_level: RiskLevel,
    pub rejected_trades: u64,
}

#[derive(Debug, Default)]
struct GateState {
    /// Request timestamps per strategy id, pruned to the rate-limit window
    request_windows: HashMap<String, VecDeque<Instant>>,
    /// Approved position entries, pruned to the exposure window
    exposure_entries: VecDeque<(Instant, Decimal)>,
    last_gas_price: Option<u64>,
    rejected_trades: u64,
}

/// Gatekeeper for strategy execution
pub struct RiskGate {
    config: RiskConfig,
    chain: Arc<dyn ChainClient>,
    state: Mutex<GateState>,
}

impl RiskGate {
    pub fn new(config: RiskConfig, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            config,
            chain,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Evaluate a proposed execution; never fails, never blocks on RPC errors
    pub async fn assess_risk(&self, strategy_id: &str, amount: Decimal) -> RiskAssessment {
        // Chain read happens before taking the lock so a slow node cannot
        // stall other callers.
        let gas_read = self.chain.gas_price().await;

        let mut state = self.state.lock().await;
        let now = Instant::now();

        if !self.check_rate_limit(&mut state, strategy_id, now) {
            state.rejected_trades += 1;
            logger::log_risk_event("rate_limit", strategy_id);
            return RiskAssessment::rejected(
                RiskRejection::RateLimitExceeded,
                Self::risk_level(&self.config, &state),
            );
        }

        if amount > self.config.max_position_size {
            state.rejected_trades += 1;
            logger::log_risk_event("position_size", &format!("{strategy_id}: {amount}"));
            return RiskAssessment::rejected(
                RiskRejection::PositionSizeExceeded,
                Self::risk_level(&self.config, &state),
            );
        }

        match gas_read {
            Ok(price) => state.last_gas_price = Some(price),
            Err(e) => logger::log_degraded("risk_gate", &format!("gas price read failed: {e}")),
        }
        if let Some(price) = state.last_gas_price {
            if price > self.config.max_gas_price_wei {
                state.rejected_trades += 1;
                logger::log_risk_event("gas_price", &format!("{price} wei"));
                return RiskAssessment::rejected(
                    RiskRejection::GasPriceExceeded,
                    Self::risk_level(&self.config, &state),
                );
            }
        }

        // Approved: the request now counts toward exposure.
        state.exposure_entries.push_back((now, amount));
        Self::prune_exposure(&self.config, &mut state, now);

        RiskAssessment::approved(Self::risk_level(&self.config, &state))
    }

    /// Aggregate metrics snapshot
    pub async fn metrics(&self) -> RiskMetrics {
        let mut state = self.state.lock().await;
        Self::prune_exposure(&self.config, &mut state, Instant::now());

        RiskMetrics {
            total_exposure: Self::total_exposure(&state),
            active_positions: state.exposure_entries.len(),
            current_gas_price: state.last_gas_price.unwrap_or(0),
            risk_level: Self::risk_level(&self.config, &state),
            rejected_trades: state.rejected_trades,
        }
    }

    /// Cumulative count of rejected requests
    pub async fn rejected_trades(&self) -> u64 {
        self.state.lock().await.rejected_trades
    }

    fn check_rate_limit(&self, state: &mut GateState, strategy_id: &str, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.rate_limit_window_secs);
        let requests = state
            .request_windows
            .entry(strategy_id.to_string())
            .or_default();

        while let Some(front) = requests.front() {
            if now.duration_since(*front) > window {
                requests.pop_front();
            } else {
                break;
            }
        }

        if requests.len() >= self.config.rate_limit_max_requests {
            return false;
        }

        requests.push_back(now);
        true
    }

    fn prune_exposure(config: &RiskConfig, state: &mut GateState, now: Instant) {
        let window = Duration::from_secs(config.exposure_window_secs);
        while let Some((ts, _)) = state.exposure_entries.front() {
            if now.duration_since(*ts) > window {
                state.exposure_entries.pop_front();
            } else {
                break;
            }
        }
    }

    fn total_exposure(state: &GateState) -> Decimal {
        state
            .exposure_entries
            .iter()
            .map(|(_, amount)| *amount)
            .sum()
    }

    fn risk_level(config: &RiskConfig, state: &GateState) -> RiskLevel {
        let exposure = Self::total_exposure(state);
        if config.max_position_size.is_zero() {
            return RiskLevel::High;
        }

        let ratio = exposure / config.max_position_size;
        if ratio > Decimal::new(8, 1) {
            RiskLevel::High
        } else if ratio > Decimal::new(5, 1) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}
