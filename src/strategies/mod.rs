//! Strategy implementations
//!
//! Each strategy kind builds the raw transaction set for one opportunity:
//! - Flash-loan arbitrage between DEX routers
//! - Sandwich (frontrun/victim/backrun)
//! - Liquidation of an undercollateralized position
//!
//! Dispatch is an exhaustive match over [`Strategy`], so every kind is
//! handled by construction.

pub mod flash_loan;
pub mod liquidation;
pub mod sandwich;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chain::{ChainClient, ChainError};
use crate::engine::gas::GasPriceAdvisor;
use crate::utils::types::{Address, PendingTransaction};

pub use flash_loan::FlashLoanParams;
pub use liquidation::LiquidationParams;
pub use sandwich::SandwichParams;

/// A strategy invocation with its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Strategy {
    FlashLoanArbitrage(FlashLoanParams),
    Sandwich(SandwichParams),
    Liquidation(LiquidationParams),
}

impl Strategy {
    /// Stable name used for execution ids, rate limiting, and logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::FlashLoanArbitrage(_) => "flash_loan_arbitrage",
            Self::Sandwich(_) => "sandwich",
            Self::Liquidation(_) => "liquidation",
        }
    }

    /// Position size this invocation puts at risk, in native units
    pub fn amount(&self) -> Decimal {
        match self {
            Self::FlashLoanArbitrage(p) => p.loan_amount,
            Self::Sandwich(p) => p.front_run_amount,
            Self::Liquidation(p) => p.repay_amount,
        }
    }

    /// Opportunistic strategies use the short receipt timeout
    pub fn is_opportunistic(&self) -> bool {
        matches!(self, Self::Sandwich(_))
    }

    /// Parameters serialized for the execution record
    pub fn params_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Build the ordered raw transaction set for this strategy
    pub async fn build_transactions(
        &self,
        ctx: &StrategyContext,
    ) -> Result<Vec<PendingTransaction>, ChainError> {
        match self {
            Self::FlashLoanArbitrage(params) => flash_loan::build_transactions(ctx, params).await,
            Self::Sandwich(params) => sandwich::build_transactions(ctx, params).await,
            Self::Liquidation(params) => liquidation::build_transactions(ctx, params).await,
        }
    }
}

/// Shared collaborators for transaction-set builders
pub struct StrategyContext {
    pub sender: Address,
    pub chain: Arc<dyn ChainClient>,
    pub gas: Arc<GasPriceAdvisor>,
}

impl StrategyContext {
    /// Next usable nonce for the bot account
    pub async fn next_nonce(&self) -> Result<u64, ChainError> {
        self.chain.transaction_count(&self.sender).await
    }
}
