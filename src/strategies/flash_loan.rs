//! Flash-loan arbitrage transaction builder
//!
//! Borrows from a lending pool and routes the borrowed amount through the
//! configured DEX routers inside a single atomic call; the pool contract
//! reverts the whole transaction if the loan cannot be repaid.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chain::ChainError;
use crate::strategies::StrategyContext;
use crate::utils::types::{Address, PendingTransaction, PriorityTier, TxHash};

/// Gas headroom for the nested loan/swap/repay call
const FLASH_LOAN_GAS_LIMIT: u64 = 2_000_000;

/// Parameters for a flash-loan arbitrage invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashLoanParams {
    pub lending_pool: Address,
    pub token: Address,
    /// Loan size in native units
    pub loan_amount: Decimal,
    /// DEX routers the borrowed amount hops through, in order
    pub routes: Vec<Address>,
}

/// Build the single flash-loan transaction
pub async fn build_transactions(
    ctx: &StrategyContext,
    params: &FlashLoanParams,
) -> Result<Vec<PendingTransaction>, ChainError> {
    let nonce = ctx.next_nonce().await?;
    let gas_price = ctx.gas.optimal_gas_price(PriorityTier::High).await;

    let call = json!({
        "method": "flashLoan",
        "receiver": ctx.sender.as_str(),
        "asset": params.token.as_str(),
        "amount": params.loan_amount.to_string(),
        "routes": params.routes.iter().map(Address::as_str).collect::<Vec<_>>(),
    });

    Ok(vec![PendingTransaction {
        hash: TxHash::new(format!("local:flash_loan:{nonce}")),
        from: ctx.sender.clone(),
        to: Some(params.lending_pool.clone()),
        value: 0,
        gas_price,
        gas_limit: FLASH_LOAN_GAS_LIMIT,
        nonce,
        data: serde_json::to_vec(&call).unwrap_or_default(),
    }])
}
