//! Liquidation transaction builder
//!
//! Repays part of an undercollateralized borrower's debt in exchange for
//! discounted collateral. One call to the lending protocol.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chain::ChainError;
use crate::strategies::StrategyContext;
use crate::utils::types::{Address, PendingTransaction, PriorityTier, TxHash};

/// Parameters for a liquidation invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationParams {
    pub protocol: Address,
    pub borrower: Address,
    pub collateral_token: Address,
    pub debt_token: Address,
    /// Debt repaid in native units
    pub repay_amount: Decimal,
}

/// Build the single liquidation call
pub async fn build_transactions(
    ctx: &StrategyContext,
    params: &LiquidationParams,
) -> Result<Vec<PendingTransaction>, ChainError> {
    let nonce = ctx.next_nonce().await?;
    let gas_price = ctx.gas.optimal_gas_price(PriorityTier::High).await;

    let call = json!({
        "method": "liquidationCall",
        "collateral": params.collateral_token.as_str(),
        "debt": params.debt_token.as_str(),
        "borrower": params.borrower.as_str(),
        "amount": params.repay_amount.to_string(),
        "receiveCollateral": true,
    });

    let mut tx = PendingTransaction {
        hash: TxHash::new(format!("local:liquidation:{nonce}")),
        from: ctx.sender.clone(),
        to: Some(params.protocol.clone()),
        value: (params.repay_amount * Decimal::from(10u128.pow(18)))
            .to_u128()
            .unwrap_or(0),
        gas_price,
        gas_limit: 0,
        nonce,
        data: serde_json::to_vec(&call).unwrap_or_default(),
    };
    tx.gas_limit = ctx.gas.estimate_gas_limit(&tx).await;

    Ok(vec![tx])
}
