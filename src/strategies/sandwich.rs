//! Sandwich transaction builder
//!
//! Wraps a victim swap with a frontrun buy and a backrun sell. The
//! frontrun must outbid the victim's gas price; the backrun only has to
//! land after it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chain::ChainError;
use crate::strategies::StrategyContext;
use crate::utils::types::{Address, PendingTransaction, PriorityTier, TxHash};

/// Gas price edge over the victim's offer
const OUTBID_MULTIPLIER: f64 = 1.15;

const SWAP_GAS_LIMIT: u64 = 400_000;

/// Parameters for a sandwich invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandwichParams {
    /// The observed victim swap, included between our two legs
    pub victim: PendingTransaction,
    pub token: Address,
    /// Frontrun size in native units; conventionally a tenth of the
    /// victim's input
    pub front_run_amount: Decimal,
}

impl SandwichParams {
    /// Default sizing rule: 10% of the victim's value
    pub fn sized_from_victim(victim: PendingTransaction, token: Address) -> Self {
        let front_run_amount = Decimal::from(victim.value / 10) / Decimal::from(10u128.pow(18));
        Self {
            victim,
            token,
            front_run_amount,
        }
    }
}

/// Build the frontrun / victim / backrun set, in that order
pub async fn build_transactions(
    ctx: &StrategyContext,
    params: &SandwichParams,
) -> Result<Vec<PendingTransaction>, ChainError> {
    let router = params
        .victim
        .to
        .clone()
        .ok_or_else(|| ChainError::Malformed("victim transaction has no recipient".to_string()))?;

    let nonce = ctx.next_nonce().await?;

    let urgent = ctx.gas.optimal_gas_price(PriorityTier::Urgent).await;
    let outbid = (params.victim.gas_price as f64 * OUTBID_MULTIPLIER) as u64;
    let front_gas_price = urgent.max(outbid);
    let back_gas_price = ctx.gas.optimal_gas_price(PriorityTier::Low).await;

    let amount_wei = (params.front_run_amount * Decimal::from(10u128.pow(18)))
        .to_u128()
        .unwrap_or(0);

    let front_call = json!({
        "method": "swapExactIn",
        "token": params.token.as_str(),
        "amountIn": amount_wei.to_string(),
        "direction": "buy",
    });
    let back_call = json!({
        "method": "swapExactIn",
        "token": params.token.as_str(),
        "amountIn": amount_wei.to_string(),
        "direction": "sell",
    });

    let front = PendingTransaction {
        hash: TxHash::new(format!("local:sandwich_front:{nonce}")),
        from: ctx.sender.clone(),
        to: Some(router.clone()),
        value: amount_wei,
        gas_price: front_gas_price,
        gas_limit: SWAP_GAS_LIMIT,
        nonce,
        data: serde_json::to_vec(&front_call).unwrap_or_default(),
    };

    let back = PendingTransaction {
        hash: TxHash::new(format!("local:sandwich_back:{}", nonce + 1)),
        from: ctx.sender.clone(),
        to: Some(router),
        value: 0,
        gas_price: back_gas_price,
        gas_limit: SWAP_GAS_LIMIT,
        nonce: nonce + 1,
        data: serde_json::to_vec(&back_call).unwrap_or_default(),
    };

    Ok(vec![front, params.victim.clone(), back])
}
