//! JSON-RPC chain client
//!
//! HTTP implementation of [`ChainClient`] against a standard execution-node
//! RPC endpoint. Used by the binary; the core only sees the trait.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::chain::{ChainClient, ChainError, Receipt, SignedTransaction};
use crate::utils::config::ChainConfig;
use crate::utils::types::{Address, PendingTransaction, TxHash};

/// HTTP JSON-RPC client for an execution node
#[derive(Debug, Clone)]
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    url: String,
}

impl JsonRpcChainClient {
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(Self {
            http,
            url: config.rpc_url.clone(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if let Some(err) = response.get("error") {
            return Err(ChainError::Rpc(err.to_string()));
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::Malformed(format!("{method}: missing result")))
    }
}

fn parse_quantity(value: &Value, field: &str) -> Result<u128, ChainError> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainError::Malformed(format!("{field}: expected hex string")))?;
    u128::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| ChainError::Malformed(format!("{field}: {e}")))
}

fn parse_transaction(tx: &Value) -> Result<PendingTransaction, ChainError> {
    let hash = tx
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::Malformed("transaction without hash".to_string()))?;
    let from = tx
        .get("from")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::Malformed("transaction without sender".to_string()))?;
    let to = tx.get("to").and_then(Value::as_str).map(Address::from);

    let data = tx
        .get("input")
        .and_then(Value::as_str)
        .map(|s| s.trim_start_matches("0x").as_bytes().to_vec())
        .unwrap_or_default();

    Ok(PendingTransaction {
        hash: TxHash::from(hash),
        from: Address::from(from),
        to,
        value: parse_quantity(tx.get("value").unwrap_or(&Value::Null), "value").unwrap_or(0),
        gas_price: parse_quantity(tx.get("gasPrice").unwrap_or(&Value::Null), "gasPrice")
            .unwrap_or(0) as u64,
        gas_limit: parse_quantity(tx.get("gas").unwrap_or(&Value::Null), "gas").unwrap_or(0)
            as u64,
        nonce: parse_quantity(tx.get("nonce").unwrap_or(&Value::Null), "nonce").unwrap_or(0)
            as u64,
        data,
    })
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn pending_transactions(&self) -> Result<Vec<PendingTransaction>, ChainError> {
        let block = self
            .call("eth_getBlockByNumber", json!(["pending", true]))
            .await?;

        let txs = block
            .get("transactions")
            .and_then(Value::as_array)
            .ok_or_else(|| ChainError::Malformed("pending block without transactions".to_string()))?;

        txs.iter().map(parse_transaction).collect()
    }

    async fn gas_price(&self) -> Result<u64, ChainError> {
        let result = self.call("eth_gasPrice", json!([])).await?;
        Ok(parse_quantity(&result, "gasPrice")? as u64)
    }

    async fn base_fee(&self) -> Result<u64, ChainError> {
        let block = self
            .call("eth_getBlockByNumber", json!(["latest", false]))
            .await?;

        let base_fee = block
            .get("baseFeePerGas")
            .ok_or_else(|| ChainError::Malformed("block without baseFeePerGas".to_string()))?;
        Ok(parse_quantity(base_fee, "baseFeePerGas")? as u64)
    }

    async fn estimate_gas(&self, tx: &PendingTransaction) -> Result<u64, ChainError> {
        let mut call = json!({
            "from": tx.from.as_str(),
            "value": format!("0x{:x}", tx.value),
            "data": format!("0x{}", String::from_utf8_lossy(&tx.data)),
        });
        if let Some(to) = &tx.to {
            call["to"] = json!(to.as_str());
        }

        let result = self.call("eth_estimateGas", json!([call])).await?;
        Ok(parse_quantity(&result, "estimateGas")? as u64)
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<TxHash, ChainError> {
        let raw = format!("0x{}", hex_encode(&tx.raw));
        let result = self.call("eth_sendRawTransaction", json!([raw])).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| ChainError::Malformed("sendRawTransaction: expected hash".to_string()))?;
        Ok(TxHash::from(hash))
    }

    async fn wait_for_receipt(
        &self,
        hash: &TxHash,
        timeout: Duration,
    ) -> Result<Receipt, ChainError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let result = self
                .call("eth_getTransactionReceipt", json!([hash.as_str()]))
                .await?;

            if !result.is_null() {
                let status = parse_quantity(result.get("status").unwrap_or(&Value::Null), "status")
                    .unwrap_or(0);
                return Ok(Receipt {
                    transaction_hash: hash.clone(),
                    block_number: parse_quantity(
                        result.get("blockNumber").unwrap_or(&Value::Null),
                        "blockNumber",
                    )? as u64,
                    gas_used: parse_quantity(
                        result.get("gasUsed").unwrap_or(&Value::Null),
                        "gasUsed",
                    )? as u64,
                    success: status == 1,
                });
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ChainError::ReceiptTimeout(hash.clone()));
            }

            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    async fn transaction_count(&self, address: &Address) -> Result<u64, ChainError> {
        let result = self
            .call("eth_getTransactionCount", json!([address.as_str(), "latest"]))
            .await?;
        Ok(parse_quantity(&result, "transactionCount")? as u64)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
