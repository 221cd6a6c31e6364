use crate::chain::{ChainTransaction, Receipt};
use crate::error::{Result, SpinwheelError};
use crate::types::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ethereum JSON-RPC 2.0 over HTTP.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    pub fn new(url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                SpinwheelError::network_connection(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::trace!(method, id = request.id, "rpc request");

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(SpinwheelError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(response.result)
            .map_err(|e| SpinwheelError::decode(format!("{} result: {}", method, e)))
    }
}

pub fn parse_quantity(value: &str) -> Result<u128> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| SpinwheelError::decode(format!("quantity '{}' is missing 0x", value)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| SpinwheelError::decode(format!("quantity '{}': {}", value, e)))
}

pub fn parse_u64_quantity(value: &str) -> Result<u64> {
    u64::try_from(parse_quantity(value)?)
        .map_err(|_| SpinwheelError::decode(format!("quantity '{}' exceeds u64", value)))
}

pub fn to_quantity(value: u128) -> String {
    format!("{:#x}", value)
}

pub fn parse_data(value: &str) -> Result<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| SpinwheelError::decode(format!("data '{}': {}", value, e)))
}

pub fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub input: String,
    pub block_number: Option<String>,
}

impl TryFrom<RpcTransaction> for ChainTransaction {
    type Error = SpinwheelError;

    fn try_from(raw: RpcTransaction) -> Result<Self> {
        Ok(Self {
            hash: raw.hash.parse()?,
            from: raw.from.parse()?,
            to: raw.to.as_deref().map(|s| s.parse::<Address>()).transpose()?,
            value: parse_quantity(&raw.value)?,
            input: parse_data(&raw.input)?,
            block_number: raw
                .block_number
                .as_deref()
                .map(parse_u64_quantity)
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: String,
    pub block_number: String,
    pub gas_used: String,
    /// Absent on pre-Byzantium chains.
    pub status: Option<String>,
}

impl TryFrom<RpcReceipt> for Receipt {
    type Error = SpinwheelError;

    fn try_from(raw: RpcReceipt) -> Result<Self> {
        let success = match raw.status.as_deref() {
            Some(status) => parse_quantity(status)? == 1,
            None => true,
        };
        Ok(Self {
            tx_hash: raw.transaction_hash.parse()?,
            block_number: parse_u64_quantity(&raw.block_number)?,
            gas_used: parse_u64_quantity(&raw.gas_used)?,
            success,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcBlock {
    pub transactions: Vec<RpcTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert_eq!(parse_quantity("0x1bc16d674ec80000").unwrap(), 2_000_000_000_000_000_000);
        assert!(parse_quantity("12").is_err());
        assert_eq!(to_quantity(0), "0x0");
        assert_eq!(to_quantity(21_000), "0x5208");
    }

    #[test]
    fn test_transaction_from_rpc_json() {
        let raw: RpcTransaction = serde_json::from_value(json!({
            "hash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "from": "0xbc0c054066966a7a6c875981a18376e2296e5815",
            "to": "0x370806781689e670f85311700445449ac7c3ff7a",
            "value": "0x0",
            "input": "0xa9059cbb0000000000000000000000004ec983b240535be1592d8b4c2efa065bf9a87fbb000000000000000000000000000000000000000000000002b5e3af16b1880000",
            "blockNumber": "0x1b4",
            "gas": "0x186a0",
            "nonce": "0x2"
        }))
        .unwrap();

        let tx = ChainTransaction::try_from(raw).unwrap();
        assert_eq!(tx.block_number, Some(436));
        assert_eq!(tx.value, 0);
        let (to, amount) = tx.token_transfer().unwrap();
        assert_eq!(
            to,
            "0x4ec983b240535be1592d8b4c2efa065bf9a87fbb".parse().unwrap()
        );
        assert_eq!(amount.base_units(), 50_000_000_000_000_000_000);
    }

    #[test]
    fn test_pending_transaction_has_no_block() {
        let raw: RpcTransaction = serde_json::from_value(json!({
            "hash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "from": "0xbc0c054066966a7a6c875981a18376e2296e5815",
            "to": null,
            "value": "0x10",
            "input": "0x",
            "blockNumber": null
        }))
        .unwrap();
        let tx = ChainTransaction::try_from(raw).unwrap();
        assert_eq!(tx.block_number, None);
        assert_eq!(tx.to, None);
        assert!(tx.token_transfer().is_none());
    }

    #[test]
    fn test_receipt_status() {
        let raw: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": "0x10",
            "gasUsed": "0xcf08",
            "status": "0x0"
        }))
        .unwrap();
        let receipt = Receipt::try_from(raw).unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, 53_000);
    }
}
