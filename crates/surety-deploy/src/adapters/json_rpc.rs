//! # JSON-RPC Ledger
//!
//! [`Ledger`] over an Ethereum-compatible node with unlocked accounts
//! (`eth_accounts`, `eth_sendTransaction`, `eth_getTransactionReceipt`).
//!
//! Receipts are polled within a [`ReceiptPolicy`] budget. Logs are decoded
//! against interfaces bound per emitting address; components created through
//! this ledger are bound automatically.

use crate::config::ReceiptPolicy;
use crate::domain::abi::{decode_event, encode, encode_call, event_topic};
use crate::domain::entities::Component;
use crate::domain::interface::Interface;
use crate::domain::value_objects::{Address, Hash, Identity, Wei};
use crate::errors::LedgerError;
use crate::ports::outbound::{CallReceipt, ComponentSpec, ContractCall, Ledger, LedgerEvent};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: String,
    params: T,
    id: u64,
}

impl<T> JsonRpcRequest<T> {
    fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error {}: {}", self.code, self.message)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest {
    from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,
    data: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcLog {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Ledger adapter speaking JSON-RPC to a node.
pub struct JsonRpcLedger {
    client: Client,
    url: String,
    receipts: ReceiptPolicy,
    gas_limit: Option<u64>,
    interfaces: RwLock<HashMap<Address, Interface>>,
    request_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Create a client for the node at `url`.
    pub fn new(url: impl Into<String>, receipts: ReceiptPolicy) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            receipts,
            gas_limit: None,
            interfaces: RwLock::new(HashMap::new()),
            request_id: AtomicU64::new(1),
        })
    }

    /// Sends an explicit gas limit with every transaction instead of letting
    /// the node estimate.
    #[must_use]
    pub fn with_gas_limit(mut self, gas: u64) -> Self {
        self.gas_limit = Some(gas);
        self
    }

    /// Node endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decode logs emitted by `address` using `interface`.
    pub fn bind(&self, address: Address, interface: Interface) {
        self.interfaces.write().insert(address, interface);
    }

    /// Unlocked accounts of the node, in node order.
    pub async fn accounts(&self) -> Result<Vec<Identity>, LedgerError> {
        let raw: Vec<String> = self.call("eth_accounts", [(); 0]).await?;
        raw.iter()
            .map(|a| parse_address(a).map(Identity::new))
            .collect()
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call<P: Serialize + Send + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, LedgerError> {
        self.request(method, params)
            .await?
            .ok_or_else(|| LedgerError::Malformed(format!("missing result for {method}")))
    }

    /// Like `call`, but a `null` result is `Ok(None)`.
    async fn request<P: Serialize + Send + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, LedgerError> {
        let request = JsonRpcRequest::new(method, params, self.next_id());

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LedgerError::Transport(format!("cannot connect to {}", self.url))
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(classify_rpc_error(&error));
        }

        Ok(rpc_response.result)
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        let raw_hash: String = self.call("eth_sendTransaction", [tx]).await?;
        let tx_hash = parse_hash(&raw_hash)?;
        debug!(tx = %tx_hash, "Submitted transaction");
        self.wait_for_receipt(tx_hash).await
    }

    async fn wait_for_receipt(&self, tx_hash: Hash) -> Result<TransactionReceipt, LedgerError> {
        for _ in 0..self.receipts.max_polls {
            let receipt: Option<TransactionReceipt> = self
                .request("eth_getTransactionReceipt", [tx_hash.to_hex()])
                .await?;

            if let Some(receipt) = receipt {
                if receipt.status.as_deref() == Some("0x0") {
                    return Err(LedgerError::Reverted {
                        reason: format!("transaction {tx_hash} failed with status 0x0"),
                    });
                }
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipts.poll_interval).await;
        }

        Err(LedgerError::NotFinalized {
            tx_hash,
            polls: self.receipts.max_polls,
        })
    }

    fn decode_logs(&self, logs: &[RpcLog]) -> Vec<LedgerEvent> {
        let interfaces = self.interfaces.read();
        let mut events = Vec::with_capacity(logs.len());

        for log in logs {
            let Ok(emitter) = parse_address(&log.address) else {
                continue;
            };
            let Some(interface) = interfaces.get(&emitter) else {
                debug!(emitter = %emitter, "Skipping log from unbound address");
                continue;
            };
            let Ok(topics) = log
                .topics
                .iter()
                .map(|t| parse_hash(t))
                .collect::<Result<Vec<_>, _>>()
            else {
                continue;
            };
            let Some((topic0, indexed)) = topics.split_first() else {
                continue;
            };
            let Some(event) = interface
                .events()
                .find(|e| event_topic(&e.signature()) == *topic0)
            else {
                continue;
            };

            let data = match decode_hex(&log.data) {
                Ok(data) => data,
                Err(e) => {
                    warn!(emitter = %emitter, error = %e, "Undecodable log data");
                    continue;
                }
            };
            match decode_event(event, indexed, &data) {
                Ok(args) => events.push(LedgerEvent {
                    emitter,
                    name: event.name().to_string(),
                    args,
                }),
                Err(e) => warn!(event = %event.name(), error = %e, "Failed to decode event"),
            }
        }

        events
    }

    fn transaction(
        &self,
        from: Identity,
        to: Option<Address>,
        data: &[u8],
        value: Wei,
    ) -> TransactionRequest {
        TransactionRequest {
            from: from.address().to_hex(),
            to: to.map(|a| a.to_hex()),
            data: format!("0x{}", hex::encode(data)),
            value: format!("{value:#x}"),
            gas: self.gas_limit.map(|g| format!("{g:#x}")),
        }
    }
}

#[async_trait]
impl Ledger for JsonRpcLedger {
    async fn create(
        &self,
        spec: &ComponentSpec,
        from: Identity,
        value: Wei,
    ) -> Result<Component, LedgerError> {
        let mut data = decode_hex(&spec.artifact.bytecode)
            .map_err(|_| LedgerError::InvalidBytecode(spec.name().to_string()))?;
        if data.is_empty() {
            return Err(LedgerError::InvalidBytecode(spec.name().to_string()));
        }
        data.extend_from_slice(&encode(&spec.constructor_args));

        let receipt = self.submit(self.transaction(from, None, &data, value)).await?;
        let address = receipt
            .contract_address
            .as_deref()
            .ok_or_else(|| LedgerError::Malformed("receipt has no contractAddress".to_string()))
            .and_then(parse_address)?;
        let tx_hash = parse_hash(&receipt.transaction_hash)?;

        self.bind(address, spec.artifact.abi.clone());

        Ok(Component::new(
            spec.name(),
            address,
            spec.artifact.abi.clone(),
            tx_hash,
        ))
    }

    async fn send(&self, call: &ContractCall) -> Result<CallReceipt, LedgerError> {
        let data = encode_call(&call.method, &call.args);
        let receipt = self
            .submit(self.transaction(call.from, Some(call.to), &data, call.value))
            .await?;

        Ok(CallReceipt {
            tx_hash: parse_hash(&receipt.transaction_hash)?,
            events: self.decode_logs(&receipt.logs),
        })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn classify_rpc_error(error: &JsonRpcError) -> LedgerError {
    // Development nodes execute eagerly and report reverts as RPC errors.
    if error.message.to_ascii_lowercase().contains("revert") {
        LedgerError::Reverted {
            reason: error.message.clone(),
        }
    } else {
        LedgerError::Rpc(error.to_string())
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

fn parse_address(s: &str) -> Result<Address, LedgerError> {
    s.parse()
        .map_err(|e: crate::domain::value_objects::ParseHexError| {
            LedgerError::Malformed(e.to_string())
        })
}

fn parse_hash(s: &str) -> Result<Hash, LedgerError> {
    s.parse()
        .map_err(|e: crate::domain::value_objects::ParseHexError| {
            LedgerError::Malformed(e.to_string())
        })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::CallArg;
    use crate::domain::interface::{CallSignature, Param};

    fn ledger() -> JsonRpcLedger {
        JsonRpcLedger::new(
            "http://127.0.0.1:1",
            ReceiptPolicy {
                poll_interval: Duration::from_millis(1),
                max_polls: 1,
            },
        )
        .unwrap()
    }

    fn registry_interface() -> Interface {
        Interface::new(vec![CallSignature::event(
            "OracleRegistered",
            vec![Param::new("oracle", "address")],
        )])
    }

    #[test]
    fn test_transaction_encoding() {
        let ledger = ledger().with_gas_limit(9_500_000);
        let from = Identity::new(Address::new([0xab; 20]));
        let tx = ledger.transaction(from, None, &[0x60, 0x80], Wei::from(255u64));

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["from"], format!("0x{}", "ab".repeat(20)));
        assert!(json.get("to").is_none());
        assert_eq!(json["data"], "0x6080");
        assert_eq!(json["value"], "0xff");
        assert_eq!(json["gas"], "0x90f560");
    }

    #[test]
    fn test_decode_logs_uses_bound_interface() {
        let ledger = ledger();
        let emitter = Address::new([0x11; 20]);
        let oracle = Address::new([0x22; 20]);
        ledger.bind(emitter, registry_interface());

        let log = RpcLog {
            address: emitter.to_hex(),
            topics: vec![event_topic("OracleRegistered(address)").to_hex()],
            data: format!("0x{}", hex::encode(encode(&[CallArg::Address(oracle)]))),
        };
        let unbound = RpcLog {
            address: Address::new([0x33; 20]).to_hex(),
            ..log.clone()
        };

        let events = ledger.decode_logs(&[log, unbound]);
        assert_eq!(events.len(), 1);
        assert!(events[0].names("OracleRegistered", oracle));
        assert_eq!(events[0].emitter, emitter);
    }

    #[test]
    fn test_revert_messages_are_classified() {
        let revert = JsonRpcError {
            code: -32000,
            message: "VM Exception while processing transaction: revert Caller is not contract owner".into(),
        };
        assert!(classify_rpc_error(&revert).is_revert());

        let other = JsonRpcError {
            code: -32601,
            message: "Method not found".into(),
        };
        assert!(matches!(classify_rpc_error(&other), LedgerError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let err = ledger().accounts().await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_bytecode() {
        let spec = ComponentSpec::new(
            crate::domain::interface::Artifact::new("Empty", Interface::default(), "0x"),
            Vec::new(),
        );
        let err = ledger()
            .create(&spec, Identity::new(Address::ZERO), Wei::zero())
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidBytecode("Empty".into()));
    }
}
