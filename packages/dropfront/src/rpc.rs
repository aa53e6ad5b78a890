//! EVM JSON-RPC client with primary → fallback failover and circuit breaker.

use crate::abi::IDrop;
use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::SolCall;
use dropfront_types::units::parse_u256;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

use crate::metrics::METRICS;

const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
const CIRCUIT_BREAKER_WINDOW_MS: u64 = 30_000;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const RECEIPT_POLL_MS: u64 = 1_000;

struct CircuitState {
    failures: u64,
    last_failure_ms: u64,
    open: bool,
}

/// Why a JSON-RPC call produced no result.
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// Node unreachable or replied with something that isn't JSON-RPC.
    Transport(String),
    /// Node answered with a JSON-RPC `error` object.
    Node { code: i64, message: String, data: Option<Value> },
}

impl CallError {
    /// Revert/error text as the node reported it.
    pub fn reason(&self) -> String {
        match self {
            CallError::Transport(msg) => msg.clone(),
            CallError::Node { message, data, .. } => match data {
                Some(Value::String(extra)) if !extra.is_empty() => format!("{message}: {extra}"),
                _ => message.clone(),
            },
        }
    }
}

impl From<CallError> for crate::Error {
    fn from(e: CallError) -> Self {
        crate::Error::Rpc(e.reason())
    }
}

/// Outcome of waiting on a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Confirmed,
    Reverted,
    Pending,
}

/// JSON-RPC client with primary → fallback failover.
pub struct RpcClient {
    http: reqwest::Client,
    primary_url: String,
    fallback_url: String,
    circuit: Mutex<CircuitState>,
    total_failovers: AtomicU64,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(primary_url: &str, fallback_url: &str) -> Self {
        info!(
            primary = primary_url,
            fallback = fallback_url,
            "RPC client initialized with failover"
        );
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            primary_url: primary_url.to_string(),
            fallback_url: fallback_url.to_string(),
            circuit: Mutex::new(CircuitState {
                failures: 0,
                last_failure_ms: 0,
                open: false,
            }),
            total_failovers: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    // --- Raw calls ---

    async fn post(&self, url: &str, method: &str, params: &Value) -> Result<Value, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Transport(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Transport(format!("{method} HTTP {status}")));
        }

        let mut reply: Value = response
            .json()
            .await
            .map_err(|e| CallError::Transport(format!("{method} parse error: {e}")))?;

        if let Some(err) = reply.get("error") {
            return Err(CallError::Node {
                code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
                data: err.get("data").cloned(),
            });
        }
        match reply.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(CallError::Transport(format!("{method} reply has no result"))),
        }
    }

    /// Call on the active endpoint, retrying once on the other one when the
    /// transport fails. Node-level errors are returned as-is.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, CallError> {
        let (first, second) = if self.is_circuit_open() {
            (&self.fallback_url, &self.primary_url)
        } else {
            (&self.primary_url, &self.fallback_url)
        };

        match self.post(first, method, &params).await {
            Ok(result) => {
                self.record_success();
                Ok(result)
            }
            Err(e @ CallError::Node { .. }) => {
                self.record_success();
                Err(e)
            }
            Err(CallError::Transport(e)) => {
                self.record_failure();
                warn!(error = %e, method, "RPC call failed, trying other endpoint");
                self.post(second, method, &params).await.map_err(|e2| match e2 {
                    CallError::Transport(e2) => CallError::Transport(format!(
                        "{method} failed on both RPCs: first={e}, second={e2}"
                    )),
                    node => node,
                })
            }
        }
    }

    // --- Contract reads ---

    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, CallError> {
        let result = self
            .call(
                "eth_call",
                json!([{ "to": to.to_string(), "data": hex::encode_prefixed(data) }, "latest"]),
            )
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| CallError::Transport("eth_call result is not a string".into()))?;
        hex::decode(raw).map_err(|e| CallError::Transport(format!("eth_call bad hex: {e}")))
    }

    /// `totalSupply()` of an ERC-721/1155 style contract.
    pub async fn total_supply(&self, contract: Address) -> Result<U256, CallError> {
        let bytes = self
            .eth_call(contract, &IDrop::totalSupplyCall {}.abi_encode())
            .await?;
        let decoded = IDrop::totalSupplyCall::abi_decode_returns(&bytes, true)
            .map_err(|e| CallError::Transport(format!("totalSupply decode failed: {e}")))?;
        Ok(decoded._0)
    }

    pub async fn balance(&self, account: Address) -> Result<U256, CallError> {
        let result = self
            .call("eth_getBalance", json!([account.to_string(), "latest"]))
            .await?;
        quantity(&result, "eth_getBalance")
    }

    // --- Transactions ---

    /// Submit through the node's account management; returns the tx hash.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
        value: U256,
    ) -> Result<String, CallError> {
        let tx = json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "data": hex::encode_prefixed(data),
            "value": format!("0x{value:x}"),
        });
        let result = self.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CallError::Transport("eth_sendTransaction result is not a string".into()))
    }

    /// Poll for the receipt until it lands or `timeout` elapses.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
    ) -> Result<ReceiptStatus, CallError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let receipt = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !receipt.is_null() {
                let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x1");
                return Ok(if status == "0x0" {
                    ReceiptStatus::Reverted
                } else {
                    ReceiptStatus::Confirmed
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(ReceiptStatus::Pending);
            }
            tokio::time::sleep(Duration::from_millis(RECEIPT_POLL_MS)).await;
        }
    }

    /// Quick connectivity check. Returns "ok", "degraded", or error.
    pub async fn health_check(&self) -> Result<&'static str, crate::Error> {
        let params = json!([]);
        match self.post(&self.primary_url, "eth_blockNumber", &params).await {
            Ok(_) => Ok("ok"),
            Err(_) => match self.post(&self.fallback_url, "eth_blockNumber", &params).await {
                Ok(_) => Ok("degraded"),
                Err(e) => Err(crate::Error::Rpc(format!(
                    "Both RPCs unreachable: {}",
                    e.reason()
                ))),
            },
        }
    }

    // --- Failover / circuit breaker ---

    fn record_success(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if circuit.failures > 0 {
            info!(primary = %self.primary_url, "Primary RPC recovered");
            circuit.failures = 0;
            circuit.open = false;
        }
    }

    fn record_failure(&self) {
        METRICS.rpc_errors.fetch_add(1, Ordering::Relaxed);
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures += 1;
        circuit.last_failure_ms = now_ms();
        if circuit.failures >= CIRCUIT_BREAKER_THRESHOLD && !circuit.open {
            circuit.open = true;
            self.total_failovers.fetch_add(1, Ordering::Relaxed);
            METRICS.rpc_failovers.fetch_add(1, Ordering::Relaxed);
            warn!(
                failures = circuit.failures,
                fallback = %self.fallback_url,
                "Circuit breaker opened, routing to fallback"
            );
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if !circuit.open {
            return false;
        }
        if now_ms() - circuit.last_failure_ms > CIRCUIT_BREAKER_WINDOW_MS {
            circuit.open = false;
            circuit.failures = 0;
            info!(primary = %self.primary_url, "Circuit breaker half-open, retrying primary");
            return false;
        }
        true
    }

    pub fn failover_count(&self) -> u64 {
        self.total_failovers.load(Ordering::Relaxed)
    }

    /// Currently active RPC URL.
    pub fn active_url(&self) -> &str {
        if self.is_circuit_open() {
            &self.fallback_url
        } else {
            &self.primary_url
        }
    }
}

fn quantity(result: &Value, method: &str) -> Result<U256, CallError> {
    result
        .as_str()
        .and_then(|s| parse_u256(s).ok())
        .ok_or_else(|| CallError::Transport(format!("{method} returned a non-quantity: {result}")))
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
