//! JSON-RPC request bodies and response parsing for transports that relay
//! raw HTTP or WebSocket messages.

use alloy_primitives::{Address, U256};
use chain_eth::transaction::SignedTransaction;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::transport::{BlockTag, CallInput, TransportError};

/// `eth_call` request body.
pub fn eth_call(id: u64, input: &CallInput, block: BlockTag) -> Value {
    request(id, "eth_call", json!([input, block]))
}

/// `eth_sendRawTransaction` request body carrying the raw hex.
pub fn eth_send_raw_transaction(id: u64, tx: &SignedTransaction) -> Value {
    request(id, "eth_sendRawTransaction", json!([tx.raw_hex()]))
}

/// `eth_getBalance` request body.
pub fn eth_get_balance(id: u64, address: Address, block: BlockTag) -> Value {
    request(id, "eth_getBalance", json!([address, block]))
}

fn request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Extracts the string `result` of a JSON-RPC response body.
pub fn parse_response(body: &str) -> Result<String, TransportError> {
    let response: Response =
        serde_json::from_str(body).map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
    if let Some(error) = response.error {
        return Err(TransportError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    match response.result {
        Some(Value::String(result)) => Ok(result),
        Some(other) => Err(TransportError::InvalidResponse(format!(
            "expected a string result, got {other}"
        ))),
        None => Err(TransportError::InvalidResponse("missing result".into())),
    }
}

/// Parses a hex quantity such as an `eth_getBalance` result.
pub fn parse_quantity(value: &str) -> Result<U256, TransportError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| TransportError::InvalidResponse(format!("quantity without 0x: {value}")))?;
    if digits.is_empty() {
        return Err(TransportError::InvalidResponse("empty quantity".into()));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| TransportError::InvalidResponse(format!("bad quantity {value}: {e}")))
}
