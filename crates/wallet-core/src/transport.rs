use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use chain_eth::transaction::SignedTransaction;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failure reported by the transport. The core never retries or
/// interprets these beyond surfacing them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Block a read is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
    Earliest,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Pending => f.write_str("pending"),
            BlockTag::Earliest => f.write_str("earliest"),
            BlockTag::Number(n) => write!(f, "{n:#x}"),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An unsigned read against a contract: `eth_call` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

impl CallInput {
    /// A call without a `from` field.
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from: None,
            to,
            data: data.into(),
        }
    }
}

/// The "submit request, await response" capability supplied by the caller.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Executes a read and returns the raw `0x`-prefixed hex result.
    async fn call(&self, input: &CallInput, block: BlockTag) -> Result<String, TransportError>;

    /// Broadcasts a signed transaction and returns its hash.
    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<String, TransportError>;

    /// Native coin balance of `address` in base units.
    async fn get_balance(&self, address: Address, block: BlockTag) -> Result<U256, TransportError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Answers `eth_call` by selector and records broadcasts.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub responses: Mutex<HashMap<[u8; 4], String>>,
        pub balances: Mutex<HashMap<Address, U256>>,
        pub sent: Mutex<Vec<SignedTransaction>>,
    }

    impl MockTransport {
        pub fn respond(&self, selector: [u8; 4], raw: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(selector, raw.to_string());
        }
    }

    #[async_trait]
    impl RpcTransport for MockTransport {
        async fn call(&self, input: &CallInput, _block: BlockTag) -> Result<String, TransportError> {
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&input.data[..4]);
            self.responses
                .lock()
                .unwrap()
                .get(&selector)
                .cloned()
                .ok_or_else(|| TransportError::Rpc {
                    code: -32000,
                    message: "execution reverted".into(),
                })
        }

        async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<String, TransportError> {
            self.sent.lock().unwrap().push(tx.clone());
            Ok(tx.hash.to_string())
        }

        async fn get_balance(&self, address: Address, _block: BlockTag) -> Result<U256, TransportError> {
            Ok(self
                .balances
                .lock()
                .unwrap()
                .get(&address)
                .copied()
                .unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tag_rendering() {
        assert_eq!(BlockTag::Latest.to_string(), "latest");
        assert_eq!(BlockTag::Pending.to_string(), "pending");
        assert_eq!(BlockTag::Earliest.to_string(), "earliest");
        assert_eq!(BlockTag::Number(436).to_string(), "0x1b4");
        assert_eq!(BlockTag::default(), BlockTag::Latest);
    }

    #[test]
    fn call_input_serializes_as_eth_call_object() {
        let input = CallInput::new(Address::repeat_byte(0x11), vec![0x18u8, 0x16, 0x0d, 0xdd]);
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["to"], "0x1111111111111111111111111111111111111111");
        assert_eq!(value["data"], "0x18160ddd");
        assert!(value.get("from").is_none());
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Rpc {
            code: -32000,
            message: "nonce too low".into(),
        };
        assert_eq!(err.to_string(), "rpc error -32000: nonce too low");
    }
}
