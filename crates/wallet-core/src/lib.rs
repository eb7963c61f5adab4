//! Wallet core: key management, Web3 v3 keystores, contract calls and
//! ERC-20 helpers over a caller-supplied JSON-RPC transport.
//!
//! Everything here is synchronous except the [`transport::RpcTransport`]
//! boundary. Services hold no global state; construct a [`KeyManager`] or
//! [`ContractService`] once and pass it by reference.

pub mod contract;
pub mod error;
pub mod keys;
pub mod keystore;
pub mod manager;
pub mod rpc;
pub mod token;
pub mod transport;

pub use contract::{ContractService, TxOptions};
pub use error::{ErrorCategory, WalletError};
pub use keys::KeyPair;
pub use keystore::EncryptedKeystore;
pub use manager::{Account, KeyManager};
pub use token::{account_balance, TokenInfo, TokenService};
pub use transport::{BlockTag, CallInput, RpcTransport, TransportError};
