use chain_eth::error::EthError;
use crypto_utils::error::CryptoError;
use thiserror::Error;

use crate::transport::TransportError;

/// What the user can do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix the amount, address, arguments or record that was supplied.
    InvalidInput,
    /// Re-enter the password.
    Authentication,
    /// The node or connection failed; try again later.
    Network,
    /// A bug or an environment failure.
    Internal,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("authentication failed: wrong password or corrupted keystore")]
    AuthenticationFailed,

    #[error("invalid keystore format: {0}")]
    InvalidKeystoreFormat(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid abi: {0}")]
    InvalidAbi(String),

    #[error("argument count mismatch for {function}: expected {expected}, got {actual}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("malformed output: {0}")]
    MalformedOutput(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("function {function} is not payable but value {value} was attached")]
    NonPayableValue { function: String, value: String },

    #[error("signer mismatch: transaction is from {expected}, key controls {actual}")]
    SignerMismatch { expected: String, actual: String },

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Coarse class of the failure, for choosing a corrective action.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WalletError::AuthenticationFailed => ErrorCategory::Authentication,
            WalletError::Transport(_) => ErrorCategory::Network,
            WalletError::Internal(_) => ErrorCategory::Internal,
            _ => ErrorCategory::InvalidInput,
        }
    }
}

impl From<EthError> for WalletError {
    fn from(e: EthError) -> Self {
        match e {
            EthError::InvalidAmount(msg) => WalletError::InvalidAmount(msg),
            EthError::InvalidPrivateKey(msg) | EthError::InvalidPublicKey(msg) => {
                WalletError::InvalidPrivateKey(msg)
            }
            EthError::InvalidAddress(msg) => WalletError::InvalidAddress(msg),
            EthError::InvalidAbi(msg) => WalletError::InvalidAbi(msg),
            EthError::ArgumentCountMismatch {
                function,
                expected,
                actual,
            } => WalletError::ArgumentCountMismatch {
                function,
                expected,
                actual,
            },
            EthError::TypeMismatch { expected, actual } => {
                WalletError::TypeMismatch { expected, actual }
            }
            EthError::MalformedOutput(msg) => WalletError::MalformedOutput(msg),
            EthError::NonPayableValue { function, value } => {
                WalletError::NonPayableValue { function, value }
            }
            EthError::SignerMismatch { expected, actual } => {
                WalletError::SignerMismatch { expected, actual }
            }
            EthError::EncodingError(msg) => WalletError::InvalidTransaction(msg),
            EthError::SigningError(msg) => WalletError::Internal(format!("signing: {msg}")),
        }
    }
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidKdfParams(_) | CryptoError::InvalidKeyLength { .. } => {
                WalletError::InvalidKeystoreFormat(e.to_string())
            }
            CryptoError::CipherFailed(_) | CryptoError::KdfFailed(_) => {
                WalletError::Internal(e.to_string())
            }
        }
    }
}
