use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("cipher failed: {0}")]
    CipherFailed(String),

    #[error("key derivation failed: {0}")]
    KdfFailed(String),

    #[error("invalid kdf parameters: {0}")]
    InvalidKdfParams(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}
