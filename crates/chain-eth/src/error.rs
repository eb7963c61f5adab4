use thiserror::Error;

/// Ethereum chain operation errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

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

    #[error("function {function} is not payable but value {value} was attached")]
    NonPayableValue { function: String, value: String },

    #[error("signer mismatch: transaction is from {expected}, key controls {actual}")]
    SignerMismatch { expected: String, actual: String },

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_amount() {
        let err = EthError::InvalidAmount("negative value".into());
        assert_eq!(err.to_string(), "invalid amount: negative value");
    }

    #[test]
    fn display_argument_count_mismatch() {
        let err = EthError::ArgumentCountMismatch {
            function: "transfer".into(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "argument count mismatch for transfer: expected 2, got 1"
        );
    }

    #[test]
    fn display_type_mismatch() {
        let err = EthError::TypeMismatch {
            expected: "address".into(),
            actual: "bool".into(),
        };
        assert_eq!(err.to_string(), "type mismatch: expected address, got bool");
    }

    #[test]
    fn display_malformed_output() {
        let err = EthError::MalformedOutput("need 32 bytes, got 4".into());
        assert_eq!(err.to_string(), "malformed output: need 32 bytes, got 4");
    }

    #[test]
    fn display_signer_mismatch() {
        let err = EthError::SignerMismatch {
            expected: "0xaa".into(),
            actual: "0xbb".into(),
        };
        assert_eq!(
            err.to_string(),
            "signer mismatch: transaction is from 0xaa, key controls 0xbb"
        );
    }

    #[test]
    fn debug_format_works() {
        let err = EthError::EncodingError("rlp".into());
        assert!(format!("{:?}", err).contains("EncodingError"));
    }
}
