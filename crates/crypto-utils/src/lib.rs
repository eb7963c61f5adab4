//! # crypto-utils
//!
//! Key derivation, symmetric encryption, secure random generation and
//! zeroizing buffers backing the wallet keystore.

pub mod encryption;
pub mod error;
pub mod kdf;
pub mod random;
pub mod zeroizing;

pub use error::CryptoError;
pub use kdf::KdfParams;
pub use zeroizing::ZeroizingBytes;
