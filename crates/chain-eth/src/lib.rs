//! Ethereum primitives for the wallet core.
//!
//! This crate provides:
//! - Exact decimal/base-unit conversion for coin and token amounts
//! - Address derivation from secp256k1 keys with EIP-55 checksums
//! - A Solidity ABI codec with JSON ABI parsing and event decoding
//! - Legacy and EIP-155 transaction building, signing and recovery
//! - The ERC-20 ABI and a table of EVM networks

pub mod abi;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod transaction;
pub mod units;

pub use error::EthError;
