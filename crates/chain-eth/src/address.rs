use alloy_primitives::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Derives the address of an uncompressed secp256k1 public key (65 bytes,
/// starting with 0x04).
///
/// The address is the last 20 bytes of the Keccak-256 hash of the 64-byte
/// key without its 0x04 prefix.
pub fn address_from_public_key(uncompressed_pubkey: &[u8; 65]) -> Result<Address, EthError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// Derives the address controlled by a verifying key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Derives the address controlled by a 32-byte private scalar.
///
/// Fails when the scalar is zero or not below the curve order.
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<Address, EthError> {
    let signing_key = SigningKey::from_bytes(private_key.into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
    Ok(address_from_verifying_key(signing_key.verifying_key()))
}

/// Parses a `0x`-prefixed address string.
///
/// All-lowercase and all-uppercase inputs are accepted as is; mixed-case
/// inputs must carry a valid EIP-55 checksum.
pub fn parse_address(address: &str) -> Result<Address, EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    let parsed = Address::from_slice(&bytes);

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
    if !is_all_lower && !is_all_upper && &to_checksum(&parsed)[2..] != hex_part {
        return Err(EthError::InvalidAddress(format!(
            "bad EIP-55 checksum for {address}"
        )));
    }

    Ok(parsed)
}

/// Renders an address with its EIP-55 mixed-case checksum.
pub fn to_checksum(address: &Address) -> String {
    address.to_checksum(None)
}
