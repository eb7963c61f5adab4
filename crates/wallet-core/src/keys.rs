use std::fmt;

use alloy_primitives::Address;
use chain_eth::address::{address_from_private_key, to_checksum};
use crypto_utils::random::random_bytes_fixed;
use crypto_utils::ZeroizingBytes;
use k256::ecdsa::SigningKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WalletError;

/// A secp256k1 private key and the address it controls.
///
/// The scalar is wiped when the pair is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    private_key: [u8; 32],
    #[zeroize(skip)]
    address: Address,
}

impl KeyPair {
    /// Draws a uniformly random scalar in `[1, n-1]` from the OS CSPRNG.
    ///
    /// Candidates equal to zero or at/above the curve order are discarded
    /// and redrawn.
    pub fn generate() -> Self {
        loop {
            let mut candidate = random_bytes_fixed::<32>();
            let derived = address_from_private_key(&candidate);
            match derived {
                Ok(address) => {
                    let pair = Self {
                        private_key: candidate,
                        address,
                    };
                    candidate.zeroize();
                    return pair;
                }
                Err(_) => candidate.zeroize(),
            }
        }
    }

    /// Imports a raw secp256k1 secret, rejecting zero and out-of-range scalars.
    pub fn from_private_key(private_key: &[u8; 32]) -> Result<Self, WalletError> {
        let address = address_from_private_key(private_key)?;
        Ok(Self {
            private_key: *private_key,
            address,
        })
    }

    /// Imports a 64-character hex private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self, WalletError> {
        let hex_part = private_key
            .trim()
            .strip_prefix("0x")
            .unwrap_or_else(|| private_key.trim());
        if hex_part.len() != 64 {
            return Err(WalletError::InvalidPrivateKey(format!(
                "expected 64 hex characters, got {}",
                hex_part.len()
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|e| WalletError::InvalidPrivateKey(format!("invalid hex: {e}")))?;
        let pair = Self::from_private_key(&bytes);
        bytes.zeroize();
        pair
    }

    /// Address controlled by this key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// 65-byte uncompressed public key (`0x04 || x || y`).
    pub fn public_key(&self) -> Result<[u8; 65], WalletError> {
        let signing_key = SigningKey::from_bytes((&self.private_key).into())
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        let encoded = signing_key.verifying_key().to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(encoded.as_bytes());
        Ok(out)
    }

    /// Copy of the private scalar, wiped when the copy is dropped.
    pub fn private_key(&self) -> ZeroizingBytes {
        ZeroizingBytes::new(self.private_key.to_vec())
    }

    pub(crate) fn secret(&self) -> &[u8; 32] {
        &self.private_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &to_checksum(&self.address))
            .finish_non_exhaustive()
    }
}
