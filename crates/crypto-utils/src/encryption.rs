use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};

use crate::error::CryptoError;
use crate::random::random_bytes_fixed;

/// AES-128 key size in bytes.
pub const KEY_SIZE: usize = 16;

/// AES-CTR initialization vector size in bytes.
pub const IV_SIZE: usize = 16;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// Encrypts `plaintext` with AES-128-CTR under `key` and `iv`.
///
/// CTR mode is a stream cipher: the ciphertext has the same length as the
/// plaintext and carries no authentication. Callers must MAC the result.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8; IV_SIZE]) -> Result<Vec<u8>, CryptoError> {
    apply_keystream(plaintext, key, iv)
}

/// Decrypts data produced by [`encrypt`].
///
/// Never fails on a wrong key; verify the MAC before calling this.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8; IV_SIZE]) -> Result<Vec<u8>, CryptoError> {
    apply_keystream(ciphertext, key, iv)
}

/// Generates a fresh random IV.
pub fn generate_iv() -> [u8; IV_SIZE] {
    random_bytes_fixed::<IV_SIZE>()
}

fn apply_keystream(input: &[u8], key: &[u8], iv: &[u8; IV_SIZE]) -> Result<Vec<u8>, CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }

    let mut cipher = Aes128Ctr::new_from_slices(key, iv)
        .map_err(|e| CryptoError::CipherFailed(e.to_string()))?;

    let mut buf = input.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}
