//! Password-protected private keys in the Web3 Secret Storage v3 format.
//!
//! A keystore derives a 32-byte key from the password with scrypt or
//! PBKDF2-HMAC-SHA256. The first half encrypts the private key under
//! AES-128-CTR. The second half authenticates the ciphertext:
//! `mac = keccak256(dk[16..32] || ciphertext)`.

use alloy_primitives::Address;
use chain_eth::address::to_checksum;
use crypto_utils::encryption::{self, IV_SIZE, KEY_SIZE};
use crypto_utils::kdf::{self, KdfParams};
use crypto_utils::ZeroizingBytes;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::keys::KeyPair;

const CIPHER: &str = "aes-128-ctr";
const PRF: &str = "hmac-sha256";
const VERSION: u32 = 3;
/// Derived key bytes consumed by the cipher key and the MAC key.
const MIN_DKLEN: usize = 32;

/// An encrypted private key at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedKeystore {
    pub address: Address,
    pub id: Uuid,
    pub kdf: KdfParams,
    pub salt: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
    pub mac: [u8; 32],
}

/// Encrypts `key` under `password`.
///
/// Salt, IV and record id are fresh on every call, so encrypting the same
/// key twice never yields the same record.
pub fn encrypt(key: &KeyPair, password: &str, params: &KdfParams) -> Result<EncryptedKeystore, WalletError> {
    check_kdf(params)?;

    let salt = kdf::generate_salt();
    let iv = encryption::generate_iv();
    let derived = kdf::derive_key(password.as_bytes(), &salt, params)?;

    let ciphertext = encryption::encrypt(key.secret(), &derived[..KEY_SIZE], &iv)?;
    let mac = compute_mac(&derived, &ciphertext);

    let keystore = EncryptedKeystore {
        address: key.address(),
        id: Uuid::new_v4(),
        kdf: *params,
        salt: salt.to_vec(),
        iv,
        ciphertext,
        mac,
    };
    tracing::info!(
        address = %to_checksum(&keystore.address),
        kdf = params.name(),
        "created keystore"
    );
    Ok(keystore)
}

/// Recovers the key pair from `keystore`.
///
/// The MAC is checked before anything is decrypted. A wrong password, a
/// tampered ciphertext or a record whose address does not match the
/// decrypted key all fail with [`WalletError::AuthenticationFailed`].
pub fn decrypt(keystore: &EncryptedKeystore, password: &str) -> Result<KeyPair, WalletError> {
    check_kdf(&keystore.kdf)?;

    let derived = kdf::derive_key(password.as_bytes(), &keystore.salt, &keystore.kdf)?;
    let mac = compute_mac(&derived, &keystore.ciphertext);
    if !constant_time_eq(&mac, &keystore.mac) {
        tracing::warn!(
            address = %to_checksum(&keystore.address),
            "keystore mac mismatch"
        );
        return Err(WalletError::AuthenticationFailed);
    }

    let plaintext = ZeroizingBytes::new(encryption::decrypt(
        &keystore.ciphertext,
        &derived[..KEY_SIZE],
        &keystore.iv,
    )?);
    let mut secret = <[u8; 32]>::try_from(&plaintext[..])
        .map_err(|_| WalletError::InvalidKeystoreFormat("ciphertext must be 32 bytes".into()))?;
    let pair = KeyPair::from_private_key(&secret);
    secret.zeroize();

    let pair = pair.map_err(|_| WalletError::AuthenticationFailed)?;
    if pair.address() != keystore.address {
        tracing::warn!(
            address = %to_checksum(&keystore.address),
            "keystore address does not match decrypted key"
        );
        return Err(WalletError::AuthenticationFailed);
    }

    tracing::debug!(address = %to_checksum(&keystore.address), "unlocked keystore");
    Ok(pair)
}

fn check_kdf(params: &KdfParams) -> Result<(), WalletError> {
    params.validate()?;
    if params.dklen() < MIN_DKLEN {
        return Err(WalletError::InvalidKeystoreFormat(format!(
            "dklen must be at least {MIN_DKLEN}, got {}",
            params.dklen()
        )));
    }
    Ok(())
}

fn compute_mac(derived: &ZeroizingBytes, ciphertext: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(&derived[16..32]);
    hasher.update(ciphertext);
    hasher.finalize().into()
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ---------------------------------------------------------------------------
// JSON interchange
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct KeystoreJson {
    address: String,
    #[serde(alias = "Crypto")]
    crypto: CryptoJson,
    id: Uuid,
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct CryptoJson {
    cipher: String,
    cipherparams: CipherParamsJson,
    ciphertext: String,
    kdf: String,
    kdfparams: KdfParamsJson,
    mac: String,
}

#[derive(Serialize, Deserialize)]
struct CipherParamsJson {
    iv: String,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum KdfParamsJson {
    Scrypt {
        dklen: usize,
        n: u32,
        p: u32,
        r: u32,
        salt: String,
    },
    Pbkdf2 {
        c: u32,
        dklen: usize,
        prf: String,
        salt: String,
    },
}

impl EncryptedKeystore {
    /// Serializes to a version 3 keystore record.
    pub fn to_json(&self) -> Result<String, WalletError> {
        let salt = hex::encode(&self.salt);
        let kdfparams = match self.kdf {
            KdfParams::Scrypt { n, r, p, dklen } => KdfParamsJson::Scrypt {
                dklen,
                n,
                p,
                r,
                salt,
            },
            KdfParams::Pbkdf2 { c, dklen } => KdfParamsJson::Pbkdf2 {
                c,
                dklen,
                prf: PRF.to_string(),
                salt,
            },
        };

        let json = KeystoreJson {
            address: hex::encode(self.address),
            crypto: CryptoJson {
                cipher: CIPHER.to_string(),
                cipherparams: CipherParamsJson {
                    iv: hex::encode(self.iv),
                },
                ciphertext: hex::encode(&self.ciphertext),
                kdf: self.kdf.name().to_string(),
                kdfparams,
                mac: hex::encode(self.mac),
            },
            id: self.id,
            version: VERSION,
        };
        serde_json::to_string(&json).map_err(|e| WalletError::Internal(format!("serialize keystore: {e}")))
    }

    /// Parses a v3 keystore record. Structural problems are reported as
    /// [`WalletError::InvalidKeystoreFormat`].
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let parsed: KeystoreJson = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        if parsed.version != VERSION {
            return Err(invalid(format!("unsupported version {}", parsed.version)));
        }

        let crypto = parsed.crypto;
        if crypto.cipher != CIPHER {
            return Err(invalid(format!("unsupported cipher {}", crypto.cipher)));
        }

        let (kdf, salt) = match (crypto.kdf.as_str(), crypto.kdfparams) {
            ("scrypt", KdfParamsJson::Scrypt { dklen, n, p, r, salt }) => {
                (KdfParams::Scrypt { n, r, p, dklen }, salt)
            }
            ("pbkdf2", KdfParamsJson::Pbkdf2 { c, dklen, prf, salt }) => {
                if prf != PRF {
                    return Err(invalid(format!("unsupported prf {prf}")));
                }
                (KdfParams::Pbkdf2 { c, dklen }, salt)
            }
            (kdf, _) => return Err(invalid(format!("unsupported or inconsistent kdf {kdf}"))),
        };
        check_kdf(&kdf).map_err(|e| invalid(e.to_string()))?;

        let salt = decode_hex("salt", &salt)?;
        if salt.is_empty() {
            return Err(invalid("salt must not be empty".into()));
        }
        let ciphertext = decode_hex("ciphertext", &crypto.ciphertext)?;
        if ciphertext.len() != 32 {
            return Err(invalid(format!(
                "ciphertext must be 32 bytes, got {}",
                ciphertext.len()
            )));
        }

        Ok(Self {
            address: parse_record_address(&parsed.address)?,
            id: parsed.id,
            kdf,
            salt,
            iv: decode_fixed("iv", &crypto.cipherparams.iv)?,
            ciphertext,
            mac: decode_fixed("mac", &crypto.mac)?,
        })
    }
}

fn invalid(msg: String) -> WalletError {
    WalletError::InvalidKeystoreFormat(msg)
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, WalletError> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value).map_err(|e| invalid(format!("{field}: {e}")))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N], WalletError> {
    let bytes = decode_hex(field, value)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| invalid(format!("{field} must be {N} bytes, got {}", bytes.len())))
}

fn parse_record_address(value: &str) -> Result<Address, WalletError> {
    let bytes: [u8; 20] = decode_fixed("address", value)?;
    Ok(Address::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "p@55w0rd!";

    fn fast() -> KdfParams {
        KdfParams::Scrypt {
            n: 1024,
            r: 8,
            p: 1,
            dklen: 32,
        }
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = KeyPair::generate();
        let keystore = encrypt(&key, PASSWORD, &fast()).unwrap();
        let recovered = decrypt(&keystore, PASSWORD).unwrap();

        assert_eq!(&*recovered.private_key(), &*key.private_key());
        assert_eq!(recovered.address(), key.address());
    }

    #[test]
    fn fresh_salt_and_iv_every_call() {
        let key = KeyPair::generate();
        let a = encrypt(&key, PASSWORD, &fast()).unwrap();
        let b = encrypt(&key, PASSWORD, &fast()).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.mac, b.mac);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let key = KeyPair::generate();
        let keystore = encrypt(&key, PASSWORD, &fast()).unwrap();
        assert!(matches!(
            decrypt(&keystore, "p@55w0rd?"),
            Err(WalletError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = KeyPair::generate();
        let mut keystore = encrypt(&key, PASSWORD, &fast()).unwrap();
        keystore.ciphertext[0] ^= 0x01;
        assert!(matches!(
            decrypt(&keystore, PASSWORD),
            Err(WalletError::AuthenticationFailed)
        ));
    }

    #[test]
    fn swapped_address_fails_authentication() {
        let key = KeyPair::generate();
        let mut keystore = encrypt(&key, PASSWORD, &fast()).unwrap();
        keystore.address = Address::repeat_byte(0x01);
        assert!(matches!(
            decrypt(&keystore, PASSWORD),
            Err(WalletError::AuthenticationFailed)
        ));
    }

    #[test]
    fn json_round_trip() {
        let key = KeyPair::generate();
        let keystore = encrypt(&key, PASSWORD, &fast()).unwrap();
        let json = keystore.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["crypto"]["cipher"], "aes-128-ctr");
        assert_eq!(value["crypto"]["kdf"], "scrypt");
        assert_eq!(value["crypto"]["kdfparams"]["n"], 1024);
        assert_eq!(value["address"].as_str().unwrap().len(), 40);

        let parsed = EncryptedKeystore::from_json(&json).unwrap();
        assert_eq!(parsed, keystore);
        let recovered = decrypt(&parsed, PASSWORD).unwrap();
        assert_eq!(recovered.address(), key.address());
    }

    #[test]
    fn pbkdf2_keystore_round_trip() {
        let key = KeyPair::generate();
        let params = KdfParams::Pbkdf2 { c: 1024, dklen: 32 };
        let keystore = encrypt(&key, PASSWORD, &params).unwrap();

        let json = keystore.to_json().unwrap();
        assert!(json.contains("\"prf\":\"hmac-sha256\""));
        let parsed = EncryptedKeystore::from_json(&json).unwrap();
        assert_eq!(decrypt(&parsed, PASSWORD).unwrap().address(), key.address());
    }

    #[test]
    fn web3_secret_storage_pbkdf2_vector() {
        let expected_key =
            hex::decode("7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d").unwrap();
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&expected_key);
        let address = KeyPair::from_private_key(&secret).unwrap().address();

        // The MAC does not cover the address, so the record carries the
        // address actually controlled by the vector's key.
        let json = format!(
            r#"{{
                "address": "{}",
                "crypto": {{
                    "cipher": "aes-128-ctr",
                    "cipherparams": {{ "iv": "6087dab2f9fdbbfaddc31a909735c1e6" }},
                    "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
                    "kdf": "pbkdf2",
                    "kdfparams": {{
                        "c": 262144,
                        "dklen": 32,
                        "prf": "hmac-sha256",
                        "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
                    }},
                    "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9a51d91e08a"
                }},
                "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
                "version": 3
            }}"#,
            hex::encode(address)
        );

        let keystore = EncryptedKeystore::from_json(&json).unwrap();
        let key = decrypt(&keystore, "testpassword").unwrap();
        assert_eq!(&*key.private_key(), expected_key.as_slice());

        assert!(matches!(
            decrypt(&keystore, "testpassword1"),
            Err(WalletError::AuthenticationFailed)
        ));
    }

    #[test]
    fn capitalized_crypto_key_accepted() {
        let key = KeyPair::generate();
        let keystore = encrypt(&key, PASSWORD, &fast()).unwrap();
        let json = keystore.to_json().unwrap().replace("\"crypto\"", "\"Crypto\"");
        assert_eq!(EncryptedKeystore::from_json(&json).unwrap(), keystore);
    }

    #[test]
    fn malformed_records_are_format_errors() {
        let key = KeyPair::generate();
        let json = encrypt(&key, PASSWORD, &fast()).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let mutate = |f: &dyn Fn(&mut serde_json::Value)| {
            let mut v = value.clone();
            f(&mut v);
            EncryptedKeystore::from_json(&v.to_string())
        };

        let cases: Vec<Box<dyn Fn(&mut serde_json::Value)>> = vec![
            Box::new(|v: &mut serde_json::Value| v["version"] = 2.into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["cipher"] = "aes-128-cbc".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdf"] = "argon2".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdf"] = "pbkdf2".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["mac"] = "zz".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["mac"] = "abcd".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["cipherparams"]["iv"] = "00".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["ciphertext"] = "0011".into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdfparams"]["n"] = 1000.into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdfparams"]["dklen"] = 16.into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdfparams"]["n"] = 1_073_741_824u64.into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdfparams"]["p"] = 4_000_000u64.into()),
            Box::new(|v: &mut serde_json::Value| v["crypto"]["kdfparams"]["dklen"] = 1_000_000u64.into()),
            Box::new(|v: &mut serde_json::Value| v["address"] = "not-an-address".into()),
            Box::new(|v: &mut serde_json::Value| v["id"] = "not-a-uuid".into()),
        ];
        for (i, case) in cases.iter().enumerate() {
            assert!(
                matches!(mutate(case.as_ref()), Err(WalletError::InvalidKeystoreFormat(_))),
                "case {i} should be rejected"
            );
        }

        assert!(matches!(
            EncryptedKeystore::from_json("not json"),
            Err(WalletError::InvalidKeystoreFormat(_))
        ));
    }
}
