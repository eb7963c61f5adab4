use alloy_primitives::Address;
use chain_eth::address::to_checksum;
use chain_eth::transaction::{self, SignedTransaction, TransactionInput};
use crypto_utils::KdfParams;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::keys::KeyPair;
use crate::keystore::{self, EncryptedKeystore};

/// A named, password-protected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub address: Address,
    pub keystore: EncryptedKeystore,
}

/// Serialized account as kept by the wallet list.
#[derive(Serialize, Deserialize)]
struct AccountRecord {
    name: String,
    keystore: serde_json::Value,
}

impl Account {
    /// Serializes the name and the v3 keystore record.
    pub fn to_json(&self) -> Result<String, WalletError> {
        let keystore: serde_json::Value = serde_json::from_str(&self.keystore.to_json()?)
            .map_err(|e| WalletError::Internal(format!("serialize account: {e}")))?;
        let record = AccountRecord {
            name: self.name.clone(),
            keystore,
        };
        serde_json::to_string(&record).map_err(|e| WalletError::Internal(format!("serialize account: {e}")))
    }

    /// Restores an account written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let record: AccountRecord = serde_json::from_str(json)
            .map_err(|e| WalletError::InvalidKeystoreFormat(e.to_string()))?;
        let keystore = EncryptedKeystore::from_json(&record.keystore.to_string())?;
        Ok(Self {
            name: record.name,
            address: keystore.address,
            keystore,
        })
    }
}

/// Creates, imports and unlocks accounts with a fixed KDF work factor.
///
/// Construct one and pass it by reference to whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct KeyManager {
    kdf: KdfParams,
}

impl KeyManager {
    /// Creates a manager sealing keys with `kdf`, which must be valid.
    pub fn new(kdf: KdfParams) -> Result<Self, WalletError> {
        kdf.validate()?;
        Ok(Self { kdf })
    }

    /// KDF parameters used for newly sealed keystores.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Generates a fresh key and encrypts it under `password`.
    pub fn create_account(&self, name: &str, password: &str) -> Result<Account, WalletError> {
        let key = KeyPair::generate();
        let account = self.seal(name, &key, password)?;
        tracing::info!(account = name, address = %to_checksum(&account.address), "created account");
        Ok(account)
    }

    /// Imports a hex private key and encrypts it under `password`.
    pub fn import_account(&self, name: &str, private_key_hex: &str, password: &str) -> Result<Account, WalletError> {
        let key = KeyPair::from_hex(private_key_hex)?;
        let account = self.seal(name, &key, password)?;
        tracing::info!(account = name, address = %to_checksum(&account.address), "imported account");
        Ok(account)
    }

    fn seal(&self, name: &str, key: &KeyPair, password: &str) -> Result<Account, WalletError> {
        let keystore = keystore::encrypt(key, password, &self.kdf)?;
        Ok(Account {
            name: name.to_string(),
            address: key.address(),
            keystore,
        })
    }

    /// Decrypts a keystore. The caller owns the returned key and should
    /// drop it as soon as it is no longer needed.
    pub fn unlock(&self, keystore: &EncryptedKeystore, password: &str) -> Result<KeyPair, WalletError> {
        keystore::decrypt(keystore, password)
    }

    /// Decrypts the key, signs `tx` and drops the key before returning.
    pub fn sign_transaction(&self, keystore: &EncryptedKeystore, password: &str, tx: &TransactionInput) -> Result<SignedTransaction, WalletError> {
        let key = self.unlock(keystore, password)?;
        let signed = transaction::sign(tx, key.secret())?;
        drop(key);
        Ok(signed)
    }

    /// Re-encrypts the key of `account` under a new password.
    pub fn change_password(&self, account: &Account, old_password: &str, new_password: &str) -> Result<Account, WalletError> {
        let key = self.unlock(&account.keystore, old_password)?;
        self.seal(&account.name, &key, new_password)
    }
}
