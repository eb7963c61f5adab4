use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header, RlpDecodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::address::{address_from_verifying_key, to_checksum};
use crate::erc20;
use crate::error::EthError;

/// Gas used by a plain value transfer to an externally owned account.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// An unsigned legacy (type 0) transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    /// Declared sender. The signing key must control this address.
    pub from: Address,
    /// Recipient, or `None` for contract creation.
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: U256,
    /// Value in wei.
    pub value: U256,
    pub data: Bytes,
    /// EIP-155 chain id. `None` signs a pre-EIP-155 transaction.
    pub chain_id: Option<u64>,
}

/// A signed, serialized transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
    /// Transaction hash, `keccak256(raw)`.
    pub hash: B256,
}

/// Assembles an unsigned transaction. Nothing here touches the network.
pub fn build_unsigned(
    from: Address,
    to: Option<Address>,
    nonce: u64,
    gas_limit: u64,
    gas_price: U256,
    value: U256,
    data: impl Into<Bytes>,
) -> TransactionInput {
    TransactionInput {
        from,
        to,
        nonce,
        gas_limit,
        gas_price,
        value,
        data: data.into(),
        chain_id: None,
    }
}

/// Builds a native coin transfer using [`TRANSFER_GAS_LIMIT`].
pub fn build_transfer(from: Address, to: Address, value: U256, nonce: u64, gas_price: U256) -> TransactionInput {
    build_unsigned(
        from,
        Some(to),
        nonce,
        TRANSFER_GAS_LIMIT,
        gas_price,
        value,
        Bytes::new(),
    )
}

/// Builds an ERC-20 `transfer(address,uint256)` call to `token`.
pub fn build_erc20_transfer(
    from: Address,
    token: Address,
    to: Address,
    amount: U256,
    nonce: u64,
    gas_limit: u64,
    gas_price: U256,
) -> Result<TransactionInput, EthError> {
    let data = erc20::encode_transfer(to, amount)?;
    Ok(build_unsigned(
        from,
        Some(token),
        nonce,
        gas_limit,
        gas_price,
        U256::ZERO,
        data,
    ))
}

impl TransactionInput {
    /// Enables EIP-155 replay protection for `chain_id`.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// RLP pre-image that is hashed for signing.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self.chain_id {
            Some(chain_id) => Eip155Preimage {
                nonce: self.nonce,
                gas_price: self.gas_price,
                gas_limit: self.gas_limit,
                to: RlpTo(self.to),
                value: self.value,
                data: self.data.clone(),
                chain_id,
                empty_r: 0,
                empty_s: 0,
            }
            .encode(&mut out),
            None => LegacyPreimage {
                nonce: self.nonce,
                gas_price: self.gas_price,
                gas_limit: self.gas_limit,
                to: RlpTo(self.to),
                value: self.value,
                data: self.data.clone(),
            }
            .encode(&mut out),
        }
        out
    }

    /// Keccak-256 of the signing payload.
    pub fn signing_hash(&self) -> B256 {
        B256::from_slice(&Keccak256::digest(self.signing_payload()))
    }

    fn recovery_id(&self, v: u64) -> Option<RecoveryId> {
        let y = match self.chain_id {
            Some(chain_id) => v.checked_sub(chain_id.checked_mul(2)?.checked_add(35)?)?,
            None => v.checked_sub(27)?,
        };
        RecoveryId::from_byte(u8::try_from(y).ok()?)
    }
}

/// Signs `tx` with a deterministic (RFC 6979) low-s ECDSA signature.
///
/// Fails with [`EthError::SignerMismatch`] if the key does not control
/// `tx.from`.
pub fn sign(tx: &TransactionInput, private_key: &[u8; 32]) -> Result<SignedTransaction, EthError> {
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    let signing_key = signing_key?;

    let signer = address_from_verifying_key(signing_key.verifying_key());
    if signer != tx.from {
        return Err(EthError::SignerMismatch {
            expected: to_checksum(&tx.from),
            actual: to_checksum(&signer),
        });
    }

    let hash = tx.signing_hash();
    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(hash.as_slice())
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let y = recovery_id.is_y_odd() as u64;
    let v = match tx.chain_id {
        Some(chain_id) => chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + y))
            .ok_or_else(|| EthError::EncodingError(format!("chain id {chain_id} does not fit in v")))?,
        None => 27 + y,
    };
    let r = U256::from_be_slice(&signature.r().to_bytes());
    let s = U256::from_be_slice(&signature.s().to_bytes());

    let signed = SignedFields {
        nonce: tx.nonce,
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit,
        to: RlpTo(tx.to),
        value: tx.value,
        data: tx.data.clone(),
        v,
        r,
        s,
    };
    let mut raw = Vec::with_capacity(signed.length());
    signed.encode(&mut raw);
    let tx_hash = B256::from_slice(&Keccak256::digest(&raw));

    tracing::debug!(
        from = %to_checksum(&tx.from),
        nonce = tx.nonce,
        chain_id = ?tx.chain_id,
        hash = %tx_hash,
        "signed transaction"
    );

    Ok(SignedTransaction {
        raw: raw.into(),
        v,
        r,
        s,
        hash: tx_hash,
    })
}

impl SignedTransaction {
    /// 0x-prefixed hex of the raw bytes, as `eth_sendRawTransaction` expects.
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    /// Recovers the sender address from the signature.
    pub fn recover_signer(&self) -> Result<Address, EthError> {
        let (tx, _) = decode_signed(&self.raw)?;
        Ok(tx.from)
    }
}

/// Parses a raw legacy transaction and recovers its sender into `from`.
pub fn decode_signed(raw: &[u8]) -> Result<(TransactionInput, SignedTransaction), EthError> {
    let mut buf = raw;
    let fields = SignedFields::decode(&mut buf)
        .map_err(|e| EthError::EncodingError(format!("invalid transaction rlp: {e}")))?;
    if !buf.is_empty() {
        return Err(EthError::EncodingError("trailing bytes after transaction".into()));
    }

    let chain_id = match fields.v {
        27 | 28 => None,
        v if v >= 35 => Some((v - 35) / 2),
        v => return Err(EthError::EncodingError(format!("invalid signature v {v}"))),
    };

    let mut tx = TransactionInput {
        from: Address::ZERO,
        to: fields.to.0,
        nonce: fields.nonce,
        gas_limit: fields.gas_limit,
        gas_price: fields.gas_price,
        value: fields.value,
        data: fields.data,
        chain_id,
    };

    let recovery_id = tx
        .recovery_id(fields.v)
        .ok_or_else(|| EthError::EncodingError(format!("invalid signature v {}", fields.v)))?;
    let signature = Signature::from_scalars(
        fields.r.to_be_bytes::<32>(),
        fields.s.to_be_bytes::<32>(),
    )
    .map_err(|e| EthError::EncodingError(format!("invalid signature: {e}")))?;
    let key = VerifyingKey::recover_from_prehash(tx.signing_hash().as_slice(), &signature, recovery_id)
        .map_err(|e| EthError::EncodingError(format!("signature recovery failed: {e}")))?;
    tx.from = address_from_verifying_key(&key);

    let signed = SignedTransaction {
        raw: Bytes::copy_from_slice(raw),
        v: fields.v,
        r: fields.r,
        s: fields.s,
        hash: B256::from_slice(&Keccak256::digest(raw)),
    };
    Ok((tx, signed))
}

#[derive(RlpEncodable)]
struct LegacyPreimage {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: RlpTo,
    value: U256,
    data: Bytes,
}

#[derive(RlpEncodable)]
struct Eip155Preimage {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: RlpTo,
    value: U256,
    data: Bytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

#[derive(RlpEncodable, RlpDecodable)]
struct SignedFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: RlpTo,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

/// Recipient field: a 20-byte string, or the empty string for contract creation.
#[derive(Debug, Clone, Copy)]
struct RlpTo(Option<Address>);

impl Encodable for RlpTo {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        match &self.0 {
            Some(address) => address.encode(out),
            None => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
        }
    }

    fn length(&self) -> usize {
        match &self.0 {
            Some(address) => address.length(),
            None => 1,
        }
    }
}

impl Decodable for RlpTo {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let bytes = Header::decode_bytes(buf, false)?;
        match bytes.len() {
            0 => Ok(RlpTo(None)),
            20 => Ok(RlpTo(Some(Address::from_slice(bytes)))),
            _ => Err(alloy_rlp::Error::Custom("recipient must be 0 or 20 bytes")),
        }
    }
}
