use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::CryptoError;
use crate::random::random_bytes_fixed;
use crate::zeroizing::ZeroizingBytes;

/// Salt length used for freshly created keystores.
pub const SALT_LEN: usize = 32;

/// Upper bound on the scrypt working set (`128 * r * n` bytes).
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Upper bound on total scrypt mixing (`128 * r * n * p` bytes).
pub const MAX_SCRYPT_WORK: u64 = 1 << 32;

/// Upper bound on PBKDF2 iterations.
pub const MAX_PBKDF2_ROUNDS: u32 = 10_000_000;

/// Upper bound on the derived key length.
pub const MAX_DKLEN: usize = 64;

/// Password-based key derivation function and its work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kdf", rename_all = "lowercase")]
pub enum KdfParams {
    /// scrypt with cost `n` (power of two), block size `r` and
    /// parallelism `p`.
    Scrypt { n: u32, r: u32, p: u32, dklen: usize },
    /// PBKDF2-HMAC-SHA256 with `c` iterations.
    Pbkdf2 { c: u32, dklen: usize },
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::Scrypt {
            n: 262_144,
            r: 8,
            p: 1,
            dklen: 32,
        }
    }
}

impl KdfParams {
    /// Reduced scrypt work factor for constrained devices.
    pub fn light() -> Self {
        Self::Scrypt {
            n: 4096,
            r: 8,
            p: 6,
            dklen: 32,
        }
    }

    /// PBKDF2-HMAC-SHA256 with the conventional iteration count.
    pub fn pbkdf2() -> Self {
        Self::Pbkdf2 {
            c: 262_144,
            dklen: 32,
        }
    }

    /// Length of the derived key in bytes.
    pub fn dklen(&self) -> usize {
        match self {
            Self::Scrypt { dklen, .. } | Self::Pbkdf2 { dklen, .. } => *dklen,
        }
    }

    /// Short identifier as written into keystore records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scrypt { .. } => "scrypt",
            Self::Pbkdf2 { .. } => "pbkdf2",
        }
    }

    /// Checks the parameters without running the derivation.
    pub fn validate(&self) -> Result<(), CryptoError> {
        match *self {
            Self::Scrypt { n, r, p, dklen } => {
                if n < 2 || !n.is_power_of_two() {
                    return Err(CryptoError::InvalidKdfParams(format!(
                        "scrypt n must be a power of two greater than 1, got {n}"
                    )));
                }
                if r == 0 || p == 0 {
                    return Err(CryptoError::InvalidKdfParams(
                        "scrypt r and p must be non-zero".into(),
                    ));
                }
                if n.trailing_zeros() >= r.saturating_mul(16) {
                    return Err(CryptoError::InvalidKdfParams(format!(
                        "scrypt n must be below 2^(16 * r), got n = {n}, r = {r}"
                    )));
                }
                let memory = 128 * u64::from(r) * u64::from(n);
                if memory > MAX_SCRYPT_MEMORY {
                    return Err(CryptoError::InvalidKdfParams(format!(
                        "scrypt needs {memory} bytes of memory, limit is {MAX_SCRYPT_MEMORY}"
                    )));
                }
                if memory.saturating_mul(u64::from(p)) > MAX_SCRYPT_WORK {
                    return Err(CryptoError::InvalidKdfParams(format!(
                        "scrypt parallelism p = {p} exceeds the work limit"
                    )));
                }
                check_dklen(dklen)
            }
            Self::Pbkdf2 { c, dklen } => {
                if c == 0 || c > MAX_PBKDF2_ROUNDS {
                    return Err(CryptoError::InvalidKdfParams(format!(
                        "pbkdf2 iteration count must be in 1..={MAX_PBKDF2_ROUNDS}, got {c}"
                    )));
                }
                check_dklen(dklen)
            }
        }
    }
}

fn check_dklen(dklen: usize) -> Result<(), CryptoError> {
    if dklen == 0 || dklen > MAX_DKLEN {
        return Err(CryptoError::InvalidKdfParams(format!(
            "dklen must be in 1..={MAX_DKLEN}, got {dklen}"
        )));
    }
    Ok(())
}

/// Derives `params.dklen()` bytes from `password` and `salt`.
///
/// The output is wrapped in [`ZeroizingBytes`] so it is wiped as soon as the
/// caller drops it.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<ZeroizingBytes, CryptoError> {
    params.validate()?;

    let mut output = ZeroizingBytes::zeroed(params.dklen());
    match *params {
        KdfParams::Scrypt { n, r, p, dklen } => {
            let log_n = n.trailing_zeros() as u8;
            let scrypt_params = scrypt::Params::new(log_n, r, p, dklen)
                .map_err(|e| CryptoError::InvalidKdfParams(format!("scrypt: {e}")))?;
            scrypt::scrypt(password, salt, &scrypt_params, output.as_mut_slice())
                .map_err(|e| CryptoError::KdfFailed(format!("scrypt: {e}")))?;
        }
        KdfParams::Pbkdf2 { c, .. } => {
            pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, c, output.as_mut_slice());
        }
    }

    Ok(output)
}

/// Generates a cryptographically secure random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    random_bytes_fixed::<SALT_LEN>()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_SCRYPT: KdfParams = KdfParams::Scrypt {
        n: 16,
        r: 1,
        p: 1,
        dklen: 64,
    };

    #[test]
    fn scrypt_rfc7914_vector() {
        // RFC 7914 section 12, second test vector.
        let params = KdfParams::Scrypt {
            n: 1024,
            r: 8,
            p: 16,
            dklen: 64,
        };
        let key = derive_key(b"password", b"NaCl", &params).unwrap();
        assert_eq!(
            hex::encode(&*key),
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
        );
    }

    #[test]
    fn pbkdf2_sha256_vector() {
        // RFC 7914 section 11, PBKDF2-HMAC-SHA256 with c = 1.
        let params = KdfParams::Pbkdf2 { c: 1, dklen: 64 };
        let key = derive_key(b"passwd", b"salt", &params).unwrap();
        assert_eq!(
            hex::encode(&*key),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc\
             49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
    }

    #[test]
    fn derive_key_deterministic() {
        let salt = [0xABu8; 32];
        let key1 = derive_key(b"my-strong-password", &salt, &FAST_SCRYPT).unwrap();
        let key2 = derive_key(b"my-strong-password", &salt, &FAST_SCRYPT).unwrap();
        assert_eq!(&*key1, &*key2, "same password + salt must produce same key");
    }

    #[test]
    fn derive_key_different_passwords_differ() {
        let salt = [0x01u8; 32];
        let key1 = derive_key(b"password-a", &salt, &FAST_SCRYPT).unwrap();
        let key2 = derive_key(b"password-b", &salt, &FAST_SCRYPT).unwrap();
        assert_ne!(&*key1, &*key2);
    }

    #[test]
    fn derive_key_different_salts_differ() {
        let key1 = derive_key(b"same-password", &[0x01u8; 32], &FAST_SCRYPT).unwrap();
        let key2 = derive_key(b"same-password", &[0x02u8; 32], &FAST_SCRYPT).unwrap();
        assert_ne!(&*key1, &*key2);
    }

    #[test]
    fn derive_key_respects_dklen() {
        let params = KdfParams::Pbkdf2 { c: 2, dklen: 32 };
        let key = derive_key(b"", &[0xCCu8; 32], &params).unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn scrypt_n_not_power_of_two_rejected() {
        let params = KdfParams::Scrypt {
            n: 1000,
            r: 8,
            p: 1,
            dklen: 32,
        };
        let err = derive_key(b"pw", b"salt", &params).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKdfParams(_)));
    }

    #[test]
    fn scrypt_cost_too_large_for_block_size_rejected() {
        let params = KdfParams::Scrypt {
            n: 1 << 16,
            r: 1,
            p: 1,
            dklen: 32,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn pbkdf2_zero_iterations_rejected() {
        let params = KdfParams::Pbkdf2 { c: 0, dklen: 32 };
        assert!(params.validate().is_err());
    }

    #[test]
    fn oversized_work_factors_rejected() {
        // 128 * 8 * 2^30 bytes would be a 1 TiB allocation.
        let huge_n = KdfParams::Scrypt {
            n: 1 << 30,
            r: 8,
            p: 1,
            dklen: 32,
        };
        let err = derive_key(b"pw", b"salt", &huge_n).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKdfParams(_)));

        let huge_p = KdfParams::Scrypt {
            n: 1 << 18,
            r: 8,
            p: 1 << 20,
            dklen: 32,
        };
        assert!(huge_p.validate().is_err());

        assert!(KdfParams::Pbkdf2 { c: u32::MAX, dklen: 32 }.validate().is_err());
        assert!(KdfParams::Pbkdf2 { c: 1, dklen: 1 << 40 }.validate().is_err());

        // Largest scrypt cost accepted for r = 8.
        let ceiling = KdfParams::Scrypt {
            n: 1 << 20,
            r: 8,
            p: 1,
            dklen: 32,
        };
        assert!(ceiling.validate().is_ok());
    }

    #[test]
    fn default_params_are_valid() {
        assert!(KdfParams::default().validate().is_ok());
        assert!(KdfParams::light().validate().is_ok());
        assert!(KdfParams::pbkdf2().validate().is_ok());
        assert_eq!(KdfParams::default().name(), "scrypt");
        assert_eq!(KdfParams::pbkdf2().name(), "pbkdf2");
    }

    #[test]
    fn params_serde_tagged_by_kdf() {
        let json = serde_json::to_value(KdfParams::light()).unwrap();
        assert_eq!(json["kdf"], "scrypt");
        assert_eq!(json["n"], 4096);

        let parsed: KdfParams =
            serde_json::from_str(r#"{"kdf":"pbkdf2","c":10,"dklen":32}"#).unwrap();
        assert_eq!(parsed, KdfParams::Pbkdf2 { c: 10, dklen: 32 });
    }

    #[test]
    fn generate_salt_is_random() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();
        assert_eq!(salt1.len(), SALT_LEN);
        assert_ne!(salt1, salt2, "two random salts should differ");
    }
}
