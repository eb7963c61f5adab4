use rand::RngCore;
use rand_core::OsRng;

/// Fills `buf` from the operating system CSPRNG.
pub fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

/// Generates a fixed-size array of cryptographically secure random bytes.
///
/// Used for salts, IVs and private key candidates.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill_random(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_random_overwrites_buffer() {
        let mut buf = [0u8; 64];
        fill_random(&mut buf);
        // 64 zero bytes from a CSPRNG has probability 2^-512.
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn random_bytes_fixed_differ_between_calls() {
        let a: [u8; 32] = random_bytes_fixed();
        let b: [u8; 32] = random_bytes_fixed();
        assert_ne!(a, b);
    }

    #[test]
    fn random_bytes_fixed_zero_length() {
        let buf: [u8; 0] = random_bytes_fixed();
        assert!(buf.is_empty());
    }
}
