//! Exact conversion between human-readable decimal strings and integer base
//! units (wei for the native coin, the token's smallest unit for ERC-20s).

use std::fmt;

use alloy_primitives::U256;

use crate::error::EthError;

/// Decimal places of the native coin. Tokens declare their own.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest decimal count whose scale factor `10^decimals` fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

/// A quantity of base units together with its decimal-place count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Amount {
    pub value: U256,
    pub decimals: u8,
}

impl Amount {
    /// Wraps a base-unit integer.
    pub fn new(value: U256, decimals: u8) -> Self {
        Self { value, decimals }
    }

    /// Parses a human-readable decimal string, see [`to_base_units`].
    pub fn parse(human: &str, decimals: u8) -> Result<Self, EthError> {
        to_base_units(human, decimals)
    }

    /// Renders the canonical decimal string, see [`from_base_units`].
    pub fn to_decimal_string(&self) -> String {
        from_base_units(self.value, self.decimals)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

/// Scales a decimal string such as `"1.25"` by `10^decimals`.
///
/// Accepts an integer part of one or more digits, optionally followed by
/// `.` and one or more fractional digits. Signs, exponents, whitespace and
/// separators are rejected, as are fractions with more significant digits
/// than `decimals` and results above `2^256 - 1`.
pub fn to_base_units(human: &str, decimals: u8) -> Result<Amount, EthError> {
    if decimals > MAX_DECIMALS {
        return Err(EthError::InvalidAmount(format!(
            "decimals must be at most {MAX_DECIMALS}, got {decimals}"
        )));
    }
    if human.starts_with('-') {
        return Err(EthError::InvalidAmount(format!(
            "negative amounts are not allowed: {human}"
        )));
    }

    let (int_part, frac_part) = match human.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (human, None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EthError::InvalidAmount(format!("malformed amount: {human:?}")));
    }

    let fraction = match frac_part {
        Some(frac) if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(EthError::InvalidAmount(format!("malformed amount: {human:?}")));
        }
        Some(frac) => frac.trim_end_matches('0'),
        None => "",
    };

    if fraction.len() > decimals as usize {
        return Err(EthError::InvalidAmount(format!(
            "{human} has more than {decimals} decimal places"
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals as usize - fraction.len()));

    let significant = digits.trim_start_matches('0');
    let value = if significant.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(significant, 10)
            .map_err(|_| EthError::InvalidAmount(format!("{human} exceeds 256 bits")))?
    };

    Ok(Amount { value, decimals })
}

/// Renders `value` base units as a decimal string with `decimals` places.
///
/// The output is canonical: no trailing fractional zeros and no dangling
/// decimal point, so `to_base_units` followed by `from_base_units` returns
/// any canonical input unchanged.
pub fn from_base_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Parses an amount of ether into wei.
pub fn parse_ether(human: &str) -> Result<U256, EthError> {
    to_base_units(human, DEFAULT_DECIMALS).map(|amount| amount.value)
}

/// Formats a wei amount as ether.
pub fn format_ether(wei: U256) -> String {
    from_base_units(wei, DEFAULT_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn one_ether_is_1e18_wei() {
        assert_eq!(parse_ether("1").unwrap(), wei("1000000000000000000"));
        assert_eq!(format_ether(wei("1000000000000000000")), "1");
    }

    #[test]
    fn fractional_amounts_scale_exactly() {
        let amount = to_base_units("1.5", 6).unwrap();
        assert_eq!(amount.value, U256::from(1_500_000u64));
        assert_eq!(amount.decimals, 6);
        assert_eq!(from_base_units(amount.value, 6), "1.5");
    }

    #[test]
    fn smallest_unit_formats_with_leading_zeros() {
        assert_eq!(from_base_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(from_base_units(U256::from(120u64), 3), "0.12");
    }

    #[test]
    fn zero_formats_as_zero() {
        assert_eq!(from_base_units(U256::ZERO, 18), "0");
        assert_eq!(from_base_units(U256::ZERO, 0), "0");
        assert_eq!(to_base_units("0.0", 18).unwrap().value, U256::ZERO);
    }

    #[test]
    fn zero_decimals_are_plain_integers() {
        assert_eq!(to_base_units("42", 0).unwrap().value, U256::from(42u64));
        assert!(to_base_units("42.1", 0).is_err());
        assert_eq!(to_base_units("42.000", 0).unwrap().value, U256::from(42u64));
    }

    #[test]
    fn trailing_and_leading_zeros_accepted() {
        assert_eq!(to_base_units("001.2500", 4).unwrap().value, U256::from(12_500u64));
    }

    #[test]
    fn canonical_inputs_round_trip() {
        let cases = [
            ("0", 0u8),
            ("0", 18),
            ("1", 18),
            ("0.000000000000000001", 18),
            ("123456789.987654321", 9),
            ("1000000", 6),
            ("3.14159", 77),
            ("115792089237316195423570985008687907853269984665640564039457584007913129639935", 0),
            ("1.15792089237316195423570985008687907853269984665640564039457584007913129639935", 77),
        ];
        for (human, decimals) in cases {
            let amount = to_base_units(human, decimals).unwrap();
            assert_eq!(from_base_units(amount.value, decimals), human, "decimals {decimals}");
        }
    }

    #[test]
    fn too_many_decimal_places_rejected() {
        let err = to_base_units("1.0000001", 6).unwrap_err();
        assert!(matches!(err, EthError::InvalidAmount(_)));
    }

    #[test]
    fn negative_rejected() {
        assert!(matches!(to_base_units("-1", 18), Err(EthError::InvalidAmount(_))));
    }

    #[test]
    fn malformed_inputs_rejected() {
        for bad in ["", ".", "1.", ".5", "1.2.3", "abc", "1e18", " 1", "1,000", "+1", "0x10"] {
            assert!(
                matches!(to_base_units(bad, 18), Err(EthError::InvalidAmount(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn overflow_rejected() {
        let too_big =
            "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(to_base_units(too_big, 0).is_err());
        assert!(to_base_units("2", 77).is_err());
    }

    #[test]
    fn decimals_above_77_rejected() {
        assert!(to_base_units("0", 78).is_err());
    }

    #[test]
    fn amount_display_is_canonical() {
        let amount = Amount::parse("2.50", 2).unwrap();
        assert_eq!(amount.value, U256::from(250u64));
        assert_eq!(amount.to_string(), "2.5");
    }
}
