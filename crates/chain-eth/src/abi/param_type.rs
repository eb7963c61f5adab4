use std::fmt;
use std::str::FromStr;

use crate::error::EthError;

/// A Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Address,
    Bool,
    /// `uint<M>`, M in bits.
    Uint(usize),
    /// `int<M>`, M in bits.
    Int(usize),
    /// `bytes<M>`, M in bytes.
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[k]`
    FixedArray(Box<ParamType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Whether values of this type live in the tail of an encoding.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of an enclosing encoding.
    ///
    /// Saturates at `usize::MAX`, which no payload can satisfy.
    pub fn head_size(&self) -> usize {
        self.checked_head_size().unwrap_or(usize::MAX)
    }

    fn checked_head_size(&self) -> Option<usize> {
        if self.is_dynamic() {
            return Some(32);
        }
        match self {
            ParamType::FixedArray(inner, len) => inner.checked_head_size()?.checked_mul(*len),
            ParamType::Tuple(members) => members
                .iter()
                .try_fold(0usize, |acc, m| acc.checked_add(m.checked_head_size()?)),
            _ => Some(32),
        }
    }

    /// Parses a canonical (or `uint`/`int` shorthand) type string.
    pub fn parse(s: &str) -> Result<Self, EthError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EthError::InvalidAbi("empty type".into()));
        }

        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| EthError::InvalidAbi(format!("unbalanced brackets in {s}")))?;
            let inner = ParamType::parse(&stripped[..open])?;
            let size = &stripped[open + 1..];
            if size.is_empty() {
                return Ok(ParamType::Array(Box::new(inner)));
            }
            let len = size
                .parse::<usize>()
                .ok()
                .filter(|&len| len > 0)
                .ok_or_else(|| EthError::InvalidAbi(format!("bad array length in {s}")))?;
            let ty = ParamType::FixedArray(Box::new(inner), len);
            if ty.checked_head_size().is_none() {
                return Err(EthError::InvalidAbi(format!("{s} is too large to encode")));
            }
            return Ok(ty);
        }

        if let Some(body) = s.strip_prefix('(') {
            let body = body
                .strip_suffix(')')
                .ok_or_else(|| EthError::InvalidAbi(format!("unbalanced parentheses in {s}")))?;
            let members = split_top_level(body)?
                .into_iter()
                .map(ParamType::parse)
                .collect::<Result<Vec<_>, _>>()?;
            if members.is_empty() {
                return Err(EthError::InvalidAbi("empty tuple".into()));
            }
            let ty = ParamType::Tuple(members);
            if ty.checked_head_size().is_none() {
                return Err(EthError::InvalidAbi(format!("{s} is too large to encode")));
            }
            return Ok(ty);
        }

        match s {
            "address" => return Ok(ParamType::Address),
            "bool" => return Ok(ParamType::Bool),
            "string" => return Ok(ParamType::String),
            "bytes" => return Ok(ParamType::Bytes),
            "uint" => return Ok(ParamType::Uint(256)),
            "int" => return Ok(ParamType::Int(256)),
            _ => {}
        }

        if let Some(bits) = s.strip_prefix("uint") {
            return Ok(ParamType::Uint(parse_int_width(s, bits)?));
        }
        if let Some(bits) = s.strip_prefix("int") {
            return Ok(ParamType::Int(parse_int_width(s, bits)?));
        }
        if let Some(len) = s.strip_prefix("bytes") {
            let len = len
                .parse::<usize>()
                .map_err(|_| EthError::InvalidAbi(format!("unknown type {s}")))?;
            if !(1..=32).contains(&len) {
                return Err(EthError::InvalidAbi(format!("bytes length out of range in {s}")));
            }
            return Ok(ParamType::FixedBytes(len));
        }

        Err(EthError::InvalidAbi(format!("unknown type {s}")))
    }
}

impl FromStr for ParamType {
    type Err = EthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamType::parse(s)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::FixedBytes(len) => write!(f, "bytes{len}"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            ParamType::Tuple(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn parse_int_width(ty: &str, bits: &str) -> Result<usize, EthError> {
    let bits = bits
        .parse::<usize>()
        .map_err(|_| EthError::InvalidAbi(format!("unknown type {ty}")))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(EthError::InvalidAbi(format!("integer width out of range in {ty}")));
    }
    Ok(bits)
}

/// Splits a comma-separated type list, ignoring commas nested inside tuples.
pub(crate) fn split_top_level(list: &str) -> Result<Vec<&str>, EthError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| EthError::InvalidAbi(format!("unbalanced parentheses in {list}")))?;
            }
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(EthError::InvalidAbi(format!("unbalanced parentheses in {list}")));
    }
    parts.push(&list[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elementary_types() {
        assert_eq!(ParamType::parse("address").unwrap(), ParamType::Address);
        assert_eq!(ParamType::parse("bool").unwrap(), ParamType::Bool);
        assert_eq!(ParamType::parse("uint8").unwrap(), ParamType::Uint(8));
        assert_eq!(ParamType::parse("int128").unwrap(), ParamType::Int(128));
        assert_eq!(ParamType::parse("bytes32").unwrap(), ParamType::FixedBytes(32));
        assert_eq!(ParamType::parse("bytes").unwrap(), ParamType::Bytes);
        assert_eq!(ParamType::parse("string").unwrap(), ParamType::String);
    }

    #[test]
    fn shorthand_integers_are_256_bits() {
        assert_eq!(ParamType::parse("uint").unwrap().to_string(), "uint256");
        assert_eq!(ParamType::parse("int").unwrap().to_string(), "int256");
    }

    #[test]
    fn parses_nested_arrays_and_tuples() {
        let ty = ParamType::parse("(uint256,address[])[2][]").unwrap();
        assert_eq!(
            ty,
            ParamType::Array(Box::new(ParamType::FixedArray(
                Box::new(ParamType::Tuple(vec![
                    ParamType::Uint(256),
                    ParamType::Array(Box::new(ParamType::Address)),
                ])),
                2
            )))
        );
        assert_eq!(ty.to_string(), "(uint256,address[])[2][]");
    }

    #[test]
    fn rejects_invalid_types() {
        for bad in ["", "uint7", "uint264", "bytes0", "bytes33", "foo", "uint256[", "(uint256", "int0", "()", "()[]", "uint256[0]"] {
            assert!(ParamType::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn dynamic_classification() {
        assert!(!ParamType::parse("uint256").unwrap().is_dynamic());
        assert!(!ParamType::parse("bytes32[3]").unwrap().is_dynamic());
        assert!(ParamType::parse("string[3]").unwrap().is_dynamic());
        assert!(ParamType::parse("(uint256,bytes)").unwrap().is_dynamic());
        assert!(!ParamType::parse("(uint256,bool)").unwrap().is_dynamic());
    }

    #[test]
    fn head_size_of_static_composites() {
        assert_eq!(ParamType::parse("uint256[3]").unwrap().head_size(), 96);
        assert_eq!(ParamType::parse("(address,(bool,uint8))").unwrap().head_size(), 96);
        assert_eq!(ParamType::parse("uint256[]").unwrap().head_size(), 32);
    }

    #[test]
    fn oversized_static_arrays_rejected() {
        assert!(ParamType::parse("uint256[1000000000000000000]").is_err());
        assert!(ParamType::parse("(uint256[576460752303423488],bool)").is_err());
        // Dynamic elements only take an offset word in the head.
        assert!(ParamType::parse("string[3]").is_ok());

        let built = ParamType::FixedArray(Box::new(ParamType::Uint(256)), usize::MAX);
        assert_eq!(built.head_size(), usize::MAX);
    }

    #[test]
    fn split_ignores_nested_commas() {
        assert_eq!(
            split_top_level("uint256,(address,bool),bytes").unwrap(),
            vec!["uint256", "(address,bool)", "bytes"]
        );
        assert!(split_top_level("").unwrap().is_empty());
        assert!(split_top_level("(a,b").is_err());
    }
}
