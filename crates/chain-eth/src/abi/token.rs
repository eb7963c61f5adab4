use alloy_primitives::{Address, I256, U256};

use super::param_type::ParamType;
use crate::error::EthError;

/// A value of some [`ParamType`], ready to be encoded or freshly decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
    FixedArray(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    /// Short description of the token's shape, used in mismatch errors.
    pub fn kind(&self) -> String {
        match self {
            Token::Address(_) => "address".into(),
            Token::Bool(_) => "bool".into(),
            Token::Uint(_) => "uint".into(),
            Token::Int(_) => "int".into(),
            Token::FixedBytes(b) => format!("bytes{}", b.len()),
            Token::Bytes(_) => "bytes".into(),
            Token::String(_) => "string".into(),
            Token::Array(items) => format!("array[{}]", items.len()),
            Token::FixedArray(items) => format!("fixed array[{}]", items.len()),
            Token::Tuple(items) => format!("tuple of {}", items.len()),
        }
    }

    /// Checks the token's shape against `ty`, recursing into composites.
    ///
    /// Integer range is checked separately at encode time.
    pub fn type_check(&self, ty: &ParamType) -> bool {
        match (self, ty) {
            (Token::Address(_), ParamType::Address)
            | (Token::Bool(_), ParamType::Bool)
            | (Token::Uint(_), ParamType::Uint(_))
            | (Token::Int(_), ParamType::Int(_))
            | (Token::Bytes(_), ParamType::Bytes)
            | (Token::String(_), ParamType::String) => true,
            (Token::FixedBytes(b), ParamType::FixedBytes(len)) => b.len() == *len,
            (Token::Array(items), ParamType::Array(inner)) => {
                items.iter().all(|item| item.type_check(inner))
            }
            (Token::FixedArray(items), ParamType::FixedArray(inner, len)) => {
                items.len() == *len && items.iter().all(|item| item.type_check(inner))
            }
            (Token::Tuple(items), ParamType::Tuple(members)) => {
                items.len() == members.len()
                    && items.iter().zip(members).all(|(item, member)| item.type_check(member))
            }
            _ => false,
        }
    }

    /// The address, if this is an `Address` token.
    pub fn into_address(self) -> Option<Address> {
        match self {
            Token::Address(a) => Some(a),
            _ => None,
        }
    }

    /// The value, if this is a `Uint` token.
    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(v),
            _ => None,
        }
    }

    /// The value, if this is an `Int` token.
    pub fn into_int(self) -> Option<I256> {
        match self {
            Token::Int(v) => Some(v),
            _ => None,
        }
    }

    /// The flag, if this is a `Bool` token.
    pub fn into_bool(self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The text, if this is a `String` token.
    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes of a `bytes` or `bytes<M>` token.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Token::Bytes(b) | Token::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the members of an array, fixed array or tuple token.
    pub fn into_tokens(self) -> Option<Vec<Token>> {
        match self {
            Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Address> for Token {
    fn from(value: Address) -> Self {
        Token::Address(value)
    }
}

impl From<bool> for Token {
    fn from(value: bool) -> Self {
        Token::Bool(value)
    }
}

impl From<U256> for Token {
    fn from(value: U256) -> Self {
        Token::Uint(value)
    }
}

impl From<I256> for Token {
    fn from(value: I256) -> Self {
        Token::Int(value)
    }
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Token::Uint(U256::from(value))
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::String(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::String(value)
    }
}

impl From<Vec<u8>> for Token {
    fn from(value: Vec<u8>) -> Self {
        Token::Bytes(value)
    }
}

/// Conversion from a decoded [`Token`] into a Rust value.
pub trait Tokenizable: Sized {
    fn from_token(token: Token) -> Result<Self, EthError>;
}

fn mismatch(expected: &str, token: &Token) -> EthError {
    EthError::TypeMismatch {
        expected: expected.into(),
        actual: token.kind(),
    }
}

impl Tokenizable for Token {
    fn from_token(token: Token) -> Result<Self, EthError> {
        Ok(token)
    }
}

impl Tokenizable for Address {
    fn from_token(token: Token) -> Result<Self, EthError> {
        match token {
            Token::Address(a) => Ok(a),
            other => Err(mismatch("address", &other)),
        }
    }
}

impl Tokenizable for bool {
    fn from_token(token: Token) -> Result<Self, EthError> {
        match token {
            Token::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl Tokenizable for U256 {
    fn from_token(token: Token) -> Result<Self, EthError> {
        match token {
            Token::Uint(v) => Ok(v),
            other => Err(mismatch("uint", &other)),
        }
    }
}

impl Tokenizable for I256 {
    fn from_token(token: Token) -> Result<Self, EthError> {
        match token {
            Token::Int(v) => Ok(v),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl Tokenizable for String {
    fn from_token(token: Token) -> Result<Self, EthError> {
        match token {
            Token::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl Tokenizable for Vec<u8> {
    fn from_token(token: Token) -> Result<Self, EthError> {
        match token {
            Token::Bytes(b) | Token::FixedBytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

macro_rules! impl_tokenizable_for_uint {
    ($($ty:ty),*) => {
        $(
            impl Tokenizable for $ty {
                fn from_token(token: Token) -> Result<Self, EthError> {
                    let value = U256::from_token(token)?;
                    <$ty>::try_from(value).map_err(|_| EthError::TypeMismatch {
                        expected: stringify!($ty).into(),
                        actual: format!("uint value {value}"),
                    })
                }
            }
        )*
    };
}

impl_tokenizable_for_uint!(u8, u16, u32, u64, u128);
