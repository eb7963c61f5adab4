use alloy_primitives::{Address, I256, U256};

use super::encode::{fits_signed, fits_unsigned};
use super::param_type::ParamType;
use super::token::Token;
use crate::error::EthError;

/// Decodes `data` as a sequence of `types`, following dynamic offsets.
///
/// Fails with [`EthError::MalformedOutput`] when the payload is shorter than
/// the head, when an offset or length points outside the payload, or when a
/// word is not a canonical encoding of its type. An all-zero word decodes to
/// the zero value of numeric types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, EthError> {
    let min_len: usize = types.iter().map(ParamType::head_size).sum();
    if data.len() < min_len {
        return Err(EthError::MalformedOutput(format!(
            "expected at least {min_len} bytes, got {}",
            data.len()
        )));
    }
    let types: Vec<&ParamType> = types.iter().collect();
    decode_sequence(&types, data)
}

fn decode_sequence(types: &[&ParamType], data: &[u8]) -> Result<Vec<Token>, EthError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut cursor = 0;

    for ty in types {
        let token = if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let tail = data.get(offset..).ok_or_else(|| {
                EthError::MalformedOutput(format!(
                    "offset {offset} beyond payload of {} bytes",
                    data.len()
                ))
            })?;
            decode_token(ty, tail)?
        } else {
            decode_token(ty, &data[cursor.min(data.len())..])?
        };
        cursor += ty.head_size();
        tokens.push(token);
    }

    Ok(tokens)
}

fn decode_token(ty: &ParamType, data: &[u8]) -> Result<Token, EthError> {
    match ty {
        ParamType::Address => {
            let word = read_word(data, 0)?;
            if !fits_unsigned(&word, 160) {
                return Err(malformed("address word has non-zero padding"));
            }
            Ok(Token::Address(Address::from_slice(&word[12..])))
        }
        ParamType::Bool => {
            let word = read_word(data, 0)?;
            if !fits_unsigned(&word, 8) || word[31] > 1 {
                return Err(malformed("bool word is neither 0 nor 1"));
            }
            Ok(Token::Bool(word[31] == 1))
        }
        ParamType::Uint(bits) => {
            let word = read_word(data, 0)?;
            if !fits_unsigned(&word, *bits) {
                return Err(EthError::MalformedOutput(format!("value does not fit uint{bits}")));
            }
            Ok(Token::Uint(U256::from_be_bytes(word)))
        }
        ParamType::Int(bits) => {
            let word = read_word(data, 0)?;
            if !fits_signed(&word, *bits) {
                return Err(EthError::MalformedOutput(format!("value does not fit int{bits}")));
            }
            Ok(Token::Int(I256::from_raw(U256::from_be_bytes(word))))
        }
        ParamType::FixedBytes(len) => {
            let word = read_word(data, 0)?;
            if word[*len..].iter().any(|&b| b != 0) {
                return Err(EthError::MalformedOutput(format!(
                    "bytes{len} word has non-zero padding"
                )));
            }
            Ok(Token::FixedBytes(word[..*len].to_vec()))
        }
        ParamType::Bytes => Ok(Token::Bytes(read_packed_bytes(data)?.to_vec())),
        ParamType::String => {
            let bytes = read_packed_bytes(data)?;
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|e| EthError::MalformedOutput(format!("string is not utf-8: {e}")))?;
            Ok(Token::String(s))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, 0)?;
            let items = &data[32..];
            check_room(len, inner, items)?;
            let types = vec![inner.as_ref(); len];
            Ok(Token::Array(decode_sequence(&types, items)?))
        }
        ParamType::FixedArray(inner, len) => {
            check_room(*len, inner, data)?;
            let types = vec![inner.as_ref(); *len];
            Ok(Token::FixedArray(decode_sequence(&types, data)?))
        }
        ParamType::Tuple(members) => {
            let types: Vec<&ParamType> = members.iter().collect();
            Ok(Token::Tuple(decode_sequence(&types, data)?))
        }
    }
}

/// Every element takes at least one head word, so `len` elements need at
/// least `len * 32` bytes before anything is allocated for them.
fn check_room(len: usize, inner: &ParamType, items: &[u8]) -> Result<(), EthError> {
    let min_len = len
        .checked_mul(inner.head_size().max(32))
        .ok_or_else(|| EthError::MalformedOutput(format!("array length {len} overflows")))?;
    if items.len() < min_len {
        return Err(EthError::MalformedOutput(format!(
            "array of {len} elements needs {min_len} bytes, got {}",
            items.len()
        )));
    }
    Ok(())
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; 32], EthError> {
    let end = at.checked_add(32).ok_or_else(|| malformed("word position overflows"))?;
    let slice = data.get(at..end).ok_or_else(|| {
        EthError::MalformedOutput(format!(
            "need 32 bytes at position {at}, payload has {}",
            data.len()
        ))
    })?;
    let mut word = [0u8; 32];
    word.copy_from_slice(slice);
    Ok(word)
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, EthError> {
    let value = U256::from_be_bytes(read_word(data, at)?);
    usize::try_from(value)
        .map_err(|_| EthError::MalformedOutput(format!("offset or length {value} too large")))
}

fn read_packed_bytes(data: &[u8]) -> Result<&[u8], EthError> {
    let len = read_usize(data, 0)?;
    let end = len
        .checked_add(32)
        .ok_or_else(|| malformed("byte length overflows"))?;
    data.get(32..end).ok_or_else(|| {
        EthError::MalformedOutput(format!(
            "byte string of length {len} exceeds payload of {} bytes",
            data.len()
        ))
    })
}

fn malformed(msg: &str) -> EthError {
    EthError::MalformedOutput(msg.into())
}
