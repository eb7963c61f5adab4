use alloy_primitives::U256;

use super::param_type::ParamType;
use super::token::Token;
use crate::error::EthError;

/// ABI-encodes `tokens` as a sequence of `types` (head/tail layout).
///
/// Static values sit inline in the head; dynamic values leave a 32-byte
/// offset in the head and append their contents to the tail, in order.
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, EthError> {
    if types.len() != tokens.len() {
        return Err(EthError::ArgumentCountMismatch {
            function: "parameter list".into(),
            expected: types.len(),
            actual: tokens.len(),
        });
    }
    let pairs: Vec<_> = types.iter().zip(tokens).collect();
    encode_sequence(&pairs)
}

fn encode_sequence(pairs: &[(&ParamType, &Token)]) -> Result<Vec<u8>, EthError> {
    let head_len: usize = pairs.iter().map(|(ty, _)| ty.head_size()).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (ty, token) in pairs {
        if !token.type_check(ty) {
            return Err(EthError::TypeMismatch {
                expected: ty.to_string(),
                actual: token.kind(),
            });
        }

        let encoded = encode_token(ty, token)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend_from_slice(&encoded);
        } else {
            head.extend_from_slice(&encoded);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_token(ty: &ParamType, token: &Token) -> Result<Vec<u8>, EthError> {
    match (ty, token) {
        (ParamType::Address, Token::Address(address)) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(address.as_slice());
            Ok(word.to_vec())
        }
        (ParamType::Bool, Token::Bool(value)) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*value);
            Ok(word.to_vec())
        }
        (ParamType::Uint(bits), Token::Uint(value)) => {
            if value.bit_len() > *bits {
                return Err(EthError::TypeMismatch {
                    expected: ty.to_string(),
                    actual: format!("uint value {value} ({} bits)", value.bit_len()),
                });
            }
            Ok(value.to_be_bytes::<32>().to_vec())
        }
        (ParamType::Int(bits), Token::Int(value)) => {
            let word = value.into_raw().to_be_bytes::<32>();
            if !fits_signed(&word, *bits) {
                return Err(EthError::TypeMismatch {
                    expected: ty.to_string(),
                    actual: format!("int value {value}"),
                });
            }
            Ok(word.to_vec())
        }
        (ParamType::FixedBytes(_), Token::FixedBytes(bytes)) => {
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(bytes);
            Ok(word.to_vec())
        }
        (ParamType::Bytes, Token::Bytes(bytes)) => Ok(encode_packed_bytes(bytes)),
        (ParamType::String, Token::String(s)) => Ok(encode_packed_bytes(s.as_bytes())),
        (ParamType::Array(inner), Token::Array(items)) => {
            let pairs: Vec<_> = items.iter().map(|item| (inner.as_ref(), item)).collect();
            let mut out = usize_word(items.len()).to_vec();
            out.extend_from_slice(&encode_sequence(&pairs)?);
            Ok(out)
        }
        (ParamType::FixedArray(inner, _), Token::FixedArray(items)) => {
            let pairs: Vec<_> = items.iter().map(|item| (inner.as_ref(), item)).collect();
            encode_sequence(&pairs)
        }
        (ParamType::Tuple(members), Token::Tuple(items)) => {
            let pairs: Vec<_> = members.iter().zip(items).collect();
            encode_sequence(&pairs)
        }
        _ => Err(EthError::TypeMismatch {
            expected: ty.to_string(),
            actual: token.kind(),
        }),
    }
}

/// Length word followed by the data, right-padded to a 32-byte multiple.
fn encode_packed_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(32 + padded_len);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(32 + padded_len, 0);
    out
}

fn usize_word(value: usize) -> [u8; 32] {
    U256::from(value).to_be_bytes::<32>()
}

/// Whether a 32-byte two's complement word is a sign extension of its low
/// `bits` bits.
pub(super) fn fits_signed(word: &[u8; 32], bits: usize) -> bool {
    let width = bits / 8;
    if width >= 32 {
        return true;
    }
    let sign_byte = if word[32 - width] & 0x80 != 0 { 0xff } else { 0x00 };
    word[..32 - width].iter().all(|&b| b == sign_byte)
}

/// Whether a 32-byte word holds an unsigned value of at most `bits` bits.
pub(super) fn fits_unsigned(word: &[u8; 32], bits: usize) -> bool {
    let width = bits / 8;
    width >= 32 || word[..32 - width].iter().all(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, I256};

    use super::*;

    fn types(list: &[&str]) -> Vec<ParamType> {
        list.iter().map(|t| ParamType::parse(t).unwrap()).collect()
    }

    #[test]
    fn static_values_are_single_words() {
        let mut addr = [0u8; 20];
        addr[19] = 0x01;
        let data = encode(
            &types(&["address", "uint256", "bool"]),
            &[
                Token::Address(Address::from(addr)),
                Token::from(100u64),
                Token::Bool(true),
            ],
        )
        .unwrap();

        assert_eq!(data.len(), 96);
        assert_eq!(&data[..12], &[0u8; 12]);
        assert_eq!(data[31], 0x01);
        assert_eq!(data[63], 100);
        assert_eq!(data[95], 1);
    }

    #[test]
    fn negative_int_is_sign_extended() {
        let data = encode(&types(&["int8"]), &[Token::Int("-1".parse::<I256>().unwrap())]).unwrap();
        assert_eq!(data, vec![0xff; 32]);
    }

    #[test]
    fn string_is_offset_length_and_padded_data() {
        let data = encode(&types(&["string"]), &[Token::from("Hello, world!")]).unwrap();
        assert_eq!(
            hex::encode(data),
            "0000000000000000000000000000000000000000000000000000000000000020\
             000000000000000000000000000000000000000000000000000000000000000d\
             48656c6c6f2c20776f726c642100000000000000000000000000000000000000"
        );
    }

    #[test]
    fn empty_bytes_is_offset_and_zero_length() {
        let data = encode(&types(&["bytes"]), &[Token::Bytes(vec![])]).unwrap();
        assert_eq!(data.len(), 64);
        assert_eq!(data[31], 0x20);
        assert_eq!(&data[32..], &[0u8; 32]);
    }

    #[test]
    fn fixed_bytes_are_right_padded() {
        let data = encode(&types(&["bytes2"]), &[Token::FixedBytes(vec![0xCA, 0xFE])]).unwrap();
        assert_eq!(&data[..2], &[0xCA, 0xFE]);
        assert_eq!(&data[2..], &[0u8; 30]);
    }

    #[test]
    fn dynamic_tuple_in_array() {
        // (uint256,string)[] with one element.
        let data = encode(
            &types(&["(uint256,string)[]"]),
            &[Token::Array(vec![Token::Tuple(vec![
                Token::from(7u64),
                Token::from("x"),
            ])])],
        )
        .unwrap();

        let words: Vec<String> = data.chunks(32).map(hex::encode).collect();
        let word = |v: u8| format!("{:064x}", v);
        assert_eq!(words[0], word(0x20)); // offset of the array
        assert_eq!(words[1], word(1)); // array length
        assert_eq!(words[2], word(0x20)); // offset of the tuple within the array
        assert_eq!(words[3], word(7)); // tuple.0
        assert_eq!(words[4], word(0x40)); // offset of tuple.1 within the tuple
        assert_eq!(words[5], word(1)); // string length
        assert!(words[6].starts_with("78"));
        assert_eq!(words.len(), 7);
    }

    #[test]
    fn uint_out_of_range_rejected() {
        let err = encode(&types(&["uint8"]), &[Token::from(256u64)]).unwrap_err();
        assert!(matches!(err, EthError::TypeMismatch { .. }));
    }

    #[test]
    fn int_out_of_range_rejected() {
        let err = encode(&types(&["int8"]), &[Token::Int("128".parse::<I256>().unwrap())]).unwrap_err();
        assert!(matches!(err, EthError::TypeMismatch { .. }));
        assert!(encode(&types(&["int8"]), &[Token::Int("-128".parse::<I256>().unwrap())]).is_ok());
    }

    #[test]
    fn wrong_token_kind_rejected() {
        let err = encode(&types(&["address"]), &[Token::Bool(true)]).unwrap_err();
        match err {
            EthError::TypeMismatch { expected, actual } => {
                assert_eq!(expected, "address");
                assert_eq!(actual, "bool");
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn wrong_count_rejected() {
        let err = encode(&types(&["address", "uint256"]), &[Token::from(1u64)]).unwrap_err();
        assert!(matches!(err, EthError::ArgumentCountMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn sign_extension_helpers() {
        let mut word = [0u8; 32];
        word[31] = 0x7f;
        assert!(fits_signed(&word, 8));
        assert!(fits_unsigned(&word, 8));
        word[31] = 0x80;
        assert!(!fits_signed(&word, 8));
        assert!(fits_signed(&word, 16));
    }
}
