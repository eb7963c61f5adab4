use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use super::decode::decode;
use super::encode::encode;
use super::param_type::{split_top_level, ParamType};
use super::token::Token;
use crate::error::EthError;

/// Returns the 4-byte selector of a canonical signature such as
/// `transfer(address,uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// A named function or event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamType,
}

impl Param {
    /// A parameter; `name` may be empty.
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Declared state mutability of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Read-only functions are served by `eth_call` and never signed.
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }

    /// Only payable functions accept a non-zero value.
    pub fn is_payable(&self) -> bool {
        matches!(self, StateMutability::Payable)
    }
}

/// One callable contract entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
}

/// Decoded outputs keeping their declared names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedOutputs(pub Vec<(String, Token)>);

impl NamedOutputs {
    /// Looks up an output by its declared name.
    pub fn get(&self, name: &str) -> Option<&Token> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Drops the names, keeping declaration order.
    pub fn into_tokens(self) -> Vec<Token> {
        self.0.into_iter().map(|(_, t)| t).collect()
    }
}

impl AbiFunction {
    /// Parses a human-readable signature `name(type1,type2,...)`.
    ///
    /// The result has unnamed inputs, no outputs and is non-payable.
    pub fn from_signature(signature: &str) -> Result<Self, EthError> {
        let signature = signature.trim();
        let open = signature
            .find('(')
            .ok_or_else(|| EthError::InvalidAbi(format!("missing '(' in {signature}")))?;
        let body = signature[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| EthError::InvalidAbi(format!("missing ')' in {signature}")))?;
        let name = signature[..open].trim();
        if name.is_empty() {
            return Err(EthError::InvalidAbi(format!("missing name in {signature}")));
        }

        let inputs = split_top_level(body)?
            .into_iter()
            .map(|ty| ParamType::parse(ty).map(|kind| Param::new("", kind)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            inputs,
            outputs: Vec::new(),
            state_mutability: StateMutability::NonPayable,
        })
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Selector of [`signature`](Self::signature).
    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }

    /// Types of the inputs in order.
    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Types of the outputs in order.
    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Encodes the arguments alone, as appended to deployment bytecode.
    pub fn encode_args(&self, args: &[Token]) -> Result<Vec<u8>, EthError> {
        if args.len() != self.inputs.len() {
            return Err(EthError::ArgumentCountMismatch {
                function: self.signature(),
                expected: self.inputs.len(),
                actual: args.len(),
            });
        }
        encode(&self.input_types(), args)
    }

    /// Builds call data: selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[Token]) -> Result<Vec<u8>, EthError> {
        let encoded = self.encode_args(args)?;
        let mut data = Vec::with_capacity(4 + encoded.len());
        data.extend_from_slice(&self.selector());
        data.extend_from_slice(&encoded);
        Ok(data)
    }

    /// Rejects a non-zero `value` unless the function is payable.
    pub fn check_value(&self, value: U256) -> Result<(), EthError> {
        if !value.is_zero() && !self.state_mutability.is_payable() {
            return Err(EthError::NonPayableValue {
                function: self.signature(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Decodes call data produced by [`encode_call`](Self::encode_call).
    pub fn decode_input(&self, data: &[u8]) -> Result<Vec<Token>, EthError> {
        if data.len() < 4 || data[..4] != self.selector() {
            return Err(EthError::MalformedOutput(format!(
                "call data does not start with the selector of {}",
                self.signature()
            )));
        }
        decode(&self.input_types(), &data[4..])
    }

    /// Decodes a raw return payload into the declared output values.
    pub fn decode_outputs(&self, raw: &[u8]) -> Result<Vec<Token>, EthError> {
        decode(&self.output_types(), raw)
    }

    /// Like [`decode_outputs`](Self::decode_outputs) but pairs every value
    /// with its declared output name.
    pub fn decode_named_outputs(&self, raw: &[u8]) -> Result<NamedOutputs, EthError> {
        let tokens = self.decode_outputs(raw)?;
        Ok(NamedOutputs(
            self.outputs
                .iter()
                .map(|p| p.name.clone())
                .zip(tokens)
                .collect(),
        ))
    }
}
