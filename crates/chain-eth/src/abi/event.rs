use alloy_primitives::B256;
use sha3::{Digest, Keccak256};

use super::decode::decode;
use super::param_type::ParamType;
use super::token::Token;
use crate::error::EthError;

/// An event parameter. Indexed parameters are carried in log topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub kind: ParamType,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiEvent {
    pub name: String,
    pub inputs: Vec<EventParam>,
    pub anonymous: bool,
}

impl AbiEvent {
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First log topic of a non-anonymous event.
    pub fn topic(&self) -> B256 {
        B256::from_slice(&Keccak256::digest(self.signature().as_bytes()))
    }

    /// Decodes a log into `(name, value)` pairs in declaration order.
    ///
    /// Indexed parameters of dynamic type only have their keccak hash in the
    /// topic, so they come back as `Token::FixedBytes` of that hash.
    pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<Vec<(String, Token)>, EthError> {
        let topics = if self.anonymous {
            topics
        } else {
            match topics.split_first() {
                Some((first, rest)) if *first == self.topic() => rest,
                _ => {
                    return Err(EthError::MalformedOutput(format!(
                        "log topic does not match {}",
                        self.signature()
                    )))
                }
            }
        };

        let indexed: Vec<&EventParam> = self.inputs.iter().filter(|p| p.indexed).collect();
        if indexed.len() != topics.len() {
            return Err(EthError::MalformedOutput(format!(
                "{} expects {} indexed topics, log has {}",
                self.signature(),
                indexed.len(),
                topics.len()
            )));
        }

        let body_types: Vec<ParamType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let mut body = decode(&body_types, data)?.into_iter();
        let mut topics = topics.iter();

        let mut out = Vec::with_capacity(self.inputs.len());
        for param in &self.inputs {
            let token = if param.indexed {
                let topic = topics.next().ok_or_else(|| {
                    EthError::MalformedOutput("missing indexed topic".into())
                })?;
                decode_topic(&param.kind, topic)?
            } else {
                body.next()
                    .ok_or_else(|| EthError::MalformedOutput("missing log data value".into()))?
            };
            out.push((param.name.clone(), token));
        }
        Ok(out)
    }
}

fn decode_topic(kind: &ParamType, topic: &B256) -> Result<Token, EthError> {
    if kind.is_dynamic() || matches!(kind, ParamType::Tuple(_) | ParamType::FixedArray(..)) {
        return Ok(Token::FixedBytes(topic.to_vec()));
    }
    let mut tokens = decode(std::slice::from_ref(kind), topic.as_slice())?;
    tokens
        .pop()
        .ok_or_else(|| EthError::MalformedOutput("empty topic".into()))
}
