//! Solidity ABI codec: types, values, head/tail encoding and JSON ABI parsing.

mod contract;
mod decode;
mod encode;
mod event;
mod function;
mod param_type;
mod token;

pub use contract::ContractAbi;
pub use decode::decode;
pub use encode::encode;
pub use event::{AbiEvent, EventParam};
pub use function::{selector, AbiFunction, NamedOutputs, Param, StateMutability};
pub use param_type::ParamType;
pub use token::{Token, Tokenizable};
