use serde::Deserialize;

use super::event::{AbiEvent, EventParam};
use super::function::{AbiFunction, Param, StateMutability};
use super::param_type::ParamType;
use crate::error::EthError;

/// A parsed contract ABI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAbi {
    pub functions: Vec<AbiFunction>,
    pub events: Vec<AbiEvent>,
    pub constructor: Option<AbiFunction>,
    pub has_fallback: bool,
    pub has_receive: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<JsonParam>,
    #[serde(default)]
    outputs: Vec<JsonParam>,
    #[serde(default)]
    state_mutability: Option<StateMutability>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Deserialize)]
struct JsonParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    components: Vec<JsonParam>,
    #[serde(default)]
    indexed: bool,
}

fn default_entry_type() -> String {
    "function".to_string()
}

impl JsonParam {
    /// Resolves `tuple`, `tuple[]`, `tuple[2][]` etc. against `components`.
    fn param_type(&self) -> Result<ParamType, EthError> {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let members = self
                    .components
                    .iter()
                    .map(JsonParam::param_type)
                    .collect::<Result<Vec<_>, _>>()?;
                let tuple = ParamType::Tuple(members).to_string();
                ParamType::parse(&format!("{tuple}{suffix}"))
            }
            None => ParamType::parse(&self.kind),
        }
    }

    fn to_param(&self) -> Result<Param, EthError> {
        Ok(Param::new(self.name.clone(), self.param_type()?))
    }
}

impl JsonEntry {
    fn mutability(&self) -> StateMutability {
        if let Some(state) = self.state_mutability {
            return state;
        }
        // Pre-0.4.16 compilers only emit `constant` and `payable`.
        if self.constant == Some(true) {
            StateMutability::View
        } else if self.payable == Some(true) {
            StateMutability::Payable
        } else {
            StateMutability::NonPayable
        }
    }

    fn required_name(&self) -> Result<String, EthError> {
        match &self.name {
            Some(name) if !name.is_empty() => Ok(name.clone()),
            _ => Err(EthError::InvalidAbi(format!("{} entry without a name", self.kind))),
        }
    }
}

impl ContractAbi {
    /// Parses the JSON ABI emitted by solc.
    pub fn from_json(json: &str) -> Result<Self, EthError> {
        let entries: Vec<JsonEntry> =
            serde_json::from_str(json).map_err(|e| EthError::InvalidAbi(e.to_string()))?;

        let mut abi = ContractAbi::default();
        for entry in entries {
            match entry.kind.as_str() {
                "function" => {
                    let inputs = entry
                        .inputs
                        .iter()
                        .map(JsonParam::to_param)
                        .collect::<Result<Vec<_>, _>>()?;
                    let outputs = entry
                        .outputs
                        .iter()
                        .map(JsonParam::to_param)
                        .collect::<Result<Vec<_>, _>>()?;
                    abi.functions.push(AbiFunction {
                        name: entry.required_name()?,
                        inputs,
                        outputs,
                        state_mutability: entry.mutability(),
                    });
                }
                "event" => {
                    let inputs = entry
                        .inputs
                        .iter()
                        .map(|p| {
                            Ok(EventParam {
                                name: p.name.clone(),
                                kind: p.param_type()?,
                                indexed: p.indexed,
                            })
                        })
                        .collect::<Result<Vec<_>, EthError>>()?;
                    abi.events.push(AbiEvent {
                        name: entry.required_name()?,
                        inputs,
                        anonymous: entry.anonymous,
                    });
                }
                "constructor" => {
                    let inputs = entry
                        .inputs
                        .iter()
                        .map(JsonParam::to_param)
                        .collect::<Result<Vec<_>, _>>()?;
                    abi.constructor = Some(AbiFunction {
                        name: "constructor".to_string(),
                        inputs,
                        outputs: Vec::new(),
                        state_mutability: entry.mutability(),
                    });
                }
                "fallback" => abi.has_fallback = true,
                "receive" => abi.has_receive = true,
                // Custom errors are not decoded.
                "error" => {}
                other => {
                    return Err(EthError::InvalidAbi(format!("unknown entry type {other}")));
                }
            }
        }

        tracing::debug!(
            functions = abi.functions.len(),
            events = abi.events.len(),
            "parsed contract ABI"
        );
        Ok(abi)
    }

    /// The declared constructor, or the implicit one solc generates when
    /// none is declared: no arguments and non-payable.
    pub fn constructor_or_default(&self) -> AbiFunction {
        self.constructor.clone().unwrap_or_else(|| AbiFunction {
            name: "constructor".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            state_mutability: StateMutability::NonPayable,
        })
    }

    /// First function with the given name.
    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// All overloads sharing a name.
    pub fn functions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AbiFunction> + 'a {
        self.functions.iter().filter(move |f| f.name == name)
    }

    /// Looks up by canonical signature, which disambiguates overloads.
    pub fn function_by_signature(&self, signature: &str) -> Option<&AbiFunction> {
        let signature: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        self.functions.iter().find(|f| f.signature() == signature)
    }

    /// Looks up the function a call data selector targets.
    pub fn function_by_selector(&self, selector: [u8; 4]) -> Option<&AbiFunction> {
        self.functions.iter().find(|f| f.selector() == selector)
    }

    /// First event with the given name.
    pub fn event(&self, name: &str) -> Option<&AbiEvent> {
        self.events.iter().find(|e| e.name == name)
    }
}
