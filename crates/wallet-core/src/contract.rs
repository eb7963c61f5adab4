use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use chain_eth::abi::{AbiFunction, ContractAbi, Token, Tokenizable};
use chain_eth::transaction::{self, TransactionInput};

use crate::error::WalletError;
use crate::keys::KeyPair;
use crate::transport::{BlockTag, CallInput, RpcTransport};

/// Sender, nonce and fee fields of a state-changing call.
///
/// The nonce is always supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOptions {
    pub from: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub value: U256,
    pub chain_id: Option<u64>,
}

impl TxOptions {
    /// Options sending no value, without replay protection.
    pub fn new(from: Address, nonce: u64, gas_limit: u64, gas_price: U256) -> Self {
        Self {
            from,
            nonce,
            gas_limit,
            gas_price,
            value: U256::ZERO,
            chain_id: None,
        }
    }

    /// Attaches native value, in wei.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Signs with EIP-155 replay protection for `chain_id`.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    fn build(&self, to: Option<Address>, data: Vec<u8>) -> TransactionInput {
        let tx = transaction::build_unsigned(
            self.from,
            to,
            self.nonce,
            self.gas_limit,
            self.gas_price,
            self.value,
            data,
        );
        match self.chain_id {
            Some(chain_id) => tx.with_chain_id(chain_id),
            None => tx,
        }
    }
}

/// A contract ABI bound to a deployed address and a transport.
pub struct ContractService {
    abi: ContractAbi,
    address: Address,
    transport: Arc<dyn RpcTransport>,
}

impl ContractService {
    /// Binds a parsed ABI to `address`.
    pub fn new(abi: ContractAbi, address: Address, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            abi,
            address,
            transport,
        }
    }

    /// Parses `abi_json` and binds it to `address`.
    pub fn from_json(abi_json: &str, address: Address, transport: Arc<dyn RpcTransport>) -> Result<Self, WalletError> {
        Ok(Self::new(ContractAbi::from_json(abi_json)?, address, transport))
    }

    /// Address of the bound contract.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The parsed ABI.
    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    /// Resolves a function by name, or by full signature for overloads.
    pub fn function(&self, name: &str) -> Result<&AbiFunction, WalletError> {
        let found = if name.contains('(') {
            self.abi.function_by_signature(name)
        } else {
            self.abi.function(name)
        };
        found.ok_or_else(|| WalletError::UnknownFunction(name.to_string()))
    }

    /// Encodes a read of `name` against this contract.
    pub fn build_call(&self, name: &str, args: &[Token]) -> Result<CallInput, WalletError> {
        let data = self.function(name)?.encode_call(args)?;
        Ok(CallInput::new(self.address, data))
    }

    /// Encodes a state-changing call of `name` as an unsigned transaction.
    pub fn build_transaction(&self, name: &str, args: &[Token], options: &TxOptions) -> Result<TransactionInput, WalletError> {
        let function = self.function(name)?;
        function.check_value(options.value)?;
        let data = function.encode_call(args)?;

        tracing::debug!(
            contract = %self.address,
            function = %function.signature(),
            nonce = options.nonce,
            "built contract transaction"
        );
        Ok(options.build(Some(self.address), data))
    }

    /// Builds a contract-creation transaction: `bytecode` followed by the
    /// encoded constructor arguments.
    pub fn build_deployment(abi: &ContractAbi, bytecode: &[u8], args: &[Token], options: &TxOptions) -> Result<TransactionInput, WalletError> {
        let constructor = abi.constructor_or_default();
        constructor.check_value(options.value)?;
        let encoded_args = constructor.encode_args(args)?;

        let mut data = Vec::with_capacity(bytecode.len() + encoded_args.len());
        data.extend_from_slice(bytecode);
        data.extend_from_slice(&encoded_args);
        tracing::debug!(nonce = options.nonce, bytes = data.len(), "built contract deployment");
        Ok(options.build(None, data))
    }

    /// Decodes the raw hex result of a read of `name`.
    pub fn decode_output(&self, name: &str, raw: &str) -> Result<Vec<Token>, WalletError> {
        let bytes = decode_result(raw)?;
        Ok(self.function(name)?.decode_outputs(&bytes)?)
    }

    /// Performs a read and decodes every declared output.
    pub async fn call(&self, name: &str, args: &[Token], block: BlockTag) -> Result<Vec<Token>, WalletError> {
        let input = self.build_call(name, args)?;
        tracing::debug!(contract = %self.address, function = name, %block, "eth_call");
        let raw = self.transport.call(&input, block).await?;
        self.decode_output(name, &raw)
    }

    /// Performs a read of a function with exactly one output and converts
    /// it to `R`.
    pub async fn call_single<R: Tokenizable>(&self, name: &str, args: &[Token]) -> Result<R, WalletError> {
        let mut outputs = self.call(name, args, BlockTag::Latest).await?;
        if outputs.len() != 1 {
            return Err(WalletError::MalformedOutput(format!(
                "{name} returned {} values, expected 1",
                outputs.len()
            )));
        }
        let token = outputs.remove(0);
        Ok(R::from_token(token)?)
    }

    /// Builds, signs and broadcasts a call of `name`, returning the
    /// transaction hash reported by the transport.
    pub async fn send_transaction(&self, name: &str, args: &[Token], options: &TxOptions, key: &KeyPair) -> Result<String, WalletError> {
        let tx = self.build_transaction(name, args, options)?;
        let signed = transaction::sign(&tx, key.secret())?;
        let hash = self.transport.send_raw_transaction(&signed).await?;
        tracing::info!(contract = %self.address, function = name, %hash, "submitted transaction");
        Ok(hash)
    }

    /// Decodes a log emitted by this contract.
    pub fn decode_log(&self, event: &str, topics: &[B256], data: &[u8]) -> Result<Vec<(String, Token)>, WalletError> {
        let event = self
            .abi
            .event(event)
            .ok_or_else(|| WalletError::UnknownFunction(event.to_string()))?;
        Ok(event.decode_log(topics, data)?)
    }
}

fn decode_result(raw: &str) -> Result<Bytes, WalletError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| WalletError::MalformedOutput(format!("result is not hex: {e}")))
}
