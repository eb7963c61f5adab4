use alloy_primitives::{Address, B256};
use serde::Serialize;

use crate::address::to_checksum;

/// An EVM-compatible network the wallet can sign for.
#[derive(Debug, Clone, Serialize)]
pub struct EvmChain {
    /// EIP-155 chain id.
    pub chain_id: u64,
    pub name: &'static str,
    /// Native coin symbol.
    pub symbol: &'static str,
    /// Native coin decimals.
    pub decimals: u8,
    pub explorer_url: &'static str,
    pub is_testnet: bool,
}

impl EvmChain {
    /// Block explorer page for a transaction hash.
    pub fn transaction_url(&self, hash: &B256) -> String {
        format!("{}/tx/{}", self.explorer_url, hash)
    }

    /// Block explorer page for an account or contract.
    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{}", self.explorer_url, to_checksum(address))
    }
}

pub const ETHEREUM: EvmChain = EvmChain {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://etherscan.io",
    is_testnet: false,
};

/// Deprecated proof-of-work testnet, kept for signing against old deployments.
pub const ROPSTEN: EvmChain = EvmChain {
    chain_id: 3,
    name: "Ropsten",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://ropsten.etherscan.io",
    is_testnet: true,
};

pub const KOVAN: EvmChain = EvmChain {
    chain_id: 42,
    name: "Kovan",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://kovan.etherscan.io",
    is_testnet: true,
};

pub const SEPOLIA: EvmChain = EvmChain {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://sepolia.etherscan.io",
    is_testnet: true,
};

pub const POLYGON: EvmChain = EvmChain {
    chain_id: 137,
    name: "Polygon",
    symbol: "POL",
    decimals: 18,
    explorer_url: "https://polygonscan.com",
    is_testnet: false,
};

pub const BSC: EvmChain = EvmChain {
    chain_id: 56,
    name: "BNB Smart Chain",
    symbol: "BNB",
    decimals: 18,
    explorer_url: "https://bscscan.com",
    is_testnet: false,
};

const ALL_CHAINS: &[&EvmChain] = &[&ETHEREUM, &ROPSTEN, &KOVAN, &SEPOLIA, &POLYGON, &BSC];

/// Returns the network with the given EIP-155 chain id, if known.
pub fn chain_by_id(chain_id: u64) -> Option<&'static EvmChain> {
    ALL_CHAINS.iter().find(|c| c.chain_id == chain_id).copied()
}

/// Every network in the table, in declaration order.
pub fn supported_chains() -> Vec<&'static EvmChain> {
    ALL_CHAINS.to_vec()
}
