use std::sync::Arc;

use alloy_primitives::{Address, U256};
use chain_eth::abi::Token;
use chain_eth::erc20::ERC20_ABI;
use chain_eth::transaction::TransactionInput;
use chain_eth::units::{from_base_units, to_base_units, Amount};
use serde::Serialize;

use crate::contract::{ContractService, TxOptions};
use crate::error::WalletError;
use crate::transport::{BlockTag, RpcTransport};

/// Metadata read from an ERC-20 contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Total supply in base units. Zero is a valid supply.
    pub total_supply: U256,
}

impl TokenInfo {
    /// Total supply as a human-readable decimal string.
    pub fn formatted_supply(&self) -> String {
        from_base_units(self.total_supply, self.decimals)
    }
}

/// ERC-20 helpers over a [`ContractService`] bound to the token address.
pub struct TokenService {
    contract: ContractService,
}

impl TokenService {
    /// Binds the standard ERC-20 ABI to the token at `token`.
    pub fn new(token: Address, transport: Arc<dyn RpcTransport>) -> Result<Self, WalletError> {
        Ok(Self {
            contract: ContractService::from_json(ERC20_ABI, token, transport)?,
        })
    }

    /// Underlying contract service, for calls outside the ERC-20 surface.
    pub fn contract(&self) -> &ContractService {
        &self.contract
    }

    /// Reads name, symbol, decimals and total supply.
    pub async fn token_info(&self) -> Result<TokenInfo, WalletError> {
        let name: String = self.contract.call_single("name", &[]).await?;
        let symbol: String = self.contract.call_single("symbol", &[]).await?;
        let decimals: u8 = self.contract.call_single("decimals", &[]).await?;
        let total_supply: U256 = self.contract.call_single("totalSupply", &[]).await?;

        tracing::debug!(
            token = %self.contract.address(),
            %symbol,
            decimals,
            "loaded token info"
        );
        Ok(TokenInfo {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    /// Token balance of `owner` in base units.
    pub async fn balance_of(&self, owner: Address) -> Result<Amount, WalletError> {
        let decimals: u8 = self.contract.call_single("decimals", &[]).await?;
        let value: U256 = self
            .contract
            .call_single("balanceOf", &[Token::Address(owner)])
            .await?;
        Ok(Amount::new(value, decimals))
    }

    /// Builds an unsigned `transfer` of a human-readable `amount`, scaled
    /// by the token's `decimals`.
    pub fn build_transfer(&self, to: Address, amount: &str, decimals: u8, options: &TxOptions) -> Result<TransactionInput, WalletError> {
        let amount = to_base_units(amount, decimals)?;
        self.contract.build_transaction(
            "transfer",
            &[Token::Address(to), Token::Uint(amount.value)],
            options,
        )
    }
}

/// Native coin balance of `address` formatted with `decimals` places.
pub async fn account_balance(transport: &dyn RpcTransport, address: Address, decimals: u8) -> Result<String, WalletError> {
    let wei = transport.get_balance(address, BlockTag::Latest).await?;
    Ok(from_base_units(wei, decimals))
}
