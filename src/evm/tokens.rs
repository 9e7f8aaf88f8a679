//! ERC20 Token Helpers
//!
//! Read-only ERC-20 lookups used by balance queries and the preflight tool.

use crate::evm::contracts::ERC20;
use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    transports::Transport,
};
use eyre::{eyre, Result};
use std::sync::Arc;

/// Get the ERC20 token balance of an address
pub async fn get_token_balance<T, P>(
    provider: Arc<P>,
    token_address: Address,
    account: Address,
) -> Result<U256>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let contract = ERC20::new(token_address, provider);
    let balance = contract
        .balanceOf(account)
        .call()
        .await
        .map_err(|e| eyre!("Failed to get balance of {}: {}", token_address, e))?;
    Ok(balance._0)
}

/// Get the amount `spender` may pull from `owner`
pub async fn get_token_allowance<T, P>(
    provider: Arc<P>,
    token_address: Address,
    owner: Address,
    spender: Address,
) -> Result<U256>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let contract = ERC20::new(token_address, provider);
    let allowance = contract
        .allowance(owner, spender)
        .call()
        .await
        .map_err(|e| eyre!("Failed to get allowance on {}: {}", token_address, e))?;
    Ok(allowance._0)
}

/// Token info shown next to balances
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

/// Get symbol and decimals in one round trip pair
pub async fn get_token_info<T, P>(
    provider: Arc<P>,
    token_address: Address,
) -> Result<TokenInfo>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let contract = ERC20::new(token_address, provider);

    let (symbol, decimals) = tokio::try_join!(
        async {
            contract
                .symbol()
                .call()
                .await
                .map(|r| r._0)
                .map_err(|e| eyre!("Failed to get symbol: {}", e))
        },
        async {
            contract
                .decimals()
                .call()
                .await
                .map(|r| r._0)
                .map_err(|e| eyre!("Failed to get decimals: {}", e))
        }
    )?;

    Ok(TokenInfo {
        address: token_address,
        symbol,
        decimals,
    })
}
