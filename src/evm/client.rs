//! EVM RPC Client
//!
//! Read-only JSON-RPC client for the EVM side: receipt polling for the
//! settlement tracker plus gas, token balance and allowance queries for the
//! precondition snapshot.

use alloy::{
    primitives::{Address, TxHash, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::chain::{BalanceQuery, EvmChainClient, ReceiptStatus, TokenRef};
use crate::error::ClientError;
use crate::evm::tokens::{get_token_allowance, get_token_balance};
use crate::session::{Connector, Session};

/// Read-only EVM RPC client
pub struct EvmRpcClient {
    provider: Arc<RootProvider<Http<Client>>>,
    chain_id: u64,
}

impl EvmRpcClient {
    /// Connect to `rpc_url` and check that it serves `chain_id`
    pub async fn new(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        let remote_chain_id = provider.get_chain_id().await?;
        if remote_chain_id != chain_id {
            return Err(eyre!(
                "RPC {} serves chain {}, expected {}",
                rpc_url,
                remote_chain_id,
                chain_id
            ));
        }

        info!(rpc_url = %rpc_url, chain_id = chain_id, "Created read-only EVM client");

        Ok(Self {
            provider: Arc::new(provider),
            chain_id,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn provider(&self) -> Arc<RootProvider<Http<Client>>> {
        Arc::clone(&self.provider)
    }
}

fn parse_owner(raw: &str) -> Result<Address, ClientError> {
    Address::from_str(raw.trim())
        .map_err(|e| ClientError::Decode(format!("invalid EVM address {}: {}", raw, e)))
}

#[async_trait]
impl EvmChainClient for EvmRpcClient {
    async fn receipt_status(&self, hash: TxHash) -> Result<Option<ReceiptStatus>, ClientError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;

        Ok(receipt.map(|receipt| {
            debug!(
                tx_hash = %hash,
                block_number = ?receipt.block_number,
                success = receipt.status(),
                "Receipt found"
            );
            ReceiptStatus {
                success: receipt.status(),
                block_hash: receipt.block_hash,
            }
        }))
    }
}

#[async_trait]
impl BalanceQuery for EvmRpcClient {
    async fn get_balance(&self, owner: &str, token: TokenRef) -> Result<U256, ClientError> {
        let owner = parse_owner(owner)?;
        match token {
            TokenRef::Native => self
                .provider
                .get_balance(owner)
                .await
                .map_err(|e| ClientError::Rpc(e.to_string())),
            TokenRef::Erc20(token) => Ok(get_token_balance(self.provider(), token, owner).await?),
        }
    }

    async fn get_allowance(
        &self,
        owner: &str,
        spender: &str,
        token: TokenRef,
    ) -> Result<U256, ClientError> {
        let owner = parse_owner(owner)?;
        let spender = parse_owner(spender)?;
        match token {
            TokenRef::Native => Err(ClientError::Decode(
                "the native currency has no allowance".into(),
            )),
            TokenRef::Erc20(token) => {
                Ok(get_token_allowance(self.provider(), token, owner, spender).await?)
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Opens [`EvmRpcClient`]s for one endpoint and chain
#[derive(Debug, Clone)]
pub struct EvmConnector {
    pub rpc_url: String,
    pub chain_id: u64,
}

#[async_trait]
impl Connector for EvmConnector {
    type Client = EvmRpcClient;

    fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    async fn connect(&self) -> Result<EvmRpcClient> {
        EvmRpcClient::new(&self.rpc_url, self.chain_id).await
    }
}

/// Lazily-connected EVM client
pub type EvmSession = Session<EvmConnector>;

impl EvmSession {
    pub fn for_chain(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Session::new(EvmConnector {
            rpc_url: rpc_url.into(),
            chain_id,
        })
    }
}

#[async_trait]
impl EvmChainClient for EvmSession {
    async fn receipt_status(&self, hash: TxHash) -> Result<Option<ReceiptStatus>, ClientError> {
        self.get().await?.receipt_status(hash).await
    }
}

#[async_trait]
impl BalanceQuery for EvmSession {
    async fn get_balance(&self, owner: &str, token: TokenRef) -> Result<U256, ClientError> {
        self.get().await?.get_balance(owner, token).await
    }

    async fn get_allowance(
        &self,
        owner: &str,
        spender: &str,
        token: TokenRef,
    ) -> Result<U256, ClientError> {
        self.get().await?.get_allowance(owner, spender, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner() {
        assert!(parse_owner("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_ok());
        assert!(matches!(
            parse_owner("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"),
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_session_does_not_connect_until_used() {
        let session = EvmSession::for_chain("http://127.0.0.1:1", 11_155_111);
        assert!(!session.is_connected().await);
        assert_eq!(session.connector().chain_id, 11_155_111);
    }
}
