//! Local EVM Signer
//!
//! Private-key signer for scripts and integration tests, standing in for a
//! browser wallet. Builds a filler-backed provider per transaction so nonce,
//! gas and fees are filled by the node.

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, TxHash},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::{RpcError, TransportError},
};
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::fmt;
use tracing::{debug, info};
use url::Url;

use crate::builder::EvmCall;
use crate::chain::EvmSigner;
use crate::error::{SignerError, USER_REJECTED_CODE};

/// EVM signer backed by a private key held in memory
pub struct LocalEvmSigner {
    signer: PrivateKeySigner,
    rpc_url: Url,
    chain_id: u64,
}

impl fmt::Debug for LocalEvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEvmSigner")
            .field("address", &self.signer.address())
            .field("rpc_url", &self.rpc_url.as_str())
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl LocalEvmSigner {
    /// Create from a hex private key (with or without 0x prefix)
    pub fn from_private_key(rpc_url: &str, chain_id: u64, private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .wrap_err("Invalid private key")?;
        let rpc_url = Url::parse(rpc_url).wrap_err("Invalid RPC URL")?;

        info!(
            address = %signer.address(),
            chain_id = chain_id,
            "EVM signer initialized"
        );

        Ok(Self {
            signer,
            rpc_url,
            chain_id,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn request(&self, call: &EvmCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.signer.address())
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value)
            .with_chain_id(self.chain_id)
    }
}

#[async_trait]
impl EvmSigner for LocalEvmSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn send_transaction(&self, call: &EvmCall) -> Result<TxHash, SignerError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.clone());

        debug!(to = %call.to, value = %call.value, "Sending EVM transaction");

        let pending = provider
            .send_transaction(self.request(call))
            .await
            .map_err(classify_rpc_error)?;

        Ok(*pending.tx_hash())
    }
}

/// Node error responses are classified by JSON-RPC code first; transport
/// failures never count as a user rejection.
fn classify_rpc_error(err: TransportError) -> SignerError {
    match &err {
        RpcError::ErrorResp(payload) if payload.code == USER_REJECTED_CODE => {
            SignerError::Rejected(payload.message.to_string())
        }
        RpcError::ErrorResp(_) => SignerError::classify(err.to_string()),
        _ => SignerError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, U256};

    // Well-known anvil/hardhat account #0
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_address_from_key() {
        let signer =
            LocalEvmSigner::from_private_key("http://localhost:8545", 31337, TEST_KEY).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let signer =
            LocalEvmSigner::from_private_key("http://localhost:8545", 31337, TEST_KEY).unwrap();
        let debug = format!("{:?}", signer);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("ac0974"));
    }

    #[test]
    fn test_request_fields() {
        let signer =
            LocalEvmSigner::from_private_key("http://localhost:8545", 31337, TEST_KEY).unwrap();
        let call = EvmCall {
            to: Address::repeat_byte(0x33),
            data: Bytes::from(vec![0xde, 0xad]),
            value: U256::ZERO,
        };
        let request = signer.request(&call);
        assert_eq!(request.from, Some(signer.address()));
        assert_eq!(request.chain_id, Some(31337));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(LocalEvmSigner::from_private_key("http://localhost:8545", 1, "0x1234").is_err());
        assert!(LocalEvmSigner::from_private_key("not a url", 1, TEST_KEY).is_err());
    }

    #[test]
    fn test_classify_rpc_error_uses_code() {
        let declined = RpcError::ErrorResp(
            serde_json::from_str(r#"{"code":4001,"message":"Request declined"}"#).unwrap(),
        );
        assert_eq!(
            classify_rpc_error(declined),
            SignerError::Rejected("Request declined".into())
        );

        let reverted = RpcError::ErrorResp(
            serde_json::from_str(r#"{"code":3,"message":"execution reverted"}"#).unwrap(),
        );
        assert!(matches!(
            classify_rpc_error(reverted),
            SignerError::Transport(_)
        ));
    }

    #[test]
    fn test_transport_failures_are_not_rejections() {
        let err = alloy::transports::TransportErrorKind::custom_str(
            "error sending request for url (http://127.0.0.1:14001/): operation was canceled",
        );
        assert!(matches!(classify_rpc_error(err), SignerError::Transport(_)));
    }
}
