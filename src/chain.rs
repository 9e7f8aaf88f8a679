//! Consumed collaborators
//!
//! Wallet discovery, signing, chain transport and balance queries live
//! outside this crate. The orchestrator talks to them only through these
//! traits, held as `Arc<dyn …>` so callers own the concrete clients.

use alloy::primitives::{Address, TxHash, B256, U256};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::builder::{EvmCall, NativeTeleportPayload};
use crate::error::{ClientError, SignerError, WalletError};

// ============================================================================
// Wallet
// ============================================================================

/// An account exposed by a wallet extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub address: String,
    pub name: Option<String>,
    /// Extension the account comes from (e.g. "talisman", "metamask")
    pub source: String,
}

/// Signer attached to a wallet account
#[derive(Clone)]
pub enum SignerHandle {
    Native(Arc<dyn NativeSigner>),
    Evm(Arc<dyn EvmSigner>),
}

impl fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerHandle::Native(s) => f.debug_tuple("Native").field(&s.account()).finish(),
            SignerHandle::Evm(s) => f.debug_tuple("Evm").field(&s.address()).finish(),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts the user has exposed to this application
    async fn list_accounts(&self) -> Result<Vec<WalletAccount>, WalletError>;

    /// Signer for `account`; fails when the extension is absent or locked
    async fn get_signer(&self, account: &str) -> Result<SignerHandle, WalletError>;
}

// ============================================================================
// Signers
// ============================================================================

/// Opaque Substrate signer (browser extension, hardware wallet, …)
#[async_trait]
pub trait NativeSigner: Send + Sync {
    /// SS58 address of the signing account
    fn account(&self) -> &str;

    /// Sign an extrinsic signing payload
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// Opaque EVM signer that can send a transaction on the user's behalf
#[async_trait]
pub trait EvmSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign and broadcast `call`, returning its hash without waiting
    async fn send_transaction(&self, call: &EvmCall) -> Result<TxHash, SignerError>;
}

// ============================================================================
// Native Chain
// ============================================================================

/// Transaction pool status of a watched extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtrinsicStatus {
    Ready,
    Broadcast,
    InBlock(String),
    Finalized(String),
    /// Removed from the pool without inclusion
    Dropped,
    /// Rejected by the pool
    Invalid,
    /// Replaced by another extrinsic with the same nonce
    Usurped(String),
}

/// One notification from an extrinsic subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtrinsicUpdate {
    pub status: ExtrinsicStatus,
    /// Raw dispatch error, present when execution failed in a block
    pub dispatch_error: Option<String>,
}

impl ExtrinsicUpdate {
    pub fn status(status: ExtrinsicStatus) -> Self {
        Self {
            status,
            dispatch_error: None,
        }
    }

    pub fn failed(status: ExtrinsicStatus, dispatch_error: impl Into<String>) -> Self {
        Self {
            status,
            dispatch_error: Some(dispatch_error.into()),
        }
    }
}

/// Live status stream of one submitted extrinsic
#[async_trait]
pub trait ExtrinsicSubscription: Send {
    /// Hash of the submitted extrinsic (0x-hex)
    fn tx_hash(&self) -> String;

    /// Next status update; `None` once the stream has closed
    async fn next_update(&mut self) -> Option<ExtrinsicUpdate>;

    /// Release the underlying subscription
    fn unsubscribe(&mut self);
}

#[async_trait]
pub trait NativeChainClient: Send + Sync {
    /// Sign `payload` with `signer` and submit it, watching its status
    async fn submit_extrinsic(
        &self,
        payload: &NativeTeleportPayload,
        signer: &dyn NativeSigner,
    ) -> Result<Box<dyn ExtrinsicSubscription>, SignerError>;
}

// ============================================================================
// EVM Chain
// ============================================================================

/// Outcome recorded in a mined transaction's receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptStatus {
    pub success: bool,
    pub block_hash: Option<B256>,
}

#[async_trait]
pub trait EvmChainClient: Send + Sync {
    /// Send a contract call through `signer`
    async fn send_contract_call(
        &self,
        call: &EvmCall,
        signer: &dyn EvmSigner,
    ) -> Result<TxHash, SignerError> {
        signer.send_transaction(call).await
    }

    /// Receipt status, or `None` while the transaction is still pending
    async fn receipt_status(&self, hash: TxHash) -> Result<Option<ReceiptStatus>, ClientError>;
}

// ============================================================================
// Balance Queries
// ============================================================================

/// Asset a balance is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRef {
    /// The chain's native currency (gas token)
    Native,
    Erc20(Address),
}

#[async_trait]
pub trait BalanceQuery: Send + Sync {
    async fn get_balance(&self, owner: &str, token: TokenRef) -> Result<U256, ClientError>;

    async fn get_allowance(
        &self,
        owner: &str,
        spender: &str,
        token: TokenRef,
    ) -> Result<U256, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockEvmClient, MockEvmSigner, MockWallet};
    use alloy::primitives::Bytes;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_default_send_delegates_to_signer() {
        let client = MockEvmClient::new();
        let signer = MockEvmSigner::new(Address::repeat_byte(0x01));
        let call = EvmCall {
            to: Address::repeat_byte(0x02),
            data: Bytes::from(vec![0x01, 0x02]),
            value: U256::ZERO,
        };

        assert_ok!(block_on(client.send_contract_call(&call, &signer)));
        assert_eq!(signer.sent(), vec![call.clone()]);

        let rejecting = MockEvmSigner::rejecting(Address::repeat_byte(0x01));
        let err = assert_err!(block_on(client.send_contract_call(&call, &rejecting)));
        assert!(matches!(err, SignerError::Rejected(_)));
    }

    #[test]
    fn test_signer_handle_debug_names_account() {
        let wallet = MockWallet::new().with_signer(
            "0x0101010101010101010101010101010101010101",
            SignerHandle::Evm(Arc::new(MockEvmSigner::new(Address::repeat_byte(0x01)))),
        );
        let handle = assert_ok!(block_on(
            wallet.get_signer("0x0101010101010101010101010101010101010101")
        ));
        assert!(format!("{:?}", handle).starts_with("Evm("));

        let missing = MockWallet::missing();
        assert_eq!(
            assert_err!(block_on(missing.list_accounts())),
            WalletError::NoWalletFound
        );
    }
}
