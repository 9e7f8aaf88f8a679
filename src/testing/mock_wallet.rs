//! Mock Wallet and Signers
//!
//! Stand-ins for browser wallet extensions. Signers either accept every
//! prompt or decline it the way a user clicking "Reject" would.

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::mock_chains::mock_tx_hash;
use crate::builder::EvmCall;
use crate::chain::{EvmSigner, NativeSigner, SignerHandle, WalletAccount, WalletProvider};
use crate::error::{SignerError, WalletError};

/// Substrate signer for one account
pub struct MockNativeSigner {
    account: String,
    reject: bool,
}

impl MockNativeSigner {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            reject: false,
        }
    }

    /// Signer whose prompt is always cancelled
    pub fn rejecting(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            reject: true,
        }
    }
}

#[async_trait]
impl NativeSigner for MockNativeSigner {
    fn account(&self) -> &str {
        &self.account
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        if self.reject {
            return Err(SignerError::classify("Cancelled"));
        }
        Ok(mock_tx_hash(payload).to_vec())
    }
}

/// EVM signer that records every call it sends
pub struct MockEvmSigner {
    address: Address,
    reject: bool,
    sent: Mutex<Vec<EvmCall>>,
    nonce: AtomicUsize,
}

impl MockEvmSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            reject: false,
            sent: Mutex::new(Vec::new()),
            nonce: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(address: Address) -> Self {
        Self {
            reject: true,
            ..Self::new(address)
        }
    }

    pub fn sent(&self) -> Vec<EvmCall> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EvmSigner for MockEvmSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, call: &EvmCall) -> Result<TxHash, SignerError> {
        if self.reject {
            return Err(SignerError::classify(
                "MetaMask Tx Signature: User denied transaction signature.",
            ));
        }
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst) as u64;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(call.clone());
        }

        let mut preimage = call.data.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        Ok(mock_tx_hash(&preimage))
    }
}

/// Wallet exposing a fixed set of signers
#[derive(Clone, Default)]
pub struct MockWallet {
    /// Keyed by lowercased address
    signers: Arc<Mutex<HashMap<String, (String, SignerHandle)>>>,
    installed: bool,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            signers: Arc::default(),
            installed: true,
        }
    }

    /// No extension present at all
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn with_signer(self, account: impl Into<String>, signer: SignerHandle) -> Self {
        self.add_signer(account, signer);
        self
    }

    pub fn add_signer(&self, account: impl Into<String>, signer: SignerHandle) {
        let account = account.into();
        if let Ok(mut signers) = self.signers.lock() {
            signers.insert(account.to_lowercase(), (account, signer));
        }
    }

    /// Simulate the user locking or detaching the account
    pub fn remove_signer(&self, account: &str) {
        if let Ok(mut signers) = self.signers.lock() {
            signers.remove(&account.to_lowercase());
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn list_accounts(&self) -> Result<Vec<WalletAccount>, WalletError> {
        if !self.installed {
            return Err(WalletError::NoWalletFound);
        }
        let signers = self
            .signers
            .lock()
            .map_err(|_| WalletError::NoWalletFound)?;
        let mut accounts: Vec<WalletAccount> = signers
            .values()
            .map(|(address, handle)| WalletAccount {
                address: address.clone(),
                name: None,
                source: match handle {
                    SignerHandle::Native(_) => "mock-substrate".into(),
                    SignerHandle::Evm(_) => "mock-evm".into(),
                },
            })
            .collect();
        accounts.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(accounts)
    }

    async fn get_signer(&self, account: &str) -> Result<SignerHandle, WalletError> {
        if !self.installed {
            return Err(WalletError::NoWalletFound);
        }
        self.signers
            .lock()
            .ok()
            .and_then(|signers| {
                signers
                    .get(&account.to_lowercase())
                    .map(|(_, handle)| handle.clone())
            })
            .ok_or_else(|| WalletError::NoSigner(account.to_string()))
    }
}
