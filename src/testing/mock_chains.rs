//! Scripted Chain Clients
//!
//! In-memory native and EVM clients plus a static balance service. State is
//! shared behind `Arc`, so a clone handed to the orchestrator and the copy
//! kept by the test observe the same counters.

use alloy::primitives::{keccak256, Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::builder::NativeTeleportPayload;
use crate::chain::{
    BalanceQuery, EvmChainClient, ExtrinsicSubscription, ExtrinsicUpdate, NativeChainClient,
    NativeSigner, ReceiptStatus, TokenRef,
};
use crate::error::{ClientError, SignerError};

// ============================================================================
// Native
// ============================================================================

/// Subscription replaying a fixed list of updates
pub struct ScriptedSubscription {
    tx_hash: String,
    updates: VecDeque<ExtrinsicUpdate>,
    /// Stay silent after the script instead of closing
    hang: bool,
    releases: Arc<AtomicUsize>,
}

impl ScriptedSubscription {
    pub fn new(tx_hash: impl Into<String>, updates: Vec<ExtrinsicUpdate>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            updates: updates.into(),
            hang: false,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Never close after the scripted updates
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Counter of `unsubscribe` calls
    pub fn releases(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    fn with_release_counter(mut self, releases: Arc<AtomicUsize>) -> Self {
        self.releases = releases;
        self
    }
}

#[async_trait]
impl ExtrinsicSubscription for ScriptedSubscription {
    fn tx_hash(&self) -> String {
        self.tx_hash.clone()
    }

    async fn next_update(&mut self) -> Option<ExtrinsicUpdate> {
        match self.updates.pop_front() {
            Some(update) => Some(update),
            None if self.hang => std::future::pending().await,
            None => None,
        }
    }

    fn unsubscribe(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Native client that signs through the given signer and replays a script
#[derive(Clone)]
pub struct MockNativeClient {
    tx_hash: String,
    updates: Vec<ExtrinsicUpdate>,
    hang: bool,
    submissions: Arc<Mutex<Vec<NativeTeleportPayload>>>,
    releases: Arc<AtomicUsize>,
}

impl MockNativeClient {
    pub fn new() -> Self {
        Self {
            tx_hash: format!("{:#x}", TxHash::repeat_byte(0xee)),
            updates: Vec::new(),
            hang: false,
            submissions: Arc::new(Mutex::new(Vec::new())),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = tx_hash.into();
        self
    }

    /// Updates every submitted extrinsic will report
    pub fn with_updates(mut self, updates: Vec<ExtrinsicUpdate>) -> Self {
        self.updates = updates;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Number of extrinsics submitted
    pub fn submissions(&self) -> usize {
        self.submissions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Payloads submitted so far
    pub fn submitted(&self) -> Vec<NativeTeleportPayload> {
        self.submissions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Total `unsubscribe` calls across all subscriptions
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Default for MockNativeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NativeChainClient for MockNativeClient {
    async fn submit_extrinsic(
        &self,
        payload: &NativeTeleportPayload,
        signer: &dyn NativeSigner,
    ) -> Result<Box<dyn ExtrinsicSubscription>, SignerError> {
        let call = payload.call_args().to_string();
        signer.sign(call.as_bytes()).await?;

        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push(payload.clone());
        }

        let mut subscription = ScriptedSubscription::new(self.tx_hash.clone(), self.updates.clone())
            .with_release_counter(Arc::clone(&self.releases));
        if self.hang {
            subscription = subscription.hanging();
        }
        Ok(Box::new(subscription))
    }
}

// ============================================================================
// EVM
// ============================================================================

/// EVM client answering receipt polls from a script.
///
/// Once the script runs out every poll reports the transaction as pending.
#[derive(Clone, Default)]
pub struct MockEvmClient {
    receipts: Arc<Mutex<VecDeque<Result<Option<ReceiptStatus>, ClientError>>>>,
    polls: Arc<AtomicUsize>,
}

impl MockEvmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receipts(self, receipts: Vec<Result<Option<ReceiptStatus>, ClientError>>) -> Self {
        self.push_receipts(receipts);
        self
    }

    /// Queue more receipts on a client that is already shared
    pub fn push_receipts(&self, receipts: Vec<Result<Option<ReceiptStatus>, ClientError>>) {
        if let Ok(mut queue) = self.receipts.lock() {
            queue.extend(receipts);
        }
    }

    /// Receipt reported once the transaction is mined
    pub fn mined(success: bool) -> Self {
        Self::new().with_receipts(vec![Ok(Some(ReceiptStatus {
            success,
            block_hash: None,
        }))])
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvmChainClient for MockEvmClient {
    async fn receipt_status(&self, _hash: TxHash) -> Result<Option<ReceiptStatus>, ClientError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.receipts
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(Ok(None))
    }
}

/// Deterministic hash for a mock EVM transaction
pub fn mock_tx_hash(data: &[u8]) -> TxHash {
    keccak256(data)
}

// ============================================================================
// Balances
// ============================================================================

/// Balance service backed by fixed maps, mutable between evaluations
#[derive(Clone, Default)]
pub struct StaticBalances {
    balances: Arc<Mutex<HashMap<TokenRef, U256>>>,
    allowances: Arc<Mutex<HashMap<TokenRef, U256>>>,
    fail: Option<String>,
    queries: Arc<AtomicUsize>,
}

impl StaticBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query fails with an RPC error
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_balance(self, token: TokenRef, amount: U256) -> Self {
        self.set_balance(token, amount);
        self
    }

    pub fn with_allowance(self, token: Address, amount: U256) -> Self {
        self.set_allowance(token, amount);
        self
    }

    pub fn set_balance(&self, token: TokenRef, amount: U256) {
        if let Ok(mut map) = self.balances.lock() {
            map.insert(token, amount);
        }
    }

    pub fn set_allowance(&self, token: Address, amount: U256) {
        if let Ok(mut map) = self.allowances.lock() {
            map.insert(TokenRef::Erc20(token), amount);
        }
    }

    /// Number of balance and allowance lookups served
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn lookup(
        &self,
        map: &Mutex<HashMap<TokenRef, U256>>,
        token: TokenRef,
    ) -> Result<U256, ClientError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail {
            return Err(ClientError::Rpc(reason.clone()));
        }
        Ok(map
            .lock()
            .ok()
            .and_then(|m| m.get(&token).copied())
            .unwrap_or(U256::ZERO))
    }
}

#[async_trait]
impl BalanceQuery for StaticBalances {
    async fn get_balance(&self, _owner: &str, token: TokenRef) -> Result<U256, ClientError> {
        self.lookup(&self.balances, token)
    }

    async fn get_allowance(
        &self,
        _owner: &str,
        _spender: &str,
        token: TokenRef,
    ) -> Result<U256, ClientError> {
        self.lookup(&self.allowances, token)
    }
}
