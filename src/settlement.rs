//! Settlement tracking
//!
//! Watches a submitted transfer until exactly one terminal status: confirmed,
//! failed, timed out, or cancelled. Every wait is bounded by the configured
//! timeout, and a native status subscription is released exactly once on
//! every exit path.

use alloy::primitives::TxHash;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::chain::{EvmChainClient, ExtrinsicStatus, ExtrinsicSubscription, ExtrinsicUpdate};
use crate::config::{NativeFinality, SettlementConfig};
use crate::submitter::{SettlementSource, Submission};
use crate::types::{PendingTransfer, TeleportOutcome};

/// Terminal status of a tracked transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Included (or finalized) without an execution error
    Confirmed { block_hash: Option<String> },
    /// Ledger-reported failure, reason passed through unmodified
    Failed { reason: String },
    /// No terminal status inside the wait window
    TimedOut,
    /// Tracking abandoned by the caller
    Cancelled,
}

impl Settlement {
    pub fn into_outcome(self, pending: &PendingTransfer) -> TeleportOutcome {
        let tx_id = pending.handle_id.clone();
        match self {
            Settlement::Confirmed { .. } => TeleportOutcome::Submitted { tx_id },
            Settlement::Failed { reason } => TeleportOutcome::Failed { tx_id, reason },
            Settlement::TimedOut => TeleportOutcome::TimedOut { tx_id },
            Settlement::Cancelled => TeleportOutcome::Cancelled { tx_id },
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Caller side of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Stop tracking. The outcome becomes `Cancelled` unless a terminal
    /// status was already observed.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Tracker side of a cancellation pair
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                // Handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

// ============================================================================
// Subscription Guard
// ============================================================================

/// Owns a native subscription and unsubscribes exactly once
struct SubscriptionGuard {
    inner: Option<Box<dyn ExtrinsicSubscription>>,
}

impl SubscriptionGuard {
    fn new(subscription: Box<dyn ExtrinsicSubscription>) -> Self {
        Self {
            inner: Some(subscription),
        }
    }

    async fn next_update(&mut self) -> Option<ExtrinsicUpdate> {
        match self.inner.as_mut() {
            Some(sub) => sub.next_update().await,
            None => None,
        }
    }

    fn release(&mut self) {
        if let Some(mut sub) = self.inner.take() {
            sub.unsubscribe();
            debug!(tx_hash = %sub.tx_hash(), "Released extrinsic subscription");
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Resolves submitted transfers to a terminal [`Settlement`]
#[derive(Clone)]
pub struct SettlementTracker {
    config: SettlementConfig,
    evm: Arc<dyn EvmChainClient>,
}

impl SettlementTracker {
    pub fn new(config: SettlementConfig, evm: Arc<dyn EvmChainClient>) -> Self {
        Self { config, evm }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Track `submission` to its terminal status
    pub async fn track(&self, submission: Submission, cancel: CancelSignal) -> TeleportOutcome {
        let Submission { pending, source } = submission;
        let settlement = match source {
            SettlementSource::Native(subscription) => {
                self.track_native(&pending, subscription, cancel).await
            }
            SettlementSource::Evm(hash) => self.track_evm(&pending, hash, cancel).await,
        };

        match &settlement {
            Settlement::Confirmed { block_hash } => info!(
                tx_hash = %pending.handle_id,
                direction = %pending.direction,
                block_hash = ?block_hash,
                "Teleport confirmed"
            ),
            Settlement::Failed { reason } => warn!(
                tx_hash = %pending.handle_id,
                direction = %pending.direction,
                reason = %reason,
                "Teleport failed on chain"
            ),
            Settlement::TimedOut => warn!(
                tx_hash = %pending.handle_id,
                timeout_secs = self.config.timeout.as_secs(),
                "No terminal status before timeout; state unknown"
            ),
            Settlement::Cancelled => info!(
                tx_hash = %pending.handle_id,
                "Settlement tracking cancelled"
            ),
        }

        settlement.into_outcome(&pending)
    }

    /// Follow a native extrinsic subscription
    pub async fn track_native(
        &self,
        pending: &PendingTransfer,
        subscription: Box<dyn ExtrinsicSubscription>,
        mut cancel: CancelSignal,
    ) -> Settlement {
        let mut guard = SubscriptionGuard::new(subscription);
        let deadline = sleep(self.config.timeout);
        tokio::pin!(deadline);

        let settlement = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Settlement::Cancelled,
                _ = &mut deadline => break Settlement::TimedOut,
                update = guard.next_update() => {
                    let Some(update) = update else {
                        warn!(tx_hash = %pending.handle_id, "Extrinsic subscription closed early");
                        break Settlement::TimedOut;
                    };
                    if let Some(settlement) = self.resolve_native(pending, update) {
                        break settlement;
                    }
                }
            }
        };

        guard.release();
        settlement
    }

    /// Terminal settlement for an update, or `None` to keep waiting
    fn resolve_native(&self, pending: &PendingTransfer, update: ExtrinsicUpdate) -> Option<Settlement> {
        let ExtrinsicUpdate {
            status,
            dispatch_error,
        } = update;

        match status {
            ExtrinsicStatus::InBlock(_) | ExtrinsicStatus::Finalized(_)
                if dispatch_error.is_some() =>
            {
                Some(Settlement::Failed {
                    reason: dispatch_error.unwrap_or_default(),
                })
            }
            ExtrinsicStatus::InBlock(hash) => {
                debug!(tx_hash = %pending.handle_id, block_hash = %hash, "Extrinsic in block");
                match self.config.native_finality {
                    NativeFinality::InBlock => Some(Settlement::Confirmed {
                        block_hash: Some(hash),
                    }),
                    NativeFinality::Finalized => None,
                }
            }
            ExtrinsicStatus::Finalized(hash) => Some(Settlement::Confirmed {
                block_hash: Some(hash),
            }),
            ExtrinsicStatus::Dropped => Some(Settlement::Failed {
                reason: "extrinsic dropped from the pool".into(),
            }),
            ExtrinsicStatus::Invalid => Some(Settlement::Failed {
                reason: "extrinsic invalid".into(),
            }),
            ExtrinsicStatus::Usurped(by) => Some(Settlement::Failed {
                reason: format!("extrinsic usurped by {}", by),
            }),
            ExtrinsicStatus::Ready | ExtrinsicStatus::Broadcast => {
                debug!(tx_hash = %pending.handle_id, status = ?status, "Extrinsic pending");
                None
            }
        }
    }

    /// Poll an EVM transaction receipt
    pub async fn track_evm(
        &self,
        pending: &PendingTransfer,
        hash: TxHash,
        mut cancel: CancelSignal,
    ) -> Settlement {
        let deadline = sleep(self.config.timeout);
        tokio::pin!(deadline);
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let poll = async {
                ticker.tick().await;
                self.evm.receipt_status(hash).await
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Settlement::Cancelled,
                _ = &mut deadline => return Settlement::TimedOut,
                status = poll => match status {
                    Ok(Some(receipt)) if receipt.success => {
                        return Settlement::Confirmed {
                            block_hash: receipt.block_hash.map(|h| format!("{:#x}", h)),
                        };
                    }
                    Ok(Some(_)) => {
                        return Settlement::Failed {
                            reason: "transaction reverted".into(),
                        };
                    }
                    Ok(None) => debug!(tx_hash = %pending.handle_id, "Receipt not available yet"),
                    Err(e) => warn!(
                        tx_hash = %pending.handle_id,
                        error = %e,
                        "Receipt query failed, retrying"
                    ),
                },
            }
        }
    }
}
