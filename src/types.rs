//! Common types for teleport attempts
//!
//! A [`TransferRequest`] is created per user submission, validated into a
//! [`ValidatedRequest`], and ends in exactly one [`TeleportOutcome`].

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use crate::address_codec::GatewayAccount;
use crate::error::TeleportError;

// ============================================================================
// Direction
// ============================================================================

/// Which way tokens move. Fixed for the lifetime of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Substrate chain → EVM chain (pallet `tokenGateway.teleport`)
    NativeToEvm,
    /// EVM chain → Substrate chain (gateway contract `teleport`)
    EvmToNative,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::NativeToEvm => "native_to_evm",
            Direction::EvmToNative => "evm_to_native",
        }
    }

    /// Whether the source side needs ERC-20 allowances before transferring
    pub fn requires_approval(&self) -> bool {
        matches!(self, Direction::EvmToNative)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Raw request as entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// SS58 address (NativeToEvm) or 0x address (EvmToNative) of the sender
    pub source_account: String,
    /// 0x address (NativeToEvm) or SS58 address (EvmToNative) of the receiver
    pub destination_address: String,
    /// Decimal amount, e.g. "1.5"
    pub amount: String,
}

impl TransferRequest {
    pub fn new(
        source_account: impl Into<String>,
        destination_address: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            source_account: source_account.into(),
            destination_address: destination_address.into(),
            amount: amount.into(),
        }
    }
}

/// Destination after decoding, shaped by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// 20-byte EVM recipient, kept verbatim
    Evm(Address),
    /// Substrate account packed for the gateway
    Native(GatewayAccount),
}

/// Sender after decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceAccount {
    /// SS58 string as handed to the wallet
    Native(String),
    Evm(Address),
}

impl SourceAccount {
    /// Account string the wallet provider knows the signer by
    pub fn wallet_key(&self) -> String {
        match self {
            SourceAccount::Native(address) => address.clone(),
            SourceAccount::Evm(address) => address.to_checksum(None),
        }
    }
}

/// Request that passed amount and address validation. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub direction: Direction,
    pub source: SourceAccount,
    pub destination: Destination,
    /// Amount in the token's smallest unit
    pub amount: U256,
}

// ============================================================================
// Precondition Snapshot
// ============================================================================

/// Balances relevant to one attempt, read fresh before evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances {
    /// Native gas balance on the source chain (wei on the EVM side)
    pub native_gas: U256,
    /// Fee-token balance (EVM side only)
    pub fee_token: U256,
    /// Balance of the token being teleported
    pub transfer_token: U256,
}

/// ERC-20 allowances granted to the gateway. A snapshot that may already be
/// stale; only valid for the evaluation it was fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllowanceState {
    pub transfer_token: U256,
    pub fee_token: U256,
}

/// The next thing the user has to do before a teleport can go out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    InsufficientGas,
    InsufficientFee,
    NeedsFeeTokenApproval,
    NeedsTransferTokenApproval,
    InsufficientBalance,
    Ready,
}

impl NextAction {
    pub fn is_ready(&self) -> bool {
        matches!(self, NextAction::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::InsufficientGas => "insufficient_gas",
            NextAction::InsufficientFee => "insufficient_fee",
            NextAction::NeedsFeeTokenApproval => "needs_fee_token_approval",
            NextAction::NeedsTransferTokenApproval => "needs_transfer_token_approval",
            NextAction::InsufficientBalance => "insufficient_balance",
            NextAction::Ready => "ready",
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Submission & Outcome
// ============================================================================

/// Handle for a submitted transfer, owned by the settlement tracker until
/// it resolves. Lives in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    /// Extrinsic hash or EVM transaction hash (0x-hex)
    pub handle_id: String,
    pub direction: Direction,
    pub submitted_at: SystemTime,
}

/// Terminal result of one attempt. Returned exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TeleportOutcome {
    /// Included with no execution error
    Submitted { tx_id: String },
    /// Ledger reported an execution failure; reason is passed through as-is
    Failed { tx_id: String, reason: String },
    /// No terminal status inside the wait window. Re-query chain state.
    TimedOut { tx_id: String },
    /// Caller abandoned tracking before a terminal status
    Cancelled { tx_id: String },
    /// A precondition is unmet; nothing was submitted
    ActionRequired { action: NextAction },
    /// Validation or signer-boundary failure; nothing was settled
    Rejected { error: TeleportError },
}

impl TeleportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TeleportOutcome::Submitted { .. })
    }

    /// Transaction id, if anything reached the network
    pub fn tx_id(&self) -> Option<&str> {
        match self {
            TeleportOutcome::Submitted { tx_id }
            | TeleportOutcome::Failed { tx_id, .. }
            | TeleportOutcome::TimedOut { tx_id }
            | TeleportOutcome::Cancelled { tx_id } => Some(tx_id),
            TeleportOutcome::ActionRequired { .. } | TeleportOutcome::Rejected { .. } => None,
        }
    }
}

impl From<TeleportError> for TeleportOutcome {
    fn from(error: TeleportError) -> Self {
        TeleportOutcome::Rejected { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&Direction::EvmToNative).unwrap();
        assert_eq!(json, "\"evm_to_native\"");
        assert!(Direction::EvmToNative.requires_approval());
        assert!(!Direction::NativeToEvm.requires_approval());
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = TeleportOutcome::ActionRequired {
            action: NextAction::NeedsFeeTokenApproval,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "action_required");
        assert_eq!(json["action"], "needs_fee_token_approval");

        let outcome: TeleportOutcome = TeleportError::UserRejected.into();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["error"]["kind"], "UserRejected");
    }

    #[test]
    fn test_outcome_tx_id() {
        let outcome = TeleportOutcome::TimedOut {
            tx_id: "0xabc".into(),
        };
        assert_eq!(outcome.tx_id(), Some("0xabc"));
        assert!(!outcome.is_success());

        let outcome = TeleportOutcome::ActionRequired {
            action: NextAction::Ready,
        };
        assert_eq!(outcome.tx_id(), None);
    }
}
