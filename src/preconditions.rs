//! Precondition evaluation
//!
//! Pure decision over a balance/allowance snapshot. Gas and fee checks come
//! before allowance checks: an approval is itself a transaction, so asking
//! for one the user cannot pay for would dead-end them.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::types::{AllowanceState, Balances, Direction, NextAction};

/// Fixed thresholds of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Minimum native gas balance
    pub min_gas_reserve: U256,
    /// Fee-token balance and allowance needed per teleport
    pub fee_requirement: U256,
}

/// Decide the next required action for an attempt.
///
/// `NativeToEvm` has no approval step and only checks the transfer balance.
pub fn evaluate(
    direction: Direction,
    balances: &Balances,
    allowances: &AllowanceState,
    requested: U256,
    thresholds: &Thresholds,
) -> NextAction {
    match direction {
        Direction::NativeToEvm => {
            if balances.transfer_token < requested {
                NextAction::InsufficientBalance
            } else {
                NextAction::Ready
            }
        }
        Direction::EvmToNative => {
            if balances.native_gas < thresholds.min_gas_reserve {
                NextAction::InsufficientGas
            } else if balances.fee_token < thresholds.fee_requirement {
                NextAction::InsufficientFee
            } else if allowances.fee_token < thresholds.fee_requirement {
                NextAction::NeedsFeeTokenApproval
            } else if allowances.transfer_token < requested {
                NextAction::NeedsTransferTokenApproval
            } else if balances.transfer_token < requested {
                NextAction::InsufficientBalance
            } else {
                NextAction::Ready
            }
        }
    }
}

/// Which ERC-20 an approval targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    FeeToken,
    TransferToken,
}

/// The single UI control each [`NextAction`] maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Offer an `approve(spender, amount)` call on `token`
    Approve {
        kind: ApprovalKind,
        token: Address,
        spender: Address,
        amount: U256,
    },
    /// Disable the teleport control with a reason
    Disabled { reason: &'static str },
    /// Enable the teleport control
    Teleport,
}

/// Map an evaluation result to its UI action.
pub fn ui_action(
    action: NextAction,
    transfer_token: Address,
    fee_token: Address,
    gateway: Address,
    requested: U256,
    thresholds: &Thresholds,
) -> UiAction {
    match action {
        NextAction::InsufficientGas => UiAction::Disabled {
            reason: "Not enough ETH to pay for gas",
        },
        NextAction::InsufficientFee => UiAction::Disabled {
            reason: "Not enough fee token to pay the bridge fee",
        },
        NextAction::NeedsFeeTokenApproval => UiAction::Approve {
            kind: ApprovalKind::FeeToken,
            token: fee_token,
            spender: gateway,
            amount: thresholds.fee_requirement,
        },
        NextAction::NeedsTransferTokenApproval => UiAction::Approve {
            kind: ApprovalKind::TransferToken,
            token: transfer_token,
            spender: gateway,
            amount: requested,
        },
        NextAction::InsufficientBalance => UiAction::Disabled {
            reason: "Insufficient balance",
        },
        NextAction::Ready => UiAction::Teleport,
    }
}
