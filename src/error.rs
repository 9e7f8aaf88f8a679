//! Error taxonomy for teleport attempts
//!
//! Every failure is attempt-scoped. Local validation and signer-boundary
//! failures are [`TeleportError`]s, carried back to the caller inside
//! [`crate::types::TeleportOutcome::Rejected`] rather than propagated as
//! errors out of the orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that end an attempt before (or at) submission
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum TeleportError {
    /// Amount string is not a non-negative decimal, or is zero/too large
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Address could not be decoded (format, checksum or length)
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Request shape does not fit the direction or the deployment config
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No signer attached: wallet missing, locked or disconnected
    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),

    /// The user declined the signing prompt
    #[error("user rejected the request")]
    UserRejected,

    /// Balance/allowance lookup failed, so preconditions cannot be judged
    #[error("state query failed: {0}")]
    QueryFailed(String),

    /// Signed transaction could not be handed to the network
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

/// Errors reported by a signer (wallet extension or local key)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// Signing prompt was cancelled by the user
    #[error("signing rejected by user: {0}")]
    Rejected(String),

    /// Signer cannot be reached (locked wallet, detached extension)
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    /// Anything else between the signer and the node
    #[error("transport error: {0}")]
    Transport(String),
}

impl SignerError {
    /// Classify a raw wallet/RPC error message.
    ///
    /// EIP-1193 wallets report a declined prompt as a JSON error with code
    /// 4001; Substrate extensions return "Cancelled" or "Rejected by user".
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_user_rejection(&message) {
            return SignerError::Rejected(message);
        }

        let lower = message.to_lowercase();
        if lower.contains("locked") || lower.contains("no signer") {
            SignerError::Unavailable(message)
        } else {
            SignerError::Transport(message)
        }
    }
}

/// JSON-RPC error code for a request the user declined (EIP-1193)
pub const USER_REJECTED_CODE: i64 = 4001;

const REJECTION_PHRASES: &[&str] = &["user rejected", "user denied", "rejected by user"];

fn is_user_rejection(message: &str) -> bool {
    let trimmed = message.trim();
    if trimmed == "Cancelled" {
        return true;
    }

    if let Ok(serde_json::Value::Object(payload)) = serde_json::from_str(trimmed) {
        if payload.get("code").and_then(serde_json::Value::as_i64) == Some(USER_REJECTED_CODE) {
            return true;
        }
    }

    let lower = trimmed.to_lowercase();
    REJECTION_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

impl From<SignerError> for TeleportError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Rejected(_) => TeleportError::UserRejected,
            SignerError::Unavailable(reason) => TeleportError::SignerUnavailable(reason),
            SignerError::Transport(reason) => TeleportError::SubmissionFailed(reason),
        }
    }
}

/// Errors from the wallet/account provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet extension found")]
    NoWalletFound,

    #[error("no signer for account {0}")]
    NoSigner(String),
}

impl From<WalletError> for TeleportError {
    fn from(err: WalletError) -> Self {
        TeleportError::SignerUnavailable(err.to_string())
    }
}

/// Errors from chain clients and query services
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("not connected: {0}")]
    NotConnected(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<eyre::Report> for ClientError {
    fn from(err: eyre::Report) -> Self {
        ClientError::Rpc(format!("{:#}", err))
    }
}
