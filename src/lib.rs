//! Teleport-RS: Client-Side Teleport Orchestration
//!
//! Moves one fungible token between a Substrate chain (the native side,
//! `tokenGateway` pallet) and an EVM chain (the token gateway contract):
//!
//! - **Amount & Address Codecs** - Decimal ⇄ 18-decimal integers, SS58 ⇄ gateway bytes32
//! - **Preconditions** - Ordered gas/fee/allowance/balance checks and the UI action for each
//! - **Builder** - Validated requests into pallet call arguments or gateway calldata
//! - **Submitter & Settlement** - Signing boundary, bounded waits, exactly-once outcomes
//! - **Orchestrator** - `attempt_teleport` tying the steps together
//! - **EVM Module** - alloy-backed receipt/balance client and local signer
//! - **Testing Module** - Scripted in-memory collaborators
//!
//! ## Feature Flags
//!
//! - `evm` - Enable the alloy-backed EVM client and signer (default)
//! - `testing` - Enable in-memory collaborators for downstream tests
//! - `full` - Enable all features

// Core modules (always available)
pub mod address_codec;
pub mod amount;
pub mod builder;
pub mod chain;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod preconditions;
pub mod session;
pub mod settlement;
pub mod submitter;
pub mod types;

// Contract bindings are always built; RPC adapters are feature-gated inside
pub mod evm;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used items at the crate root
pub use address_codec::{
    decode_gateway_account, decode_ss58, encode_for_gateway, encode_ss58, parse_evm_recipient,
    GatewayAccount, NativeAccount,
};
pub use amount::{to_canonical, to_display, to_display_full};
pub use builder::{build, validate, EvmCall, EvmTeleportPayload, NativeTeleportPayload, WirePayload};
pub use config::{BridgeConfig, NativeFinality, SettlementConfig};
pub use error::{ClientError, SignerError, TeleportError, WalletError};
pub use orchestrator::{fetch_evm_snapshot, Collaborators, Preflight, TeleportOrchestrator};
pub use preconditions::{evaluate, ApprovalKind, Thresholds, UiAction};
pub use session::{Connector, Session};
pub use settlement::{cancel_pair, CancelHandle, CancelSignal, Settlement, SettlementTracker};
pub use submitter::{Submission, TransferSubmitter};
pub use types::{
    AllowanceState, Balances, Direction, NextAction, PendingTransfer, TeleportOutcome,
    TransferRequest, ValidatedRequest,
};
