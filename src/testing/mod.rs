//! Testing Utilities Module
//!
//! In-memory collaborators for driving the orchestrator without a wallet
//! extension or a live node.
//!
//! ## Submodules
//!
//! - `mock_chains` - Scripted native/EVM clients and a static balance service
//! - `mock_wallet` - Wallet provider and accepting/rejecting signers

pub mod mock_chains;
pub mod mock_wallet;

// Re-export commonly used items
pub use mock_chains::*;
pub use mock_wallet::*;
