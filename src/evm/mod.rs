//! EVM Chain Support Module
//!
//! ## Submodules
//!
//! - `contracts` - Token gateway and ERC-20 bindings using alloy sol! macro
//! - `client` - JSON-RPC client implementing receipt and balance queries (`evm`)
//! - `signer` - Local private-key signer (`evm`)
//! - `tokens` - ERC-20 read helpers (`evm`)

pub mod contracts;

#[cfg(feature = "evm")]
pub mod client;
#[cfg(feature = "evm")]
pub mod signer;
#[cfg(feature = "evm")]
pub mod tokens;

// Re-export commonly used items
pub use contracts::{TokenGateway, ERC20};

#[cfg(feature = "evm")]
pub use client::{EvmConnector, EvmRpcClient, EvmSession};
#[cfg(feature = "evm")]
pub use signer::LocalEvmSigner;
