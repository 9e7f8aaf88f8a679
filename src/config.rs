//! Deployment configuration
//!
//! Constants the builder and evaluator depend on, plus settlement tuning.
//! Defaults are the zkVerify Volta ⇄ Ethereum Sepolia deployment.

use alloy::primitives::{address, Address, B256, U256};
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// zkVerify Volta RPC endpoint
pub const DEFAULT_NATIVE_WS_URL: &str = "wss://volta-rpc.zkverify.io";

/// Public Sepolia RPC endpoint
pub const DEFAULT_EVM_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Ethereum Sepolia chain id
pub const DEFAULT_EVM_CHAIN_ID: u64 = 11_155_111;

/// Token gateway contract on Sepolia
pub const DEFAULT_GATEWAY_ADDRESS: Address = address!("FcDa26cA021d5535C3059547390E6cCd8De7acA6");

/// Asset id of tVFY in the `tokenGateway` pallet
pub const DEFAULT_NATIVE_ASSET_ID: u32 = 0;

/// State machine id of the Substrate chain as seen from the gateway
pub const DEFAULT_NATIVE_STATE_MACHINE: &str = "SUBSTRATE-zkv_";

/// 0.001 ETH, enough for an approval or a teleport on Sepolia
pub const DEFAULT_MIN_GAS_RESERVE_WEI: u128 = 1_000_000_000_000_000;

/// One fee token (18 decimals)
pub const DEFAULT_FEE_REQUIREMENT: u128 = 1_000_000_000_000_000_000;

/// Hard ceiling on waiting for a terminal status
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(180);

/// Receipt poll interval on the EVM side
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Which native status counts as confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFinality {
    /// Resolve as soon as the extrinsic is in a block
    InBlock,
    /// Wait for the block to be finalized
    Finalized,
}

impl FromStr for NativeFinality {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_block" | "inblock" => Ok(NativeFinality::InBlock),
            "finalized" => Ok(NativeFinality::Finalized),
            other => Err(eyre!("Unknown finality mode: {}", other)),
        }
    }
}

/// Settlement tracker tuning
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Maximum time to wait for a terminal status
    pub timeout: Duration,
    /// Interval between EVM receipt polls
    pub poll_interval: Duration,
    /// Native status treated as confirmation
    pub native_finality: NativeFinality,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SETTLEMENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            native_finality: NativeFinality::Finalized,
        }
    }
}

/// Bridge deployment configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Substrate node websocket endpoint
    pub native_ws_url: String,
    /// Required SS58 prefix for native destinations (None accepts any)
    pub ss58_prefix: Option<u16>,

    /// EVM JSON-RPC endpoint
    pub evm_rpc_url: String,
    /// Destination chain identifier for NativeToEvm teleports
    pub evm_chain_id: u64,
    /// Token gateway contract
    pub gateway_address: Address,

    /// Asset id of the teleported token in the pallet
    pub native_asset_id: u32,
    /// Asset id of the teleported token in the gateway contract
    pub evm_asset_id: B256,
    /// Destination state machine id passed as `dest` to the gateway
    pub native_state_machine: String,

    /// ERC-20 representation of the teleported token
    pub transfer_token: Option<Address>,
    /// ERC-20 used to pay relayer/protocol fees
    pub fee_token: Option<Address>,

    /// Minimum native gas balance before any EVM transaction
    pub min_gas_reserve: U256,
    /// Fee-token balance and allowance required for a teleport
    pub fee_requirement: U256,

    pub settlement: SettlementConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            native_ws_url: DEFAULT_NATIVE_WS_URL.to_string(),
            ss58_prefix: None,
            evm_rpc_url: DEFAULT_EVM_RPC_URL.to_string(),
            evm_chain_id: DEFAULT_EVM_CHAIN_ID,
            gateway_address: DEFAULT_GATEWAY_ADDRESS,
            native_asset_id: DEFAULT_NATIVE_ASSET_ID,
            evm_asset_id: B256::ZERO,
            native_state_machine: DEFAULT_NATIVE_STATE_MACHINE.to_string(),
            transfer_token: None,
            fee_token: None,
            min_gas_reserve: U256::from(DEFAULT_MIN_GAS_RESERVE_WEI),
            fee_requirement: U256::from(DEFAULT_FEE_REQUIREMENT),
            settlement: SettlementConfig::default(),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| eyre!("Invalid {}: {} ({})", name, raw, e))
        })
        .transpose()
}

fn parse_url(name: &str, raw: String, schemes: &[&str]) -> Result<String> {
    let url = Url::parse(&raw).wrap_err_with(|| format!("Invalid {}", name))?;
    if !schemes.contains(&url.scheme()) {
        return Err(eyre!(
            "Invalid {}: scheme '{}' not one of {:?}",
            name,
            url.scheme(),
            schemes
        ));
    }
    Ok(raw)
}

impl BridgeConfig {
    /// Load configuration from `.env` and the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }
        Self::from_env()
    }

    /// Build configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let native_ws_url = match optional_var("NATIVE_WS_URL") {
            Some(raw) => parse_url("NATIVE_WS_URL", raw, &["ws", "wss"])?,
            None => defaults.native_ws_url,
        };
        let evm_rpc_url = match optional_var("EVM_RPC_URL") {
            Some(raw) => parse_url("EVM_RPC_URL", raw, &["http", "https"])?,
            None => defaults.evm_rpc_url,
        };

        let settlement = SettlementConfig {
            timeout: parse_var::<u64>("SETTLEMENT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.settlement.timeout),
            poll_interval: parse_var::<u64>("SETTLEMENT_POLL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.settlement.poll_interval),
            native_finality: parse_var::<NativeFinality>("NATIVE_FINALITY")?
                .unwrap_or(defaults.settlement.native_finality),
        };

        if settlement.timeout.is_zero() {
            return Err(eyre!("SETTLEMENT_TIMEOUT_SECS must be greater than zero"));
        }
        if settlement.poll_interval.is_zero() {
            return Err(eyre!("SETTLEMENT_POLL_MS must be greater than zero"));
        }

        Ok(Self {
            native_ws_url,
            ss58_prefix: parse_var("NATIVE_SS58_PREFIX")?,
            evm_rpc_url,
            evm_chain_id: parse_var("EVM_CHAIN_ID")?.unwrap_or(defaults.evm_chain_id),
            gateway_address: parse_var("TOKEN_GATEWAY_ADDRESS")?
                .unwrap_or(defaults.gateway_address),
            native_asset_id: parse_var("NATIVE_ASSET_ID")?.unwrap_or(defaults.native_asset_id),
            evm_asset_id: parse_var("EVM_ASSET_ID")?.unwrap_or(defaults.evm_asset_id),
            native_state_machine: optional_var("NATIVE_STATE_MACHINE")
                .unwrap_or(defaults.native_state_machine),
            transfer_token: parse_var("EVM_TRANSFER_TOKEN")?,
            fee_token: parse_var("EVM_FEE_TOKEN")?,
            min_gas_reserve: parse_var("MIN_GAS_RESERVE_WEI")?
                .unwrap_or(defaults.min_gas_reserve),
            fee_requirement: parse_var("FEE_REQUIREMENT")?.unwrap_or(defaults.fee_requirement),
            settlement,
        })
    }

    /// Transfer and fee token addresses, needed for EvmToNative
    pub fn evm_tokens(&self) -> Option<(Address, Address)> {
        Some((self.transfer_token?, self.fee_token?))
    }
}
