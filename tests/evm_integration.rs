//! EVM Integration Test
//!
//! Reads the precondition snapshot of an account from a live EVM node.
//!
//! ## Setup
//!
//! Set these environment variables (a `.env` file works too):
//!
//! - `EVM_RPC_URL` - EVM RPC (e.g., https://ethereum-sepolia-rpc.publicnode.com)
//! - `EVM_CHAIN_ID` - Chain id served by that RPC (e.g., 11155111)
//! - `EVM_TRANSFER_TOKEN` / `EVM_FEE_TOKEN` - ERC-20s the gateway pulls
//! - `TEST_EVM_ACCOUNT` - Account to inspect
//!
//! ## Running
//!
//! ```bash
//! cargo test --test evm_integration -- --ignored --nocapture
//! ```

use teleport_rs::chain::{BalanceQuery, TokenRef};
use teleport_rs::evm::EvmSession;
use teleport_rs::{evaluate, fetch_evm_snapshot, parse_evm_recipient, BridgeConfig, Direction, Thresholds};

/// Setup: load config from env, skipping when the account is not set
fn setup() -> Result<(BridgeConfig, String), String> {
    let config = BridgeConfig::load().map_err(|e| format!("config: {:#}", e))?;
    let account = std::env::var("TEST_EVM_ACCOUNT")
        .map_err(|_| "TEST_EVM_ACCOUNT not set".to_string())?;
    let account = parse_evm_recipient(&account)
        .map_err(|e| e.to_string())?
        .to_checksum(None);
    if config.evm_tokens().is_none() {
        return Err("EVM_TRANSFER_TOKEN and EVM_FEE_TOKEN must be set".into());
    }
    Ok((config, account))
}

#[tokio::test]
#[ignore = "requires a live EVM RPC"]
async fn test_snapshot_against_live_node() {
    let (config, account) = match setup() {
        Ok(ctx) => ctx,
        Err(reason) => {
            eprintln!("Skipping: {}", reason);
            return;
        }
    };
    let Some((transfer_token, fee_token)) = config.evm_tokens() else {
        return;
    };

    let session = EvmSession::for_chain(config.evm_rpc_url.clone(), config.evm_chain_id);
    let owner = parse_evm_recipient(&account).expect("owner");
    let (balances, allowances) = fetch_evm_snapshot(
        &session,
        owner,
        config.gateway_address,
        transfer_token,
        fee_token,
    )
    .await
    .expect("snapshot");
    assert!(session.is_connected().await);

    let action = evaluate(
        Direction::EvmToNative,
        &balances,
        &allowances,
        teleport_rs::amount::unit(),
        &Thresholds {
            min_gas_reserve: config.min_gas_reserve,
            fee_requirement: config.fee_requirement,
        },
    );
    println!("{:?} {:?} -> {}", balances, allowances, action);

    session.disconnect().await;
    assert!(!session.is_connected().await);
}

#[tokio::test]
#[ignore = "requires a live EVM RPC"]
async fn test_wrong_chain_id_is_rejected() {
    let Ok((config, account)) = setup() else {
        eprintln!("Skipping: environment not configured");
        return;
    };

    let session = EvmSession::for_chain(config.evm_rpc_url.clone(), config.evm_chain_id + 1);
    let err = session
        .get_balance(&account, TokenRef::Native)
        .await
        .unwrap_err();
    assert!(matches!(err, teleport_rs::ClientError::NotConnected(_)));
    assert!(!session.is_connected().await);
}
