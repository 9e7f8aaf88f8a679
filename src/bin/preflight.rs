//! Teleport Preflight CLI
//!
//! Reads the EVM-side balances and allowances of an account and prints what
//! it would have to do before a ChainB → ChainA teleport of `amount`.
//!
//! ```text
//! teleport-preflight 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266 2.5
//! ```

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use tracing::info;

use teleport_rs::amount::{to_canonical, to_display, to_display_full};
use teleport_rs::evm::tokens::get_token_info;
use teleport_rs::evm::EvmSession;
use teleport_rs::preconditions::{evaluate, ui_action, Thresholds, UiAction};
use teleport_rs::{fetch_evm_snapshot, BridgeConfig, Direction};

#[derive(Parser)]
#[command(name = "teleport-preflight")]
#[command(about = "Check whether an EVM account can teleport to the native chain", long_about = None)]
struct Cli {
    /// EVM account that would send the teleport
    account: String,

    /// Decimal amount to teleport, e.g. "1.5"
    amount: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = BridgeConfig::load()?;
    info!(
        evm_rpc = %config.evm_rpc_url,
        chain_id = config.evm_chain_id,
        gateway = %config.gateway_address,
        "Configuration loaded"
    );

    let owner = teleport_rs::address_codec::parse_evm_recipient(cli.account.trim())?;
    let requested = to_canonical(&cli.amount)?;
    let (transfer_token, fee_token) = config
        .evm_tokens()
        .ok_or_else(|| eyre!("EVM_TRANSFER_TOKEN and EVM_FEE_TOKEN must be set"))?;

    let session = EvmSession::for_chain(config.evm_rpc_url.clone(), config.evm_chain_id);
    let (balances, allowances) = fetch_evm_snapshot(
        &session,
        owner,
        config.gateway_address,
        transfer_token,
        fee_token,
    )
    .await?;

    let client = session.get().await?;
    let transfer_info = get_token_info(client.provider(), transfer_token).await?;
    let fee_info = get_token_info(client.provider(), fee_token).await?;

    let thresholds = Thresholds {
        min_gas_reserve: config.min_gas_reserve,
        fee_requirement: config.fee_requirement,
    };
    let action = evaluate(
        Direction::EvmToNative,
        &balances,
        &allowances,
        requested,
        &thresholds,
    );

    println!("Account:            {}", owner.to_checksum(None));
    println!("Requested:          {} {}", to_display_full(requested), transfer_info.symbol);
    println!("Gas balance:        {} ETH", to_display(balances.native_gas));
    println!(
        "{} balance:  {} (allowance {})",
        transfer_info.symbol,
        to_display(balances.transfer_token),
        to_display(allowances.transfer_token)
    );
    println!(
        "{} balance:  {} (allowance {})",
        fee_info.symbol,
        to_display(balances.fee_token),
        to_display(allowances.fee_token)
    );
    println!("Next action:        {}", action);

    match ui_action(
        action,
        transfer_token,
        fee_token,
        config.gateway_address,
        requested,
        &thresholds,
    ) {
        UiAction::Approve {
            token,
            spender,
            amount,
            ..
        } => println!(
            "Approve {} to spend {} of token {}",
            spender,
            to_display_full(amount),
            token
        ),
        UiAction::Disabled { reason } => println!("Blocked: {}", reason),
        UiAction::Teleport => println!("Ready to teleport"),
    }

    session.disconnect().await;
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,teleport_rs=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
