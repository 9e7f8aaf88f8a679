//! Teleport Flow Tests
//!
//! Drives the public orchestrator API end to end against the in-memory
//! collaborators from `teleport_rs::testing`.
//!
//! ```bash
//! cargo test --features testing --test teleport_flow
//! ```

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

use teleport_rs::chain::{ExtrinsicStatus, ExtrinsicUpdate, ReceiptStatus, SignerHandle, TokenRef};
use teleport_rs::testing::{
    MockEvmClient, MockEvmSigner, MockNativeClient, MockNativeSigner, MockWallet, StaticBalances,
};
use teleport_rs::{
    to_canonical, ApprovalKind, BridgeConfig, CancelSignal, Collaborators, Direction, NextAction,
    TeleportOrchestrator, TeleportOutcome, TransferRequest, UiAction,
};

const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
const EVM_ACCOUNT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

fn config() -> BridgeConfig {
    let mut config = BridgeConfig {
        transfer_token: Some(Address::repeat_byte(0xaa)),
        fee_token: Some(Address::repeat_byte(0xbb)),
        ..BridgeConfig::default()
    };
    config.settlement.timeout = Duration::from_secs(60);
    config.settlement.poll_interval = Duration::from_millis(500);
    config
}

#[tokio::test(start_paused = true)]
async fn test_native_to_evm_round() {
    let native = MockNativeClient::new().with_tx_hash("0x1234").with_updates(vec![
        ExtrinsicUpdate::status(ExtrinsicStatus::Broadcast),
        ExtrinsicUpdate::status(ExtrinsicStatus::InBlock("0xb1".into())),
        ExtrinsicUpdate::status(ExtrinsicStatus::Finalized("0xb1".into())),
    ]);
    let wallet = MockWallet::new().with_signer(
        BOB,
        SignerHandle::Native(Arc::new(MockNativeSigner::new(BOB))),
    );
    let native_balances =
        StaticBalances::new().with_balance(TokenRef::Native, to_canonical("3").unwrap());

    let orchestrator = TeleportOrchestrator::new(
        config(),
        Collaborators {
            wallet: Arc::new(wallet),
            native_client: Arc::new(native.clone()),
            evm_client: Arc::new(MockEvmClient::new()),
            native_balances: Arc::new(native_balances),
            evm_balances: Arc::new(StaticBalances::new()),
        },
    );

    // More than the balance: nothing is submitted
    let too_much = TransferRequest::new(BOB, EVM_ACCOUNT, "3.0001");
    assert_eq!(
        orchestrator
            .attempt_teleport(Direction::NativeToEvm, &too_much)
            .await,
        TeleportOutcome::ActionRequired {
            action: NextAction::InsufficientBalance
        }
    );
    assert_eq!(native.submissions(), 0);

    let request = TransferRequest::new(BOB, EVM_ACCOUNT, "3");
    let outcome = orchestrator
        .attempt_teleport(Direction::NativeToEvm, &request)
        .await;
    assert_eq!(
        outcome,
        TeleportOutcome::Submitted {
            tx_id: "0x1234".into()
        }
    );
    assert_eq!(native.submissions(), 1);
    assert_eq!(native.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_evm_to_native_walks_through_approvals() {
    let config = config();
    let owner: Address = EVM_ACCOUNT.parse().unwrap();
    let signer = Arc::new(MockEvmSigner::new(owner));
    let wallet = MockWallet::new().with_signer(EVM_ACCOUNT, SignerHandle::Evm(signer.clone()));
    let evm = MockEvmClient::new();

    let balances = StaticBalances::new()
        .with_balance(TokenRef::Native, config.min_gas_reserve)
        .with_balance(TokenRef::Erc20(Address::repeat_byte(0xbb)), config.fee_requirement)
        .with_balance(
            TokenRef::Erc20(Address::repeat_byte(0xaa)),
            to_canonical("10").unwrap(),
        );

    let orchestrator = TeleportOrchestrator::new(
        config.clone(),
        Collaborators {
            wallet: Arc::new(wallet),
            native_client: Arc::new(MockNativeClient::new()),
            evm_client: Arc::new(evm.clone()),
            native_balances: Arc::new(StaticBalances::new()),
            evm_balances: Arc::new(balances.clone()),
        },
    );
    let request = TransferRequest::new(EVM_ACCOUNT, BOB, "5");
    let amount = to_canonical("5").unwrap();

    // Fee allowance comes first
    let preflight = orchestrator
        .preflight(Direction::EvmToNative, &request)
        .await
        .unwrap();
    assert_eq!(preflight.action, NextAction::NeedsFeeTokenApproval);
    let UiAction::Approve {
        kind,
        amount: fee_amount,
        ..
    } = preflight.ui.clone()
    else {
        panic!("expected an approval, got {:?}", preflight.ui);
    };
    assert_eq!(kind, ApprovalKind::FeeToken);

    evm.push_receipts(vec![Ok(Some(ReceiptStatus {
        success: true,
        block_hash: None,
    }))]);
    let outcome = orchestrator
        .approve(kind, EVM_ACCOUNT, fee_amount, CancelSignal::never())
        .await;
    assert!(outcome.is_success(), "{:?}", outcome);
    balances.set_allowance(Address::repeat_byte(0xbb), fee_amount);

    // Then the transfer-token allowance
    assert_eq!(
        orchestrator
            .attempt_teleport(Direction::EvmToNative, &request)
            .await,
        TeleportOutcome::ActionRequired {
            action: NextAction::NeedsTransferTokenApproval
        }
    );
    balances.set_allowance(Address::repeat_byte(0xaa), amount);

    // Then the teleport itself, which reverts on chain
    evm.push_receipts(vec![Ok(Some(ReceiptStatus {
        success: false,
        block_hash: None,
    }))]);
    let outcome = orchestrator
        .attempt_teleport(Direction::EvmToNative, &request)
        .await;
    assert!(matches!(
        outcome,
        TeleportOutcome::Failed { ref reason, .. } if reason == "transaction reverted"
    ));

    let sent = signer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, Address::repeat_byte(0xbb));
    assert_eq!(sent[1].to, config.gateway_address);
    assert_eq!(sent[1].value, U256::ZERO);
}
