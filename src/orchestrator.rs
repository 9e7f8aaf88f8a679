//! Teleport orchestrator
//!
//! Drives one attempt through validate → fresh snapshot → evaluate → build →
//! sign and submit → track. Every step's failure ends the attempt and comes
//! back as a [`TeleportOutcome`]; nothing is retried or resubmitted.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builder::{self, WirePayload};
use crate::chain::{BalanceQuery, EvmChainClient, NativeChainClient, TokenRef, WalletProvider};
use crate::config::BridgeConfig;
use crate::error::{ClientError, TeleportError};
use crate::preconditions::{self, ApprovalKind, Thresholds, UiAction};
use crate::settlement::{CancelSignal, SettlementTracker};
use crate::submitter::TransferSubmitter;
use crate::types::{
    AllowanceState, Balances, Direction, NextAction, SourceAccount, TeleportOutcome,
    TransferRequest, ValidatedRequest,
};

/// External services an orchestrator is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub wallet: Arc<dyn WalletProvider>,
    pub native_client: Arc<dyn NativeChainClient>,
    pub evm_client: Arc<dyn EvmChainClient>,
    /// Balance service of the Substrate chain
    pub native_balances: Arc<dyn BalanceQuery>,
    /// Balance and allowance service of the EVM chain
    pub evm_balances: Arc<dyn BalanceQuery>,
}

/// Result of a dry run: everything up to, but not including, signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preflight {
    pub request: ValidatedRequest,
    pub balances: Balances,
    pub allowances: AllowanceState,
    pub action: NextAction,
    pub ui: UiAction,
}

/// Coordinates teleport attempts for one deployment
pub struct TeleportOrchestrator {
    config: BridgeConfig,
    wallet: Arc<dyn WalletProvider>,
    native_balances: Arc<dyn BalanceQuery>,
    evm_balances: Arc<dyn BalanceQuery>,
    submitter: TransferSubmitter,
    tracker: SettlementTracker,
}

impl TeleportOrchestrator {
    pub fn new(config: BridgeConfig, collaborators: Collaborators) -> Self {
        let submitter = TransferSubmitter::new(
            collaborators.native_client,
            Arc::clone(&collaborators.evm_client),
        );
        let tracker = SettlementTracker::new(config.settlement.clone(), collaborators.evm_client);

        Self {
            config,
            wallet: collaborators.wallet,
            native_balances: collaborators.native_balances,
            evm_balances: collaborators.evm_balances,
            submitter,
            tracker,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_gas_reserve: self.config.min_gas_reserve,
            fee_requirement: self.config.fee_requirement,
        }
    }

    /// Run one attempt to a terminal outcome
    pub async fn attempt_teleport(
        &self,
        direction: Direction,
        request: &TransferRequest,
    ) -> TeleportOutcome {
        self.attempt_teleport_with_cancel(direction, request, CancelSignal::never())
            .await
    }

    /// Run one attempt; `cancel` abandons settlement tracking
    pub async fn attempt_teleport_with_cancel(
        &self,
        direction: Direction,
        request: &TransferRequest,
        cancel: CancelSignal,
    ) -> TeleportOutcome {
        info!(
            direction = %direction,
            source = %request.source_account,
            destination = %request.destination_address,
            amount = %request.amount,
            "Starting teleport attempt"
        );

        match self.run_attempt(direction, request, cancel).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(direction = %direction, error = %error, "Teleport attempt rejected");
                TeleportOutcome::Rejected { error }
            }
        }
    }

    async fn run_attempt(
        &self,
        direction: Direction,
        request: &TransferRequest,
        cancel: CancelSignal,
    ) -> Result<TeleportOutcome, TeleportError> {
        let validated = builder::validate(direction, request, &self.config)?;

        let (balances, allowances) = self.fetch_snapshot(&validated).await?;
        let action = preconditions::evaluate(
            direction,
            &balances,
            &allowances,
            validated.amount,
            &self.thresholds(),
        );
        if !action.is_ready() {
            info!(direction = %direction, action = %action, "Precondition unmet");
            return Ok(TeleportOutcome::ActionRequired { action });
        }

        let payload = builder::build(direction, &validated, &self.config)?;
        if let WirePayload::Native(native) = &payload {
            debug!(call_args = %native.call_args(), "Built tokenGateway.teleport call");
        }

        let signer = self
            .wallet
            .get_signer(&validated.source.wallet_key())
            .await?;
        let submission = self
            .submitter
            .submit(direction, &payload, Some(&signer))
            .await?;

        Ok(self.tracker.track(submission, cancel).await)
    }

    /// Validate and evaluate without signing anything
    pub async fn preflight(
        &self,
        direction: Direction,
        request: &TransferRequest,
    ) -> Result<Preflight, TeleportError> {
        let validated = builder::validate(direction, request, &self.config)?;
        let (balances, allowances) = self.fetch_snapshot(&validated).await?;
        let thresholds = self.thresholds();
        let action = preconditions::evaluate(
            direction,
            &balances,
            &allowances,
            validated.amount,
            &thresholds,
        );

        let (transfer_token, fee_token) = self
            .config
            .evm_tokens()
            .unwrap_or((Address::ZERO, Address::ZERO));
        let ui = preconditions::ui_action(
            action,
            transfer_token,
            fee_token,
            self.config.gateway_address,
            validated.amount,
            &thresholds,
        );

        Ok(Preflight {
            request: validated,
            balances,
            allowances,
            action,
            ui,
        })
    }

    /// Read balances and allowances for `request`.
    ///
    /// Always queried fresh; an earlier snapshot may be stale.
    pub async fn fetch_snapshot(
        &self,
        request: &ValidatedRequest,
    ) -> Result<(Balances, AllowanceState), TeleportError> {
        match &request.source {
            SourceAccount::Native(account) => {
                let balance = self
                    .native_balances
                    .get_balance(account, TokenRef::Native)
                    .await
                    .map_err(query_failed)?;
                Ok((
                    Balances {
                        transfer_token: balance,
                        ..Balances::default()
                    },
                    AllowanceState::default(),
                ))
            }
            SourceAccount::Evm(owner) => {
                let (transfer_token, fee_token) = self.config.evm_tokens().ok_or_else(|| {
                    TeleportError::InvalidRequest(
                        "EVM transfer/fee tokens are not configured".into(),
                    )
                })?;
                fetch_evm_snapshot(
                    self.evm_balances.as_ref(),
                    *owner,
                    self.config.gateway_address,
                    transfer_token,
                    fee_token,
                )
                .await
                .map_err(query_failed)
            }
        }
    }

    /// Send an ERC-20 approval to the gateway and track it like a teleport
    pub async fn approve(
        &self,
        kind: ApprovalKind,
        owner: &str,
        amount: U256,
        cancel: CancelSignal,
    ) -> TeleportOutcome {
        match self.run_approval(kind, owner, amount, cancel).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(kind = ?kind, error = %error, "Approval rejected");
                TeleportOutcome::Rejected { error }
            }
        }
    }

    async fn run_approval(
        &self,
        kind: ApprovalKind,
        owner: &str,
        amount: U256,
        cancel: CancelSignal,
    ) -> Result<TeleportOutcome, TeleportError> {
        let owner = crate::address_codec::parse_evm_recipient(owner.trim())?;
        let approval = builder::build_approval(kind, amount, &self.config)?;
        info!(
            kind = ?kind,
            token = %approval.token,
            spender = %approval.spender,
            amount = %amount,
            "Requesting approval"
        );

        let signer = self.wallet.get_signer(&owner.to_checksum(None)).await?;
        let submission = self
            .submitter
            .submit_evm_call(Direction::EvmToNative, &approval.to_call(), &signer)
            .await?;

        Ok(self.tracker.track(submission, cancel).await)
    }
}

/// Read the gas, fee-token and transfer-token balances of `owner` and its
/// allowances towards `spender`, all five queries in flight at once.
pub async fn fetch_evm_snapshot(
    query: &dyn BalanceQuery,
    owner: Address,
    spender: Address,
    transfer_token: Address,
    fee_token: Address,
) -> Result<(Balances, AllowanceState), ClientError> {
    let owner = owner.to_checksum(None);
    let spender = spender.to_checksum(None);

    let (native_gas, fee_balance, transfer_balance, fee_allowance, transfer_allowance) =
        tokio::try_join!(
            query.get_balance(&owner, TokenRef::Native),
            query.get_balance(&owner, TokenRef::Erc20(fee_token)),
            query.get_balance(&owner, TokenRef::Erc20(transfer_token)),
            query.get_allowance(&owner, &spender, TokenRef::Erc20(fee_token)),
            query.get_allowance(&owner, &spender, TokenRef::Erc20(transfer_token)),
        )?;

    debug!(
        owner = %owner,
        native_gas = %native_gas,
        fee_balance = %fee_balance,
        transfer_balance = %transfer_balance,
        fee_allowance = %fee_allowance,
        transfer_allowance = %transfer_allowance,
        "Fetched EVM snapshot"
    );

    Ok((
        Balances {
            native_gas,
            fee_token: fee_balance,
            transfer_token: transfer_balance,
        },
        AllowanceState {
            transfer_token: transfer_allowance,
            fee_token: fee_allowance,
        },
    ))
}

fn query_failed(err: ClientError) -> TeleportError {
    TeleportError::QueryFailed(err.to_string())
}
