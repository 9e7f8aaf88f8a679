//! Transfer submission
//!
//! Hands a built payload to the right chain client together with the user's
//! signer and returns as soon as the network has accepted it. Waiting for
//! inclusion is the settlement tracker's job.

use alloy::primitives::TxHash;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

use crate::builder::{EvmCall, WirePayload};
use crate::chain::{EvmChainClient, ExtrinsicSubscription, NativeChainClient, SignerHandle};
use crate::error::{SignerError, TeleportError};
use crate::types::{Direction, PendingTransfer};

/// What the settlement tracker watches for a submitted transfer
pub enum SettlementSource {
    /// Live status subscription of a native extrinsic
    Native(Box<dyn ExtrinsicSubscription>),
    /// EVM transaction whose receipt is polled
    Evm(TxHash),
}

impl fmt::Debug for SettlementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementSource::Native(sub) => f.debug_tuple("Native").field(&sub.tx_hash()).finish(),
            SettlementSource::Evm(hash) => f.debug_tuple("Evm").field(hash).finish(),
        }
    }
}

/// A transfer the network accepted
#[derive(Debug)]
pub struct Submission {
    pub pending: PendingTransfer,
    pub source: SettlementSource,
}

/// Routes payloads to the native or EVM client
#[derive(Clone)]
pub struct TransferSubmitter {
    native: Arc<dyn NativeChainClient>,
    evm: Arc<dyn EvmChainClient>,
}

impl TransferSubmitter {
    pub fn new(native: Arc<dyn NativeChainClient>, evm: Arc<dyn EvmChainClient>) -> Self {
        Self { native, evm }
    }

    /// Submit `payload` signed by `signer`.
    ///
    /// Returns once the transfer has a hash. A declined signing prompt is
    /// [`TeleportError::UserRejected`], never a submission failure.
    pub async fn submit(
        &self,
        direction: Direction,
        payload: &WirePayload,
        signer: Option<&SignerHandle>,
    ) -> Result<Submission, TeleportError> {
        if payload.direction() != direction {
            return Err(TeleportError::InvalidRequest(format!(
                "payload was built for {}, not {}",
                payload.direction(),
                direction
            )));
        }
        let signer = signer.ok_or_else(|| {
            TeleportError::SignerUnavailable("no signer attached to the source account".into())
        })?;

        match (payload, signer) {
            (WirePayload::Native(payload), SignerHandle::Native(signer)) => {
                let subscription = self
                    .native
                    .submit_extrinsic(payload, signer.as_ref())
                    .await
                    .map_err(|e| log_signer_error(direction, e))?;

                let pending = pending(subscription.tx_hash(), direction);
                info!(
                    direction = %direction,
                    tx_hash = %pending.handle_id,
                    account = %signer.account(),
                    "Teleport extrinsic submitted"
                );
                Ok(Submission {
                    pending,
                    source: SettlementSource::Native(subscription),
                })
            }
            (WirePayload::Evm(payload), SignerHandle::Evm(_)) => {
                self.submit_evm_call(direction, &payload.to_call(), signer)
                    .await
            }
            _ => Err(TeleportError::InvalidRequest(format!(
                "signer does not belong to the source chain of {}",
                direction
            ))),
        }
    }

    /// Submit a raw EVM call (teleports and approvals)
    pub async fn submit_evm_call(
        &self,
        direction: Direction,
        call: &EvmCall,
        signer: &SignerHandle,
    ) -> Result<Submission, TeleportError> {
        let SignerHandle::Evm(signer) = signer else {
            return Err(TeleportError::InvalidRequest(
                "EVM call needs an EVM signer".into(),
            ));
        };

        let hash = self
            .evm
            .send_contract_call(call, signer.as_ref())
            .await
            .map_err(|e| log_signer_error(direction, e))?;

        let pending = pending(format!("{:#x}", hash), direction);
        info!(
            direction = %direction,
            tx_hash = %pending.handle_id,
            from = %signer.address(),
            to = %call.to,
            "EVM transaction submitted"
        );
        Ok(Submission {
            pending,
            source: SettlementSource::Evm(hash),
        })
    }
}

fn pending(handle_id: String, direction: Direction) -> PendingTransfer {
    PendingTransfer {
        handle_id,
        direction,
        submitted_at: SystemTime::now(),
    }
}

fn log_signer_error(direction: Direction, err: SignerError) -> TeleportError {
    match &err {
        SignerError::Rejected(_) => info!(direction = %direction, "User rejected signing"),
        _ => warn!(direction = %direction, error = %err, "Submission failed"),
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, validate};
    use crate::config::BridgeConfig;
    use crate::testing::{MockEvmClient, MockEvmSigner, MockNativeClient, MockNativeSigner};
    use crate::types::TransferRequest;
    use alloy::primitives::Address;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const EVM_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn config() -> BridgeConfig {
        BridgeConfig {
            transfer_token: Some(Address::repeat_byte(0x11)),
            fee_token: Some(Address::repeat_byte(0x22)),
            ..BridgeConfig::default()
        }
    }

    fn payload(direction: Direction) -> WirePayload {
        let config = config();
        let request = match direction {
            Direction::NativeToEvm => TransferRequest::new(ALICE, EVM_ACCOUNT, "1"),
            Direction::EvmToNative => TransferRequest::new(EVM_ACCOUNT, ALICE, "1"),
        };
        let validated = validate(direction, &request, &config).unwrap();
        build(direction, &validated, &config).unwrap()
    }

    fn submitter(native: &MockNativeClient, evm: &MockEvmClient) -> TransferSubmitter {
        TransferSubmitter::new(Arc::new(native.clone()), Arc::new(evm.clone()))
    }

    #[tokio::test]
    async fn test_missing_signer_is_signer_unavailable() {
        let native = MockNativeClient::new();
        let submitter = submitter(&native, &MockEvmClient::new());
        let err = submitter
            .submit(Direction::NativeToEvm, &payload(Direction::NativeToEvm), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TeleportError::SignerUnavailable(_)));
        assert_eq!(native.submissions(), 0);
    }

    #[tokio::test]
    async fn test_native_submission_returns_pending_handle() {
        let native = MockNativeClient::new().with_tx_hash("0xfeed");
        let submitter = submitter(&native, &MockEvmClient::new());
        let signer = SignerHandle::Native(Arc::new(MockNativeSigner::new(ALICE)));

        let submission = submitter
            .submit(
                Direction::NativeToEvm,
                &payload(Direction::NativeToEvm),
                Some(&signer),
            )
            .await
            .unwrap();
        assert_eq!(submission.pending.handle_id, "0xfeed");
        assert_eq!(submission.pending.direction, Direction::NativeToEvm);
        assert!(matches!(submission.source, SettlementSource::Native(_)));
        assert_eq!(native.submissions(), 1);
    }

    #[tokio::test]
    async fn test_rejected_prompt_is_user_rejected() {
        let native = MockNativeClient::new();
        let submitter = submitter(&native, &MockEvmClient::new());
        let signer = SignerHandle::Native(Arc::new(MockNativeSigner::rejecting(ALICE)));

        let err = submitter
            .submit(
                Direction::NativeToEvm,
                &payload(Direction::NativeToEvm),
                Some(&signer),
            )
            .await
            .unwrap_err();
        assert_eq!(err, TeleportError::UserRejected);
    }

    #[tokio::test]
    async fn test_evm_submission_and_signer_mismatch() {
        let evm = MockEvmClient::new();
        let submitter = submitter(&MockNativeClient::new(), &evm);
        let evm_signer = SignerHandle::Evm(Arc::new(MockEvmSigner::new(
            EVM_ACCOUNT.parse().unwrap(),
        )));

        let submission = submitter
            .submit(
                Direction::EvmToNative,
                &payload(Direction::EvmToNative),
                Some(&evm_signer),
            )
            .await
            .unwrap();
        assert!(submission.pending.handle_id.starts_with("0x"));
        assert!(matches!(submission.source, SettlementSource::Evm(_)));

        let native_signer = SignerHandle::Native(Arc::new(MockNativeSigner::new(ALICE)));
        let err = submitter
            .submit(
                Direction::EvmToNative,
                &payload(Direction::EvmToNative),
                Some(&native_signer),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TeleportError::InvalidRequest(_)));
    }
}
