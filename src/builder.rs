//! Transfer request validation and payload construction
//!
//! Pure data transforms: no network, no signer. Building twice from the same
//! validated request yields byte-identical payloads.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use serde_json::json;

use crate::address_codec::{
    decode_ss58, encode_for_gateway, encode_for_gateway_with_prefix, evm_address_to_bytes32,
    parse_evm_recipient, GatewayAccount,
};
use crate::amount;
use crate::config::BridgeConfig;
use crate::error::TeleportError;
use crate::evm::contracts::{TokenGateway, ERC20};
use crate::preconditions::ApprovalKind;
use crate::types::{Destination, Direction, SourceAccount, TransferRequest, ValidatedRequest};

// ============================================================================
// Payloads
// ============================================================================

/// `tokenGateway.teleport` extrinsic arguments (NativeToEvm)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTeleportPayload {
    pub asset_id: u32,
    /// EVM chain id of the destination
    pub destination_chain_id: u64,
    /// Recipient exactly as validated, 20 bytes
    pub recipient: Address,
    pub amount: U256,
    pub timeout: u64,
    pub token_gateway: Address,
    pub relayer_fee: U256,
    pub redeem: bool,
}

impl NativeTeleportPayload {
    /// Recipient as the pallet stores it: a 32-byte word, left-padded
    pub fn recipient_bytes32(&self) -> [u8; 32] {
        evm_address_to_bytes32(&self.recipient)
    }

    /// Call arguments in the pallet's `TeleportParams` layout.
    ///
    /// Amounts are decimal strings so no precision is lost in JSON.
    pub fn call_args(&self) -> serde_json::Value {
        json!({
            "asset_id": self.asset_id,
            "destination": { "Evm": self.destination_chain_id },
            // field name as spelled by the pallet
            "recepient": format!("0x{}", hex::encode(self.recipient_bytes32())),
            "amount": self.amount.to_string(),
            "timeout": self.timeout,
            "token_gateway": format!("0x{}", hex::encode(self.token_gateway.as_slice())),
            "relayer_fee": self.relayer_fee.to_string(),
            "call_data": serde_json::Value::Null,
            "redeem": self.redeem,
        })
    }
}

/// A ready-to-sign EVM contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// Gateway `teleport` call (EvmToNative)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTeleportPayload {
    pub gateway: Address,
    pub asset_id: B256,
    pub amount: U256,
    pub relayer_fee: U256,
    pub timeout: u64,
    pub redeem: bool,
    /// Destination account packed by the address codec
    pub recipient: GatewayAccount,
    /// Destination state machine id
    pub dest: Bytes,
}

impl EvmTeleportPayload {
    /// ABI-encoded `teleport(TeleportParams)` calldata
    pub fn calldata(&self) -> Bytes {
        let call = TokenGateway::teleportCall {
            teleportParams: TokenGateway::TeleportParams {
                amount: self.amount,
                relayerFee: self.relayer_fee,
                assetId: self.asset_id,
                redeem: self.redeem,
                to: B256::from(*self.recipient.as_bytes()),
                dest: self.dest.clone(),
                timeout: self.timeout,
                nativeCost: U256::ZERO,
                data: Bytes::new(),
            },
        };
        Bytes::from(call.abi_encode())
    }

    pub fn to_call(&self) -> EvmCall {
        EvmCall {
            to: self.gateway,
            data: self.calldata(),
            value: U256::ZERO,
        }
    }
}

/// ERC-20 `approve(spender, amount)` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPayload {
    pub kind: ApprovalKind,
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

impl ApprovalPayload {
    pub fn calldata(&self) -> Bytes {
        let call = ERC20::approveCall {
            spender: self.spender,
            amount: self.amount,
        };
        Bytes::from(call.abi_encode())
    }

    pub fn to_call(&self) -> EvmCall {
        EvmCall {
            to: self.token,
            data: self.calldata(),
            value: U256::ZERO,
        }
    }
}

/// Direction-specific wire payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    Native(NativeTeleportPayload),
    Evm(EvmTeleportPayload),
}

impl WirePayload {
    pub fn direction(&self) -> Direction {
        match self {
            WirePayload::Native(_) => Direction::NativeToEvm,
            WirePayload::Evm(_) => Direction::EvmToNative,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a raw request for `direction`.
///
/// Amount must be a positive decimal; addresses must decode for the chain
/// they belong to.
pub fn validate(
    direction: Direction,
    request: &TransferRequest,
    config: &BridgeConfig,
) -> Result<ValidatedRequest, TeleportError> {
    let amount = amount::to_canonical(&request.amount)?;
    if amount.is_zero() {
        return Err(TeleportError::InvalidAmount(
            "amount must be greater than zero".into(),
        ));
    }

    let source_account = request.source_account.trim();
    if source_account.is_empty() {
        return Err(TeleportError::InvalidRequest(
            "no source account selected".into(),
        ));
    }

    let destination = request.destination_address.trim();

    let (source, destination) = match direction {
        Direction::NativeToEvm => {
            decode_ss58(source_account)?;
            let recipient = parse_evm_recipient(destination)?;
            (
                SourceAccount::Native(source_account.to_string()),
                Destination::Evm(recipient),
            )
        }
        Direction::EvmToNative => {
            let sender = parse_evm_recipient(source_account)?;
            let account = match config.ss58_prefix {
                Some(prefix) => encode_for_gateway_with_prefix(destination, prefix)?,
                None => encode_for_gateway(destination)?,
            };
            (SourceAccount::Evm(sender), Destination::Native(account))
        }
    };

    Ok(ValidatedRequest {
        direction,
        source,
        destination,
        amount,
    })
}

// ============================================================================
// Building
// ============================================================================

/// Assemble the wire payload for a validated request.
pub fn build(
    direction: Direction,
    request: &ValidatedRequest,
    config: &BridgeConfig,
) -> Result<WirePayload, TeleportError> {
    if request.direction != direction {
        return Err(TeleportError::InvalidRequest(format!(
            "request was validated for {}, not {}",
            request.direction, direction
        )));
    }
    if request.amount.is_zero() {
        return Err(TeleportError::InvalidAmount(
            "amount must be greater than zero".into(),
        ));
    }

    match (direction, &request.destination) {
        (Direction::NativeToEvm, Destination::Evm(recipient)) => {
            Ok(WirePayload::Native(NativeTeleportPayload {
                asset_id: config.native_asset_id,
                destination_chain_id: config.evm_chain_id,
                recipient: *recipient,
                amount: request.amount,
                timeout: 0,
                token_gateway: config.gateway_address,
                relayer_fee: U256::ZERO,
                redeem: false,
            }))
        }
        (Direction::EvmToNative, Destination::Native(account)) => {
            Ok(WirePayload::Evm(EvmTeleportPayload {
                gateway: config.gateway_address,
                asset_id: config.evm_asset_id,
                amount: request.amount,
                relayer_fee: U256::ZERO,
                timeout: 0,
                redeem: false,
                recipient: *account,
                dest: Bytes::from(config.native_state_machine.clone().into_bytes()),
            }))
        }
        (direction, destination) => Err(TeleportError::InvalidRequest(format!(
            "destination {:?} does not fit direction {}",
            destination, direction
        ))),
    }
}

/// Build an ERC-20 approval of `amount` to the gateway.
pub fn build_approval(
    kind: ApprovalKind,
    amount: U256,
    config: &BridgeConfig,
) -> Result<ApprovalPayload, TeleportError> {
    let (transfer_token, fee_token) = config.evm_tokens().ok_or_else(|| {
        TeleportError::InvalidRequest("EVM transfer/fee tokens are not configured".into())
    })?;

    let token = match kind {
        ApprovalKind::FeeToken => fee_token,
        ApprovalKind::TransferToken => transfer_token,
    };

    Ok(ApprovalPayload {
        kind,
        token,
        spender: config.gateway_address,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_RECIPIENT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    fn config() -> BridgeConfig {
        BridgeConfig {
            transfer_token: Some(Address::repeat_byte(0x11)),
            fee_token: Some(Address::repeat_byte(0x22)),
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn test_native_to_evm_payload() {
        let config = config();
        let request = TransferRequest::new(ALICE, EVM_RECIPIENT, "1.5");
        let validated = validate(Direction::NativeToEvm, &request, &config).unwrap();
        let payload = build(Direction::NativeToEvm, &validated, &config).unwrap();

        let WirePayload::Native(payload) = payload else {
            panic!("expected native payload");
        };
        assert_eq!(payload.amount.to_string(), "1500000000000000000");
        assert_eq!(payload.destination_chain_id, 11_155_111);
        assert_eq!(payload.recipient, parse_evm_recipient(EVM_RECIPIENT).unwrap());
        assert!(!payload.redeem);
        assert_eq!(payload.timeout, 0);
        assert_eq!(payload.relayer_fee, U256::ZERO);

        let args = payload.call_args();
        assert_eq!(args["amount"], "1500000000000000000");
        assert_eq!(args["redeem"], false);
        assert_eq!(args["timeout"], 0);
        assert_eq!(args["relayer_fee"], "0");
        assert_eq!(args["destination"]["Evm"], 11_155_111u64);
        assert_eq!(
            args["recepient"],
            "0x000000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(
            args["token_gateway"],
            "0xfcda26ca021d5535c3059547390e6ccd8de7aca6"
        );
        assert!(args["call_data"].is_null());
    }

    #[test]
    fn test_evm_to_native_payload() {
        let config = config();
        let request = TransferRequest::new(EVM_RECIPIENT, ALICE, "2");
        let validated = validate(Direction::EvmToNative, &request, &config).unwrap();
        let payload = build(Direction::EvmToNative, &validated, &config).unwrap();

        let WirePayload::Evm(payload) = payload else {
            panic!("expected evm payload");
        };
        assert_eq!(payload.gateway, config.gateway_address);
        assert_eq!(payload.recipient, encode_for_gateway(ALICE).unwrap());
        assert!(!payload.redeem);
        assert_eq!(payload.timeout, 0);
        assert_eq!(payload.relayer_fee, U256::ZERO);
        assert_eq!(payload.dest.as_ref(), b"SUBSTRATE-zkv_");

        let call = payload.to_call();
        assert_eq!(call.to, config.gateway_address);
        assert_eq!(&call.data[..4], &TokenGateway::teleportCall::SELECTOR);

        let decoded = TokenGateway::teleportCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(decoded.teleportParams.amount, payload.amount);
        assert_eq!(
            decoded.teleportParams.to.as_slice(),
            encode_for_gateway(ALICE).unwrap().as_bytes()
        );
        assert!(!decoded.teleportParams.redeem);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = config();
        let request = TransferRequest::new(EVM_RECIPIENT, ALICE, "3.25");
        let validated = validate(Direction::EvmToNative, &request, &config).unwrap();

        let first = build(Direction::EvmToNative, &validated, &config).unwrap();
        let second = build(Direction::EvmToNative, &validated, &config).unwrap();
        assert_eq!(first, second);

        let (WirePayload::Evm(a), WirePayload::Evm(b)) = (first, second) else {
            panic!("expected evm payloads");
        };
        assert_eq!(a.calldata(), b.calldata());
    }

    #[test]
    fn test_direction_mismatch_is_invalid_request() {
        let config = config();
        let request = TransferRequest::new(ALICE, EVM_RECIPIENT, "1");
        let validated = validate(Direction::NativeToEvm, &request, &config).unwrap();

        assert!(matches!(
            build(Direction::EvmToNative, &validated, &config),
            Err(TeleportError::InvalidRequest(_))
        ));

        let mut tampered = validated.clone();
        tampered.direction = Direction::EvmToNative;
        assert!(matches!(
            build(Direction::EvmToNative, &tampered, &config),
            Err(TeleportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let config = config();

        let bad_amount = TransferRequest::new(ALICE, EVM_RECIPIENT, "1.2.3");
        assert!(matches!(
            validate(Direction::NativeToEvm, &bad_amount, &config),
            Err(TeleportError::InvalidAmount(_))
        ));

        let zero = TransferRequest::new(ALICE, EVM_RECIPIENT, "0.0");
        assert!(matches!(
            validate(Direction::NativeToEvm, &zero, &config),
            Err(TeleportError::InvalidAmount(_))
        ));

        let bad_recipient = TransferRequest::new(ALICE, "0x1234", "1");
        assert!(matches!(
            validate(Direction::NativeToEvm, &bad_recipient, &config),
            Err(TeleportError::InvalidAddress(_))
        ));

        let bad_native = TransferRequest::new(EVM_RECIPIENT, "5Grw", "1");
        assert!(matches!(
            validate(Direction::EvmToNative, &bad_native, &config),
            Err(TeleportError::InvalidAddress(_))
        ));

        let no_source = TransferRequest::new("", EVM_RECIPIENT, "1");
        assert!(matches!(
            validate(Direction::NativeToEvm, &no_source, &config),
            Err(TeleportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_prefix_enforced_when_configured() {
        let config = BridgeConfig {
            ss58_prefix: Some(251),
            ..config()
        };
        let request = TransferRequest::new(EVM_RECIPIENT, ALICE, "1");
        assert!(matches!(
            validate(Direction::EvmToNative, &request, &config),
            Err(TeleportError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_build_approval() {
        let config = config();
        let approval =
            build_approval(ApprovalKind::FeeToken, U256::from(10u64), &config).unwrap();
        assert_eq!(approval.token, Address::repeat_byte(0x22));
        assert_eq!(approval.spender, config.gateway_address);

        let call = approval.to_call();
        assert_eq!(call.to, approval.token);
        let decoded = ERC20::approveCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(decoded.spender, config.gateway_address);
        assert_eq!(decoded.amount, U256::from(10u64));

        let unconfigured = BridgeConfig::default();
        assert!(matches!(
            build_approval(ApprovalKind::TransferToken, U256::from(1u64), &unconfigured),
            Err(TeleportError::InvalidRequest(_))
        ));
    }
}
