//! Cross-Chain Address Encoding
//!
//! The EVM gateway addresses Substrate accounts by a 32-byte word. This
//! module converts between SS58 strings and that word, and validates the
//! 20-byte EVM recipients used in the opposite direction.
//!
//! ## Gateway Word Layout
//!
//! ```text
//! | zero padding (32 - N bytes) | raw account id (N bytes) |
//! ```
//!
//! `N` is 32 for sr25519/ed25519 accounts and 20 for Ethereum-style
//! accounts. Padding is always on the left, matching EVM word alignment.
//!
//! ## SS58 Layout
//!
//! ```text
//! base58( prefix (1-2 bytes) | account id (N bytes) | checksum (2 bytes) )
//! ```
//!
//! The checksum is the first two bytes of `blake2b-512("SS58PRE" | prefix | id)`.

use alloy::primitives::Address;
use blake2::{Blake2b512, Digest};
use std::fmt;

use crate::error::TeleportError;

/// Substrate's generic SS58 prefix
pub const GENERIC_SS58_PREFIX: u16 = 42;

const SS58_CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const SS58_CHECKSUM_LEN: usize = 2;
const MAX_SS58_PREFIX: u16 = 16_383;

// ============================================================================
// Native (SS58) Accounts
// ============================================================================

/// A decoded Substrate account
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeAccount {
    /// Network prefix the address was encoded with
    pub prefix: u16,
    /// Raw account id (20 or 32 bytes)
    pub account_id: Vec<u8>,
}

impl NativeAccount {
    /// Left-pad the account id to an EVM word
    pub fn to_bytes32(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[32 - self.account_id.len()..].copy_from_slice(&self.account_id);
        word
    }
}

/// 32-byte destination account as the EVM gateway expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GatewayAccount(pub [u8; 32]);

impl GatewayAccount {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 0x-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for GatewayAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn ss58_checksum(body: &[u8]) -> [u8; SS58_CHECKSUM_LEN] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CHECKSUM_PREAMBLE);
    hasher.update(body);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

fn encode_prefix(prefix: u16) -> Vec<u8> {
    match prefix {
        0..=63 => vec![prefix as u8],
        _ => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first | 0b0100_0000, second]
        }
    }
}

/// Decode an SS58 address, verifying its checksum.
pub fn decode_ss58(address: &str) -> Result<NativeAccount, TeleportError> {
    let data = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| TeleportError::InvalidAddress(format!("not base58: {}", e)))?;

    if data.len() < 2 {
        return Err(TeleportError::InvalidAddress("address too short".into()));
    }

    let (prefix_len, prefix) = match data[0] {
        0..=63 => (1, data[0] as u16),
        64..=127 => {
            let lower = (data[0] << 2) | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            (2, (lower as u16) | ((upper as u16) << 8))
        }
        _ => {
            return Err(TeleportError::InvalidAddress(format!(
                "reserved SS58 prefix byte 0x{:02x}",
                data[0]
            )))
        }
    };

    let body_len = data
        .len()
        .checked_sub(prefix_len + SS58_CHECKSUM_LEN)
        .ok_or_else(|| TeleportError::InvalidAddress("address too short".into()))?;

    if body_len != 32 && body_len != 20 {
        return Err(TeleportError::InvalidAddress(format!(
            "account id must be 20 or 32 bytes, got {}",
            body_len
        )));
    }

    let (payload, checksum) = data.split_at(data.len() - SS58_CHECKSUM_LEN);
    if ss58_checksum(payload) != checksum {
        return Err(TeleportError::InvalidAddress("bad SS58 checksum".into()));
    }

    Ok(NativeAccount {
        prefix,
        account_id: payload[prefix_len..].to_vec(),
    })
}

/// Encode a raw account id as an SS58 string.
pub fn encode_ss58(account_id: &[u8], prefix: u16) -> Result<String, TeleportError> {
    if prefix > MAX_SS58_PREFIX {
        return Err(TeleportError::InvalidAddress(format!(
            "SS58 prefix {} out of range",
            prefix
        )));
    }
    if account_id.len() != 32 && account_id.len() != 20 {
        return Err(TeleportError::InvalidAddress(format!(
            "account id must be 20 or 32 bytes, got {}",
            account_id.len()
        )));
    }

    let mut data = encode_prefix(prefix);
    data.extend_from_slice(account_id);
    let checksum = ss58_checksum(&data);
    data.extend_from_slice(&checksum);

    Ok(bs58::encode(data).into_string())
}

/// Convert an SS58 address into the gateway's 32-byte destination word.
pub fn encode_for_gateway(address: &str) -> Result<GatewayAccount, TeleportError> {
    let account = decode_ss58(address)?;
    Ok(GatewayAccount(account.to_bytes32()))
}

/// Like [`encode_for_gateway`], but rejects addresses for other networks.
pub fn encode_for_gateway_with_prefix(
    address: &str,
    expected_prefix: u16,
) -> Result<GatewayAccount, TeleportError> {
    let account = decode_ss58(address)?;
    if account.prefix != expected_prefix {
        return Err(TeleportError::InvalidAddress(format!(
            "address is for SS58 network {}, expected {}",
            account.prefix, expected_prefix
        )));
    }
    Ok(GatewayAccount(account.to_bytes32()))
}

/// Render a gateway word back as an SS58 address (32-byte account ids).
pub fn decode_gateway_account(word: &GatewayAccount, prefix: u16) -> Result<String, TeleportError> {
    encode_ss58(word.as_bytes(), prefix)
}

// ============================================================================
// EVM Recipients
// ============================================================================

/// Validate an EVM address against `^0x[0-9a-fA-F]{40}$` and parse it.
pub fn parse_evm_recipient(address: &str) -> Result<Address, TeleportError> {
    let hex_str = address.strip_prefix("0x").ok_or_else(|| {
        TeleportError::InvalidAddress(format!("{:?} is missing the 0x prefix", address))
    })?;

    if hex_str.len() != 40 {
        return Err(TeleportError::InvalidAddress(format!(
            "expected 40 hex chars, got {}",
            hex_str.len()
        )));
    }

    if !hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TeleportError::InvalidAddress(format!(
            "{:?} contains non-hex characters",
            address
        )));
    }

    let bytes = hex::decode(hex_str)
        .map_err(|e| TeleportError::InvalidAddress(format!("invalid hex: {}", e)))?;
    Ok(Address::from_slice(&bytes))
}

/// Left-pad a 20-byte EVM address to 32 bytes
pub fn evm_address_to_bytes32(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}
