//! Fixed-point amount conversion
//!
//! Converts user-facing decimal strings to the token's smallest unit
//! (18 decimals) and back. Extra fractional digits are truncated, never
//! rounded, so a converted amount is never larger than what was typed.

use alloy::primitives::U256;

use crate::error::TeleportError;

/// Decimals of the teleported token on both chains
pub const TOKEN_DECIMALS: usize = 18;

/// Fractional digits shown by [`to_display`]
pub const DISPLAY_DECIMALS: usize = 4;

/// 10^18
pub fn unit() -> U256 {
    U256::from(10u128.pow(TOKEN_DECIMALS as u32))
}

/// Convert a decimal string (e.g. `"1.5"`) to its canonical integer value.
///
/// Accepts digits with at most one `.`; either side of the point may be
/// empty (`".5"`, `"5."`) but not both. Signs, exponents, separators and
/// whitespace inside the number are rejected.
pub fn to_canonical(amount: &str) -> Result<U256, TeleportError> {
    let amount = amount.trim();

    if amount.is_empty() {
        return Err(TeleportError::InvalidAmount("amount is empty".into()));
    }

    if let Some(c) = amount.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(TeleportError::InvalidAmount(format!(
            "unexpected character '{}' in {:?}",
            c, amount
        )));
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => {
            if fraction.contains('.') {
                return Err(TeleportError::InvalidAmount(format!(
                    "more than one decimal point in {:?}",
                    amount
                )));
            }
            (whole, fraction)
        }
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(TeleportError::InvalidAmount("no digits".into()));
    }

    let kept = &fraction[..fraction.len().min(TOKEN_DECIMALS)];
    let digits = format!("{}{:0<width$}", whole, kept, width = TOKEN_DECIMALS);

    U256::from_str_radix(&digits, 10)
        .map_err(|e| TeleportError::InvalidAmount(format!("{:?} out of range: {}", amount, e)))
}

/// Split a canonical value into (whole, 18-digit zero-padded fraction)
fn split(value: U256) -> (U256, String) {
    let unit = unit();
    let whole = value / unit;
    let fraction = value % unit;
    (
        whole,
        format!("{:0>width$}", fraction.to_string(), width = TOKEN_DECIMALS),
    )
}

/// Render a canonical value with exactly four fractional digits (truncated).
pub fn to_display(value: U256) -> String {
    let (whole, fraction) = split(value);
    format!("{}.{}", whole, &fraction[..DISPLAY_DECIMALS])
}

/// Render a canonical value at full precision, trimming trailing zeros.
pub fn to_display_full(value: U256) -> String {
    let (whole, fraction) = split(value);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
