//! Conversion between human-readable ETH amounts and wei
//!
//! All arithmetic is done on `U256`; floating point never touches an amount.

use crate::{Error, Result};
use alloy::primitives::utils::{self, ParseUnits, UnitsError};
use alloy::primitives::U256;

/// Decimals of the native currency
pub const ETHER_DECIMALS: u8 = 18;

/// Parse a decimal ETH amount such as `"1.5"` into wei
pub fn parse_ether(input: &str) -> Result<U256> {
    parse_units(input, ETHER_DECIMALS)
}

/// Parse a non-negative decimal string into base units with `decimals` places
///
/// Scaling is done by alloy. Its parser accepts a sign and drops extra
/// fractional digits, so both are rejected here first and the value is never
/// silently rounded.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_amount(input, "amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(Error::invalid_amount(input, "amount must not be negative"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(Error::invalid_amount(input, "amount has no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::invalid_amount(input, "amount must be a decimal number"));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(Error::invalid_amount(
            input,
            format!("at most {} decimal places are supported", decimals),
        ));
    }

    utils::parse_units(trimmed, decimals)
        .map(ParseUnits::get_absolute)
        .map_err(|e| match e {
            UnitsError::InvalidUnit(_) => Error::invalid_amount(input, e.to_string()),
            _ => Error::invalid_amount(input, "amount is too large"),
        })
}

/// Format wei as a decimal ETH string
pub fn format_ether(value: U256) -> String {
    format_units(value, ETHER_DECIMALS)
}

/// Format a U256 value with decimals
pub fn format_units(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let remainder_str = format!(
            "{:0>width$}",
            remainder.to_string(),
            width = decimals as usize
        );
        let trimmed = remainder_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}
