use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::{Address, U256};
use std::str::FromStr;
use thiserror::Error;

/// Native ETH placeholder used by DEX aggregators
pub const NATIVE_ETH_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

const ETHERSCAN_TX_URL: &str = "https://etherscan.io/tx/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid decimal amount '{0}'")]
    InvalidDecimal(String),

    #[error("Negative amount '{0}'")]
    Negative(String),

    #[error("Invalid integer amount '{0}'")]
    InvalidInteger(String),
}

/// Convert a decimal display amount into integer base units.
/// Digits beyond `decimals` are truncated.
pub fn amount_to_int(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::InvalidDecimal(amount.to_string()));
    }

    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(value)) if value.is_zero() => Ok(U256::ZERO),
        Ok(ParseUnits::I256(_)) => Err(AmountError::Negative(amount.to_string())),
        Err(_) => Err(AmountError::InvalidDecimal(amount.to_string())),
    }
}

/// Convert integer base units (decimal string) into a display amount
/// without trailing zeros.
pub fn amount_to_decimal(int_amount: &str, decimals: u8) -> Result<String, AmountError> {
    let int_amount = int_amount.trim();
    let value = U256::from_str_radix(int_amount, 10)
        .map_err(|_| AmountError::InvalidInteger(int_amount.to_string()))?;
    let formatted = format_units(value, decimals)
        .map_err(|_| AmountError::InvalidInteger(int_amount.to_string()))?;

    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                Ok(whole.to_string())
            } else {
                Ok(format!("{}.{}", whole, fraction))
            }
        }
        None => Ok(formatted),
    }
}

/// Add a 10% margin on top of a gas estimate
pub fn calculate_gas_margin(gas: u64) -> u64 {
    gas.saturating_add(gas / 10)
}

pub fn parse_address(address: &str) -> Option<Address> {
    Address::from_str(address.trim()).ok()
}

pub fn validate_eth_address(address: &str) -> bool {
    parse_address(address).is_some()
}

pub fn etherscan_tx_url(tx_hash: &str) -> String {
    format!("{}{}", ETHERSCAN_TX_URL, tx_hash)
}
