use crate::entity::Currency;
use crate::ethereum::utils::NATIVE_ETH_ADDRESS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParaswapError {
    #[error("No route found: {0}")]
    NoRoute(String),

    #[error("Token not supported by the aggregator: {0}")]
    UnsupportedToken(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ParaSwap API error: {0}")]
    Api(String),
}

impl ParaswapError {
    /// Classify an `{"error": ...}` body returned by the API
    pub fn from_api_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("route") || lower.contains("liquidity") {
            ParaswapError::NoRoute(message.to_string())
        } else {
            ParaswapError::Api(message.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Swap side: which amount is fixed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Sell,
    Buy,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Sell => write!(f, "SELL"),
            Self::Buy => write!(f, "BUY"),
        }
    }
}

/// Fields of the price route this crate reads; the full route stays in `raw`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRoute {
    pub src_token: Option<String>,
    pub dest_token: Option<String>,
    pub src_amount: String,
    pub dest_amount: String,
    pub token_transfer_proxy: Option<String>,
    pub gas_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceResponse {
    pub price_route: PriceRoute,
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBuildRequest {
    pub src_token: String,
    pub dest_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_amount: Option<String>,
    pub slippage: u32,
    pub price_route: Value,
    pub user_address: String,
    pub partner: String,
    pub src_decimals: u8,
    pub dest_decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub from: String,
    pub to: String,
    pub value: String,
    pub data: String,
    pub gas: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParaswapToken {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    pub img: Option<String>,
}

impl From<ParaswapToken> for Currency {
    fn from(token: ParaswapToken) -> Self {
        if token.address.eq_ignore_ascii_case(NATIVE_ETH_ADDRESS) {
            return Currency::ether();
        }
        Currency::token(&token.symbol, &token.address, token.decimals)
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenListResponse {
    pub tokens: Vec<ParaswapToken>,
}

/// Address the aggregator uses for a currency
pub fn token_address(currency: &Currency) -> Result<String, ParaswapError> {
    if currency.is_ether() {
        return Ok(NATIVE_ETH_ADDRESS.to_string());
    }
    currency
        .address
        .clone()
        .filter(|_| currency.is_token())
        .ok_or_else(|| ParaswapError::UnsupportedToken(currency.symbol.clone()))
}
