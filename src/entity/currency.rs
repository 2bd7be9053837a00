use serde::{Deserialize, Serialize};
use std::fmt;

pub const ETH_SYMBOL: &str = "ETH";
pub const ETH_DECIMALS: u8 = 18;
pub const FIAT_DECIMALS: u8 = 2;

/// Fiat currencies a bank payout can be made in
pub const FIAT_CURRENCIES: [&str; 3] = ["EUR", "CHF", "GBP"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyType {
    Fiat,
    Ether,
    Erc20,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "type")]
    pub currency_type: CurrencyType,
    /// Contract address, ERC-20 tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Currency {
    pub fn ether() -> Self {
        Self {
            symbol: ETH_SYMBOL.to_string(),
            decimals: ETH_DECIMALS,
            currency_type: CurrencyType::Ether,
            address: None,
            name: Some("Ether".to_string()),
        }
    }

    pub fn fiat(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            decimals: FIAT_DECIMALS,
            currency_type: CurrencyType::Fiat,
            address: None,
            name: None,
        }
    }

    pub fn token(symbol: &str, address: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            currency_type: CurrencyType::Erc20,
            address: Some(address.to_string()),
            name: None,
        }
    }

    pub fn is_fiat(&self) -> bool {
        self.currency_type == CurrencyType::Fiat
    }

    /// Fiat currency a bank payout can be made in
    pub fn is_supported_fiat(&self) -> bool {
        self.is_fiat() && FIAT_CURRENCIES.contains(&self.symbol.as_str())
    }

    pub fn is_ether(&self) -> bool {
        self.currency_type == CurrencyType::Ether
    }

    pub fn is_token(&self) -> bool {
        self.currency_type == CurrencyType::Erc20
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
