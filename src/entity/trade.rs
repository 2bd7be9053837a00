use crate::bity::models::BityOrder;
use crate::entity::{BankInfo, Currency, EthInfo};
use serde::{Deserialize, Serialize};

/// Which side of the trade the requested amount is fixed on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeExact {
    Input,
    Output,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    pub input_currency: Currency,
    pub output_currency: Currency,
    /// Decimal amount in the currency selected by `trade_exact`
    pub amount: String,
    pub trade_exact: TradeExact,
}

impl TradeRequest {
    pub fn new(
        input_currency: Currency,
        output_currency: Currency,
        amount: &str,
        trade_exact: TradeExact,
    ) -> Self {
        Self {
            input_currency,
            output_currency,
            amount: amount.to_string(),
            trade_exact,
        }
    }

    /// Currency `amount` is expressed in
    pub fn amount_currency(&self) -> &Currency {
        match self.trade_exact {
            TradeExact::Input => &self.input_currency,
            TradeExact::Output => &self.output_currency,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DexTrade {
    pub trade_request: TradeRequest,
    pub input_amount: String,
    pub output_amount: String,
    /// Aggregator price route, passed back untouched when building the swap
    pub dex_metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BityTrade {
    pub trade_request: TradeRequest,
    pub input_amount: String,
    pub output_amount: String,
    /// Present once the order has been placed, absent for estimates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bity_order_response: Option<BityOrder>,
}

impl BityTrade {
    pub fn order_id(&self) -> Option<&str> {
        self.bity_order_response.as_ref().map(|o| o.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tradeType")]
pub enum Trade {
    #[serde(rename = "DEX")]
    Dex(DexTrade),
    #[serde(rename = "BITY")]
    Bity(BityTrade),
}

impl Trade {
    pub fn input_amount(&self) -> &str {
        match self {
            Trade::Dex(t) => &t.input_amount,
            Trade::Bity(t) => &t.input_amount,
        }
    }

    pub fn output_amount(&self) -> &str {
        match self {
            Trade::Dex(t) => &t.output_amount,
            Trade::Bity(t) => &t.output_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiTradeRequest {
    pub trade_request: TradeRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_info: Option<BankInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_info: Option<EthInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fees {
    pub amount: String,
    pub currency: String,
}

/// Optional swap plus fiat settlement forming one user payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiTrade {
    pub multi_trade_request: MultiTradeRequest,
    pub trades: Vec<Trade>,
    pub input_amount: String,
    pub output_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Fees>,
}

impl MultiTrade {
    pub fn dex_trade(&self) -> Option<&DexTrade> {
        self.trades.iter().find_map(|t| match t {
            Trade::Dex(dex) => Some(dex),
            _ => None,
        })
    }

    pub fn bity_trade(&self) -> Option<&BityTrade> {
        self.trades.iter().find_map(|t| match t {
            Trade::Bity(bity) => Some(bity),
            _ => None,
        })
    }

    pub fn bity_trade_mut(&mut self) -> Option<&mut BityTrade> {
        self.trades.iter_mut().find_map(|t| match t {
            Trade::Bity(bity) => Some(bity),
            _ => None,
        })
    }
}
