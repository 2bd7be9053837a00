use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fiat order created through the API, kept for referral accounting.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: i32,
    pub bity_order_id: String,
    pub eth_address: String,
    pub input_currency: String,
    /// Crypto amount sent to the provider, decimal string
    pub eth_amount: String,
    pub fiat_currency: String,
    pub fiat_amount: String,
    pub referral_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderRecord {
    pub bity_order_id: String,
    pub eth_address: String,
    pub input_currency: String,
    pub eth_amount: String,
    pub fiat_currency: String,
    pub fiat_amount: String,
    pub referral_id: Option<String>,
}

/// Aggregate of the ETH orders carrying one referral id
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReferralTotals {
    pub total_eth: Decimal,
    pub count: i64,
}

/// Referral earnings of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitShare {
    pub referral_tx_count: i64,
    pub referral_profit: String,
}
