use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BityErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum BityError {
    /// Order rejected by Bity (amount out of bounds, invalid IBAN...)
    #[error("{message}")]
    Order {
        message: String,
        errors: Vec<BityErrorDetail>,
    },

    #[error("Bity authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected Bity response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<BityErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateRequest {
    pub input: CurrencyAmount,
    pub output: CurrencyAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateAmount {
    pub currency: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub input: EstimateAmount,
    pub output: EstimateAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_breakdown: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInput {
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOwner {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutput {
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(rename = "type")]
    pub output_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic_swift: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OrderOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub input: OrderInput,
    pub output: OrderOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub crypto_address: String,
    #[serde(rename = "type", default)]
    pub payment_type: Option<String>,
}

/// Message Bity asks the sender to sign to prove ownership of the address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToSign {
    pub body: String,
    pub signature_submission_url: String,
}

/// Order document as returned by `GET /orders/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BityOrder {
    pub id: String,
    pub input: OrderInput,
    pub output: OrderOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_breakdown: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_to_sign: Option<MessageToSign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_awaiting_payment_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_price_guaranteed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_payment_received: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_executed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_cancelled: Option<String>,
}

/// Lifecycle of a fiat order as seen by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BityOrderStatus {
    Waiting,
    Received,
    Executed,
    Cancelled,
    Expired,
}

impl BityOrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BityOrderStatus::Executed | BityOrderStatus::Cancelled | BityOrderStatus::Expired
        )
    }
}

/// Bity timestamps come with or without a zone; zoneless ones are UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl BityOrder {
    pub fn deposit_address(&self) -> Option<&str> {
        self.payment_details
            .as_ref()
            .map(|d| d.crypto_address.as_str())
    }

    pub fn price_guaranteed_until(&self) -> Option<DateTime<Utc>> {
        self.timestamp_price_guaranteed
            .as_deref()
            .and_then(parse_timestamp)
    }

    pub fn status(&self, now: DateTime<Utc>) -> BityOrderStatus {
        if self.timestamp_executed.is_some() {
            return BityOrderStatus::Executed;
        }
        if self.timestamp_cancelled.is_some() {
            return BityOrderStatus::Cancelled;
        }
        if self.timestamp_payment_received.is_some() {
            return BityOrderStatus::Received;
        }
        let expired = self
            .timestamp_awaiting_payment_limit
            .as_deref()
            .and_then(parse_timestamp)
            .map(|limit| limit < now)
            .unwrap_or(false);
        if expired {
            BityOrderStatus::Expired
        } else {
            BityOrderStatus::Waiting
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn order(extra: Value) -> BityOrder {
        let mut value = json!({
            "id": "c4e2a3a0",
            "input": {"currency": "ETH", "amount": "1.5", "type": "crypto_address", "crypto_address": "0xabc"},
            "output": {"currency": "EUR", "amount": "2700.12", "type": "bank_account"},
            "payment_details": {"crypto_address": "0xdeposit", "type": "crypto_address"},
            "timestamp_awaiting_payment_limit": "2020-05-12T12:10:00Z"
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn derives_status_from_timestamps() {
        let before_limit = Utc.with_ymd_and_hms(2020, 5, 12, 12, 0, 0).unwrap();
        let after_limit = before_limit + Duration::minutes(30);

        assert_eq!(order(json!({})).status(before_limit), BityOrderStatus::Waiting);
        assert_eq!(order(json!({})).status(after_limit), BityOrderStatus::Expired);
        assert_eq!(
            order(json!({"timestamp_payment_received": "2020-05-12T12:05:00"})).status(after_limit),
            BityOrderStatus::Received
        );
        assert_eq!(
            order(json!({"timestamp_executed": "2020-05-12T12:06:00"})).status(after_limit),
            BityOrderStatus::Executed
        );
        assert_eq!(
            order(json!({"timestamp_cancelled": "2020-05-12T12:06:00"})).status(before_limit),
            BityOrderStatus::Cancelled
        );
    }

    #[test]
    fn parses_zoneless_timestamps_as_utc() {
        let parsed = parse_timestamp("2020-05-12T12:10:00.123").unwrap();
        assert_eq!(parsed.timestamp(), 1589285400);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn exposes_deposit_address() {
        assert_eq!(order(json!({})).deposit_address(), Some("0xdeposit"));
    }
}
