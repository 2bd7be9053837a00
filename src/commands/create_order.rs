use crate::bity::BityError;
use crate::entity::{BankInfo, EthInfo, Trade, TradeRequest};
use crate::router::ApiState;
use crate::ethereum::validate_eth_address;
use crate::utils::validate_iban;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub const ROUTE: &str = "/api/bity/createOrder";
pub const DESCRIPTION: &str = "place a Bity fiat order for a trade request";

const NO_BODY: &str = "no body";
const WRONG_BODY: &str = "wrong body";
const UNEXPECTED: &str = "Unexpected server error";

#[derive(Debug, Serialize)]
struct OrderErrorBody {
    message: String,
    #[serde(rename = "_orderError")]
    order_error: bool,
    errors: Value,
}

fn field<T: DeserializeOwned>(body: &Value, name: &str) -> Option<T> {
    body.get(name)
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Body fields of a create-order request, `None` when any is missing or malformed
fn parse_order_body(body: &Value) -> Option<(TradeRequest, BankInfo, EthInfo)> {
    let trade_request: TradeRequest = field(body, "tradeRequest")?;
    let bank_info: BankInfo = field(body, "bankInfo")?;
    let eth_info: EthInfo = field(body, "ethInfo")?;
    let valid = validate_iban(&bank_info.recipient.iban) && validate_eth_address(&eth_info.from_address);
    valid.then_some((trade_request, bank_info, eth_info))
}

pub async fn create_order(State(state): State<ApiState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(Value::Null) | Err(_) => return (StatusCode::BAD_REQUEST, NO_BODY).into_response(),
        Ok(body) => body,
    };

    let Some((trade_request, bank_info, eth_info)) = parse_order_body(&body) else {
        warn!("Rejected createOrder request with incomplete body");
        return (StatusCode::BAD_REQUEST, WRONG_BODY).into_response();
    };

    info!(
        "Creating order {} {} -> {}",
        trade_request.amount, trade_request.input_currency, trade_request.output_currency
    );

    match state
        .order_interactor
        .create_order(&trade_request, &bank_info, &eth_info)
        .await
    {
        Ok(trade) => Json(Trade::Bity(trade)).into_response(),
        Err(BityError::Order { message, errors }) => {
            warn!("Bity refused the order: {}", message);
            let errors = serde_json::to_value(errors).unwrap_or(Value::Array(vec![]));
            (
                StatusCode::BAD_REQUEST,
                Json(OrderErrorBody {
                    message,
                    order_error: true,
                    errors,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to create order: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED).into_response()
        }
    }
}
