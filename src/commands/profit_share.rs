use crate::entity::AppError;
use crate::router::ApiState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};

pub const ROUTE: &str = "/api/user/profitshare";
pub const DESCRIPTION: &str = "referral earnings of the authenticated user";

pub async fn profit_share(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let claims = match state.token_verifier.verify_header(&headers) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Rejected profitshare request: {}", e);
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    match state
        .profit_share_interactor
        .get_profit_share(&claims.iss)
        .await
    {
        Ok(share) => Json(share).into_response(),
        Err(AppError::UserNotFound) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            error!("Failed to compute profit share for {}: {}", claims.iss, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected server error").into_response()
        }
    }
}
