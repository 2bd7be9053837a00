use crate::bity::config::Config;
use crate::bity::models::{
    AccessTokenResponse, BityError, BityOrder, ErrorBody, EstimateRequest, EstimateResponse,
    MessageToSign, OrderRequest,
};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Refresh the access token this long before it actually expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);
const EXCHANGE_SCOPE: &str = "https://auth.bity.com/scopes/exchange.place";

/// Fiat settlement provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FiatProvider: Send + Sync {
    /// Whether the provider takes `symbol` as order input directly
    fn accepts_input(&self, symbol: &str) -> bool;

    async fn estimate(&self, request: &EstimateRequest) -> Result<EstimateResponse, BityError>;

    /// Place an order and return the stored order document
    async fn create_order(&self, request: &OrderRequest) -> Result<BityOrder, BityError>;

    async fn get_order(&self, order_id: &str) -> Result<BityOrder, BityError>;

    /// Send the signed ownership message back to the provider
    async fn submit_signature(
        &self,
        message: &MessageToSign,
        signature: &str,
    ) -> Result<(), BityError>;
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct BityClient {
    http_client: Client,
    config: Config,
    token: RwLock<Option<AccessToken>>,
}

impl BityClient {
    pub fn new(config: Config) -> Self {
        Self {
            http_client: Client::new(),
            config,
            token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> Result<Url, BityError> {
        resolve_url(&self.config.api_url, path)
    }

    async fn access_token(&self) -> Result<Option<String>, BityError> {
        if self.config.client_id.is_empty() {
            return Ok(None);
        }

        if let Some(token) = self.token.read().await.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(Some(token.value.clone()));
            }
        }

        let mut slot = self.token.write().await;
        // another task may have refreshed it while we waited for the lock
        if let Some(token) = slot.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(Some(token.value.clone()));
            }
        }

        debug!("Requesting Bity access token");
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", EXCHANGE_SCOPE),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Bity auth failed: {} {}", status, body);
            return Err(BityError::Auth(format!("{}: {}", status, body)));
        }

        let token: AccessTokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600).max(0) as u64);
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);
        info!("Bity access token acquired, valid for {}s", lifetime.as_secs());

        *slot = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(Some(token.access_token))
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, BityError> {
        Ok(match self.access_token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

/// Resolve `path` against the API base; absolute paths keep only the origin
pub fn resolve_url(base: &str, path: &str) -> Result<Url, BityError> {
    let base = Url::parse(base).map_err(|e| BityError::Unexpected(format!("bad base url: {}", e)))?;
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path).map_err(|e| BityError::Unexpected(format!("bad url: {}", e)));
    }
    if path.starts_with('/') {
        return base
            .join(path)
            .map_err(|e| BityError::Unexpected(format!("bad url: {}", e)));
    }
    Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), path))
        .map_err(|e| BityError::Unexpected(format!("bad url: {}", e)))
}

/// Turn an error response into `BityError::Order` (4xx) or `Unexpected`
pub fn error_from_body(status: reqwest::StatusCode, body: &str) -> BityError {
    let errors = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.errors)
        .unwrap_or_default();

    if status.is_client_error() && !errors.is_empty() {
        let message = errors
            .iter()
            .filter_map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join(", ");
        let message = if message.is_empty() {
            "Bity order error".to_string()
        } else {
            message
        };
        BityError::Order { message, errors }
    } else {
        BityError::Unexpected(format!("{}: {}", status, body))
    }
}

async fn check(response: Response, operation: &str) -> Result<Response, BityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!("Bity API error [{}]: {} {}", operation, status, body);
    Err(error_from_body(status, &body))
}

#[async_trait]
impl FiatProvider for BityClient {
    fn accepts_input(&self, symbol: &str) -> bool {
        self.config.accepts_input(symbol)
    }

    async fn estimate(&self, request: &EstimateRequest) -> Result<EstimateResponse, BityError> {
        debug!(
            "Requesting Bity estimate {} -> {}",
            request.input.currency, request.output.currency
        );
        let builder = self
            .http_client
            .post(self.url("orders/estimate")?)
            .json(request);
        let response = check(builder.send().await?, "estimate").await?;
        let estimate: EstimateResponse = response.json().await?;
        info!(
            "Bity estimate: {} {} -> {} {}",
            estimate.input.amount,
            estimate.input.currency,
            estimate.output.amount,
            estimate.output.currency
        );
        Ok(estimate)
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<BityOrder, BityError> {
        debug!(
            "Placing Bity order {} -> {}",
            request.input.currency, request.output.currency
        );
        let builder = self
            .authorized(self.http_client.post(self.url("orders")?).json(request))
            .await?;
        let response = check(builder.send().await?, "create_order").await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| BityError::Unexpected("order created without location".to_string()))?;

        let builder = self
            .authorized(self.http_client.get(self.url(&location)?))
            .await?;
        let response = check(builder.send().await?, "create_order").await?;
        let order: BityOrder = response.json().await?;
        info!("Bity order created: {}", order.id);
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> Result<BityOrder, BityError> {
        debug!("Fetching Bity order {}", order_id);
        let builder = self
            .authorized(self.http_client.get(self.url(&format!("orders/{}", order_id))?))
            .await?;
        let response = check(builder.send().await?, "get_order").await?;
        Ok(response.json().await?)
    }

    async fn submit_signature(
        &self,
        message: &MessageToSign,
        signature: &str,
    ) -> Result<(), BityError> {
        let url = self.url(&message.signature_submission_url)?;
        debug!("Submitting ownership signature to {}", url);
        let builder = self
            .authorized(
                self.http_client
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, "text/plain")
                    .body(signature.to_string()),
            )
            .await?;
        check(builder.send().await?, "submit_signature").await?;
        info!("Ownership signature accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let base = "https://exchange.api.bity.com/v2";
        assert_eq!(
            resolve_url(base, "orders/estimate").unwrap().as_str(),
            "https://exchange.api.bity.com/v2/orders/estimate"
        );
        assert_eq!(
            resolve_url(base, "/v2/orders/42/signature").unwrap().as_str(),
            "https://exchange.api.bity.com/v2/orders/42/signature"
        );
        assert_eq!(
            resolve_url(base, "https://other.example/x").unwrap().as_str(),
            "https://other.example/x"
        );
    }

    #[test]
    fn client_errors_with_details_are_order_errors() {
        let body = r#"{"errors":[{"code":"amount_too_low","message":"Amount too low"}]}"#;
        match error_from_body(StatusCode::BAD_REQUEST, body) {
            BityError::Order { message, errors } => {
                assert_eq!(message, "Amount too low");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code.as_deref(), Some("amount_too_low"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn server_errors_are_unexpected() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, BityError::Unexpected(_)));

        let err = error_from_body(StatusCode::BAD_REQUEST, "not json");
        assert!(matches!(err, BityError::Unexpected(_)));
    }
}
