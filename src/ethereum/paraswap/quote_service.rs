use crate::entity::Currency;
use crate::ethereum::paraswap::models::{
    token_address, ErrorResponse, ParaswapError, PriceResponse, PriceRoute, Side,
};
use crate::ethereum::paraswap::Config;
use alloy::primitives::U256;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::Value;

/// Price quotes for token-to-token swaps
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Quote a swap of `amount` base units; the amount is the source
    /// amount for `Side::Sell` and the destination amount for `Side::Buy`.
    async fn get_rate(
        &self,
        src: &Currency,
        dest: &Currency,
        amount: U256,
        side: Side,
    ) -> Result<PriceResponse, ParaswapError>;
}

pub struct ParaswapQuoteService {
    http_client: Client,
    config: Config,
}

impl ParaswapQuoteService {
    pub fn new(config: Config) -> Self {
        Self {
            http_client: Client::new(),
            config,
        }
    }
}

/// Read a price response, turning `{"error": ...}` bodies into errors
pub fn parse_price_response(value: Value) -> Result<PriceResponse, ParaswapError> {
    if let Ok(ErrorResponse { error }) = serde_json::from_value::<ErrorResponse>(value.clone()) {
        return Err(ParaswapError::from_api_message(&error));
    }

    let raw = value
        .get("priceRoute")
        .cloned()
        .ok_or_else(|| ParaswapError::Api("response has no priceRoute".to_string()))?;
    let price_route: PriceRoute = serde_json::from_value(raw.clone())
        .map_err(|e| ParaswapError::Api(format!("invalid priceRoute: {}", e)))?;

    if price_route.dest_amount == "0" || price_route.src_amount == "0" {
        return Err(ParaswapError::NoRoute("empty route".to_string()));
    }

    Ok(PriceResponse { price_route, raw })
}

#[async_trait]
impl QuoteService for ParaswapQuoteService {
    async fn get_rate(
        &self,
        src: &Currency,
        dest: &Currency,
        amount: U256,
        side: Side,
    ) -> Result<PriceResponse, ParaswapError> {
        let src_token = token_address(src)?;
        let dest_token = token_address(dest)?;
        let url = format!("{}/prices", self.config.api_url);

        debug!(
            "Requesting {} rate {} {} -> {} on network {}",
            side, amount, src.symbol, dest.symbol, self.config.network_id
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("srcToken", src_token),
                ("destToken", dest_token),
                ("amount", amount.to_string()),
                ("srcDecimals", src.decimals.to_string()),
                ("destDecimals", dest.decimals.to_string()),
                ("side", side.to_string()),
                ("network", self.config.network_id.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() && body.get("error").is_none() {
            error!("ParaSwap API error [get_rate]: {} {}", status, body);
            return Err(ParaswapError::Api(format!("{}: {}", status, body)));
        }

        let price = parse_price_response(body)?;
        info!(
            "Rate received: src_amount={}, dest_amount={}",
            price.price_route.src_amount, price.price_route.dest_amount
        );
        Ok(price)
    }
}
