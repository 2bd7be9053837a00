use crate::entity::{DexTrade, TradeExact};
use crate::ethereum::client::TransactionRequest;
use crate::ethereum::paraswap::models::{
    token_address, ErrorResponse, ParaswapError, PriceRoute, TransactionBuildRequest,
    TransactionResponse,
};
use crate::ethereum::paraswap::Config;
use crate::ethereum::utils::parse_address;
use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::Value;

/// Builds the on-chain swap for a quoted DEX trade
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapService: Send + Sync {
    /// Contract that must be allowed to pull the input token
    fn get_spender(&self, dex_trade: &DexTrade) -> Result<Address, ParaswapError>;

    async fn build_transaction(
        &self,
        dex_trade: &DexTrade,
        user_address: Address,
    ) -> Result<TransactionRequest, ParaswapError>;
}

pub struct ParaswapSwapService {
    http_client: Client,
    config: Config,
}

impl ParaswapSwapService {
    pub fn new(config: Config) -> Self {
        Self {
            http_client: Client::new(),
            config,
        }
    }

    fn build_request(
        &self,
        dex_trade: &DexTrade,
        user_address: Address,
    ) -> Result<TransactionBuildRequest, ParaswapError> {
        let request = &dex_trade.trade_request;
        let route: PriceRoute = serde_json::from_value(dex_trade.dex_metadata.clone())
            .map_err(|e| ParaswapError::Api(format!("invalid price route: {}", e)))?;

        let (src_amount, dest_amount) = match request.trade_exact {
            TradeExact::Input => (Some(route.src_amount), None),
            TradeExact::Output => (None, Some(route.dest_amount)),
        };

        Ok(TransactionBuildRequest {
            src_token: token_address(&request.input_currency)?,
            dest_token: token_address(&request.output_currency)?,
            src_amount,
            dest_amount,
            slippage: self.config.slippage_bps,
            price_route: dex_trade.dex_metadata.clone(),
            user_address: user_address.to_string(),
            partner: self.config.partner.clone(),
            src_decimals: request.input_currency.decimals,
            dest_decimals: request.output_currency.decimals,
        })
    }
}

/// Turn the aggregator's transaction into a wallet request
pub fn to_transaction_request(
    tx: TransactionResponse,
    user_address: Address,
) -> Result<TransactionRequest, ParaswapError> {
    let to = parse_address(&tx.to)
        .ok_or_else(|| ParaswapError::Api(format!("invalid transaction target {}", tx.to)))?;
    let value = U256::from_str_radix(&tx.value, 10)
        .map_err(|_| ParaswapError::Api(format!("invalid transaction value {}", tx.value)))?;
    let data: Bytes = tx
        .data
        .parse()
        .map_err(|e| ParaswapError::Api(format!("invalid transaction data: {}", e)))?;

    let request = TransactionRequest::default()
        .from(user_address)
        .to(to)
        .value(value)
        .input(data.into());

    match tx.gas {
        Some(gas) => {
            let gas = gas
                .parse::<u64>()
                .map_err(|_| ParaswapError::Api(format!("invalid gas {}", gas)))?;
            Ok(request.gas_limit(gas))
        }
        None => Ok(request),
    }
}

#[async_trait]
impl SwapService for ParaswapSwapService {
    fn get_spender(&self, dex_trade: &DexTrade) -> Result<Address, ParaswapError> {
        dex_trade
            .dex_metadata
            .get("tokenTransferProxy")
            .and_then(Value::as_str)
            .and_then(parse_address)
            .ok_or_else(|| ParaswapError::Api("price route has no tokenTransferProxy".to_string()))
    }

    async fn build_transaction(
        &self,
        dex_trade: &DexTrade,
        user_address: Address,
    ) -> Result<TransactionRequest, ParaswapError> {
        let body = self.build_request(dex_trade, user_address)?;
        let url = format!(
            "{}/transactions/{}?ignoreChecks=true",
            self.config.api_url, self.config.network_id
        );

        debug!("Requesting swap transaction for user {}", user_address);

        let response = self.http_client.post(&url).json(&body).send().await?;
        let status = response.status();
        let value: Value = response.json().await?;

        if let Ok(ErrorResponse { error }) = serde_json::from_value::<ErrorResponse>(value.clone()) {
            error!("ParaSwap API error [build_transaction]: {}", error);
            return Err(ParaswapError::from_api_message(&error));
        }
        if !status.is_success() {
            return Err(ParaswapError::Api(format!("{}: {}", status, value)));
        }

        let tx: TransactionResponse = serde_json::from_value(value)
            .map_err(|e| ParaswapError::Api(format!("invalid transaction response: {}", e)))?;
        info!("Swap transaction received: to={}, value={}", tx.to, tx.value);

        to_transaction_request(tx, user_address)
    }
}
