use crate::entity::Currency;
use crate::ethereum::paraswap::models::{ParaswapError, TokenListResponse};
use crate::ethereum::paraswap::Config;
use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use std::sync::Mutex;

/// Repository for tokens the aggregator can swap
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn get_tokens(&self) -> Result<Vec<Currency>, ParaswapError>;

    /// Look a token up by contract address, ignoring case
    async fn find_token(&self, address: &str) -> Result<Option<Currency>, ParaswapError> {
        let tokens = self.get_tokens().await?;
        Ok(tokens.into_iter().find(|token| {
            token
                .address
                .as_deref()
                .map(|a| a.eq_ignore_ascii_case(address))
                .unwrap_or(false)
        }))
    }
}

/// Token list fetched from ParaSwap once and kept in memory
pub struct ParaswapTokenRepository {
    http_client: Client,
    config: Config,
    token_cache: Mutex<Option<Vec<Currency>>>,
}

impl ParaswapTokenRepository {
    pub fn new(config: Config) -> Self {
        Self {
            http_client: Client::new(),
            config,
            token_cache: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<Vec<Currency>> {
        self.token_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl TokenRepository for ParaswapTokenRepository {
    async fn get_tokens(&self) -> Result<Vec<Currency>, ParaswapError> {
        if let Some(tokens) = self.cached() {
            return Ok(tokens);
        }

        let url = format!("{}/tokens/{}", self.config.api_url, self.config.network_id);
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            error!("Failed to fetch token list from ParaSwap: {}", e);
            ParaswapError::Request(e)
        })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("ParaSwap API error [get_tokens]: {}", error_text);
            return Err(ParaswapError::Api(error_text));
        }

        let list: TokenListResponse = response.json().await?;
        let tokens: Vec<Currency> = list.tokens.into_iter().map(Currency::from).collect();
        info!("Loaded {} tokens from ParaSwap", tokens.len());

        *self
            .token_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tokens.clone());

        Ok(tokens)
    }
}
