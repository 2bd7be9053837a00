use crate::bity::{estimate_bity_trade, FiatProvider};
use crate::entity::{
    AppError, BityTrade, Currency, DexTrade, Fees, MultiTrade, MultiTradeRequest, Trade,
    TradeExact, TradeRequest,
};
use crate::ethereum::paraswap::{QuoteService, Side, TokenRepository};
use crate::ethereum::{amount_to_decimal, amount_to_int};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

#[async_trait]
pub trait RateInteractor: Send + Sync {
    /// Quote a token swap through the DEX aggregator
    async fn get_dex_rate(&self, request: &TradeRequest) -> Result<DexTrade, AppError>;

    /// Quote a crypto to fiat conversion with the fiat provider
    async fn get_bity_rate(&self, request: &TradeRequest) -> Result<(BityTrade, Option<Fees>), AppError>;

    /// Quote the whole payment, chaining a swap into ETH when the provider
    /// does not take the input currency directly
    async fn get_multi_trade_rate(&self, request: &MultiTradeRequest) -> Result<MultiTrade, AppError>;

    async fn is_token_exchangeable(&self, address: &str) -> Result<bool, AppError>;
}

pub struct RateInteractorImpl {
    quote_service: Arc<dyn QuoteService>,
    token_repository: Arc<dyn TokenRepository>,
    fiat_provider: Arc<dyn FiatProvider>,
}

impl RateInteractorImpl {
    pub fn new(
        quote_service: Arc<dyn QuoteService>,
        token_repository: Arc<dyn TokenRepository>,
        fiat_provider: Arc<dyn FiatProvider>,
    ) -> Self {
        Self {
            quote_service,
            token_repository,
            fiat_provider,
        }
    }
}

#[async_trait]
impl RateInteractor for RateInteractorImpl {
    async fn get_dex_rate(&self, request: &TradeRequest) -> Result<DexTrade, AppError> {
        let (side, amount_currency) = match request.trade_exact {
            TradeExact::Input => (Side::Sell, &request.input_currency),
            TradeExact::Output => (Side::Buy, &request.output_currency),
        };
        let amount = amount_to_int(&request.amount, amount_currency.decimals)
            .map_err(|_| AppError::InvalidAmount)?;

        let price = self
            .quote_service
            .get_rate(&request.input_currency, &request.output_currency, amount, side)
            .await
            .map_err(|e| {
                warn!(
                    "No DEX rate for {} -> {}: {}",
                    request.input_currency, request.output_currency, e
                );
                AppError::RateUnavailable(e.to_string())
            })?;

        let input_amount =
            amount_to_decimal(&price.price_route.src_amount, request.input_currency.decimals)
                .map_err(|e| AppError::ParaswapApi(e.to_string()))?;
        let output_amount =
            amount_to_decimal(&price.price_route.dest_amount, request.output_currency.decimals)
                .map_err(|e| AppError::ParaswapApi(e.to_string()))?;

        debug!(
            "DEX rate: {} {} -> {} {}",
            input_amount, request.input_currency, output_amount, request.output_currency
        );

        Ok(DexTrade {
            trade_request: request.clone(),
            input_amount,
            output_amount,
            dex_metadata: price.raw,
        })
    }

    async fn get_bity_rate(&self, request: &TradeRequest) -> Result<(BityTrade, Option<Fees>), AppError> {
        estimate_bity_trade(self.fiat_provider.as_ref(), request)
            .await
            .map_err(|e| {
                warn!(
                    "No Bity rate for {} -> {}: {}",
                    request.input_currency, request.output_currency, e
                );
                AppError::RateUnavailable(e.to_string())
            })
    }

    async fn get_multi_trade_rate(&self, request: &MultiTradeRequest) -> Result<MultiTrade, AppError> {
        let trade_request = &request.trade_request;
        if !trade_request.output_currency.is_supported_fiat() {
            return Err(AppError::UnsupportedCurrency(
                trade_request.output_currency.symbol.clone(),
            ));
        }

        let trades: Vec<Trade>;
        let fees: Option<Fees>;
        if self
            .fiat_provider
            .accepts_input(&trade_request.input_currency.symbol)
        {
            let (bity, bity_fees) = self.get_bity_rate(trade_request).await?;
            trades = vec![Trade::Bity(bity)];
            fees = bity_fees;
        } else {
            let bridge = Currency::ether();
            match trade_request.trade_exact {
                TradeExact::Input => {
                    let dex = self
                        .get_dex_rate(&TradeRequest::new(
                            trade_request.input_currency.clone(),
                            bridge.clone(),
                            &trade_request.amount,
                            TradeExact::Input,
                        ))
                        .await?;
                    let (bity, bity_fees) = self
                        .get_bity_rate(&TradeRequest::new(
                            bridge,
                            trade_request.output_currency.clone(),
                            &dex.output_amount,
                            TradeExact::Input,
                        ))
                        .await?;
                    trades = vec![Trade::Dex(dex), Trade::Bity(bity)];
                    fees = bity_fees;
                }
                TradeExact::Output => {
                    let (bity, bity_fees) = self
                        .get_bity_rate(&TradeRequest::new(
                            bridge.clone(),
                            trade_request.output_currency.clone(),
                            &trade_request.amount,
                            TradeExact::Output,
                        ))
                        .await?;
                    let dex = self
                        .get_dex_rate(&TradeRequest::new(
                            trade_request.input_currency.clone(),
                            bridge,
                            &bity.input_amount,
                            TradeExact::Output,
                        ))
                        .await?;
                    trades = vec![Trade::Dex(dex), Trade::Bity(bity)];
                    fees = bity_fees;
                }
            }
        }

        let input_amount = trades
            .first()
            .map(|t| t.input_amount().to_string())
            .unwrap_or_default();
        let output_amount = trades
            .last()
            .map(|t| t.output_amount().to_string())
            .unwrap_or_default();

        info!(
            "Multi-trade rate: {} {} -> {} {} in {} trade(s)",
            input_amount,
            trade_request.input_currency,
            output_amount,
            trade_request.output_currency,
            trades.len()
        );

        Ok(MultiTrade {
            multi_trade_request: request.clone(),
            trades,
            input_amount,
            output_amount,
            fees,
        })
    }

    async fn is_token_exchangeable(&self, address: &str) -> Result<bool, AppError> {
        let token = self
            .token_repository
            .find_token(address)
            .await
            .map_err(|e| AppError::ParaswapApi(e.to_string()))?;
        Ok(token.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bity::client::MockFiatProvider;
    use crate::bity::models::{EstimateAmount, EstimateResponse};
    use crate::ethereum::paraswap::models::{ParaswapError, PriceResponse, PriceRoute};
    use crate::ethereum::paraswap::quote_service::MockQuoteService;
    use alloy::primitives::U256;
    use serde_json::json;

    struct StaticTokens(Vec<Currency>);

    #[async_trait]
    impl TokenRepository for StaticTokens {
        async fn get_tokens(&self) -> Result<Vec<Currency>, ParaswapError> {
            Ok(self.0.clone())
        }
    }

    fn dai() -> Currency {
        Currency::token("DAI", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18)
    }

    fn price(src_amount: &str, dest_amount: &str) -> PriceResponse {
        PriceResponse {
            price_route: PriceRoute {
                src_token: None,
                dest_token: None,
                src_amount: src_amount.to_string(),
                dest_amount: dest_amount.to_string(),
                token_transfer_proxy: None,
                gas_cost: None,
            },
            raw: json!({"srcAmount": src_amount, "destAmount": dest_amount}),
        }
    }

    fn estimate(input: &str, output: &str) -> EstimateResponse {
        EstimateResponse {
            input: EstimateAmount {
                currency: "ETH".to_string(),
                amount: input.to_string(),
                minimum_amount: None,
            },
            output: EstimateAmount {
                currency: "EUR".to_string(),
                amount: output.to_string(),
                minimum_amount: None,
            },
            price_breakdown: None,
        }
    }

    fn interactor(quotes: MockQuoteService, fiat: MockFiatProvider) -> RateInteractorImpl {
        RateInteractorImpl::new(
            Arc::new(quotes),
            Arc::new(StaticTokens(vec![dai()])),
            Arc::new(fiat),
        )
    }

    #[tokio::test]
    async fn dex_rate_normalizes_decimals() {
        let mut quotes = MockQuoteService::new();
        quotes
            .expect_get_rate()
            .withf(|_, _, amount, side| {
                *side == Side::Sell && *amount == U256::from(1_500_000_000_000_000_000u128)
            })
            .returning(|_, _, _, _| Ok(price("1500000000000000000", "300000")));

        let rates = interactor(quotes, MockFiatProvider::new());
        let request =
            TradeRequest::new(Currency::ether(), Currency::fiat("EUR"), "1.5", TradeExact::Input);
        let trade = rates.get_dex_rate(&request).await.unwrap();

        assert_eq!(trade.input_amount, "1.5");
        assert_eq!(trade.output_amount, "3000");
        assert_eq!(trade.dex_metadata["destAmount"], "300000");
    }

    #[tokio::test]
    async fn output_exact_quotes_a_buy() {
        let mut quotes = MockQuoteService::new();
        quotes
            .expect_get_rate()
            .withf(|_, _, amount, side| *side == Side::Buy && *amount == U256::from(10u64.pow(18)))
            .returning(|_, _, _, _| Ok(price("250000000000000000000", "1000000000000000000")));

        let rates = interactor(quotes, MockFiatProvider::new());
        let request = TradeRequest::new(dai(), Currency::ether(), "1", TradeExact::Output);
        let trade = rates.get_dex_rate(&request).await.unwrap();

        assert_eq!(trade.input_amount, "250");
        assert_eq!(trade.output_amount, "1");
    }

    #[tokio::test]
    async fn missing_route_is_rate_unavailable() {
        let mut quotes = MockQuoteService::new();
        quotes
            .expect_get_rate()
            .returning(|_, _, _, _| Err(ParaswapError::NoRoute("ESTIMATED_LOSS_GREATER_THAN_MAX_IMPACT".to_string())));

        let rates = interactor(quotes, MockFiatProvider::new());
        let request = TradeRequest::new(dai(), Currency::ether(), "1", TradeExact::Input);
        let err = rates.get_dex_rate(&request).await.unwrap_err();
        assert!(matches!(err, AppError::RateUnavailable(_)));
    }

    #[tokio::test]
    async fn eth_input_goes_straight_to_bity() {
        let mut fiat = MockFiatProvider::new();
        fiat.expect_accepts_input().returning(|symbol| symbol == "ETH");
        fiat.expect_estimate()
            .returning(|_| Ok(estimate("1.5", "2700.12")));

        let rates = interactor(MockQuoteService::new(), fiat);
        let request = MultiTradeRequest {
            trade_request: TradeRequest::new(
                Currency::ether(),
                Currency::fiat("EUR"),
                "1.5",
                TradeExact::Input,
            ),
            bank_info: None,
            eth_info: None,
        };
        let multi = rates.get_multi_trade_rate(&request).await.unwrap();

        assert_eq!(multi.trades.len(), 1);
        assert!(multi.dex_trade().is_none());
        assert_eq!(multi.input_amount, "1.5");
        assert_eq!(multi.output_amount, "2700.12");
    }

    #[tokio::test]
    async fn token_input_swaps_into_eth_first() {
        let mut quotes = MockQuoteService::new();
        quotes
            .expect_get_rate()
            .returning(|_, _, _, _| Ok(price("500000000000000000000", "2000000000000000000")));
        let mut fiat = MockFiatProvider::new();
        fiat.expect_accepts_input().returning(|symbol| symbol == "ETH");
        fiat.expect_estimate()
            .withf(|req| req.input.amount.as_deref() == Some("2"))
            .returning(|_| Ok(estimate("2", "3600")));

        let rates = interactor(quotes, fiat);
        let request = MultiTradeRequest {
            trade_request: TradeRequest::new(dai(), Currency::fiat("EUR"), "500", TradeExact::Input),
            bank_info: None,
            eth_info: None,
        };
        let multi = rates.get_multi_trade_rate(&request).await.unwrap();

        assert_eq!(multi.trades.len(), 2);
        assert_eq!(multi.dex_trade().unwrap().output_amount, "2");
        assert_eq!(multi.input_amount, "500");
        assert_eq!(multi.output_amount, "3600");
    }

    #[tokio::test]
    async fn output_exact_asks_bity_first() {
        let mut quotes = MockQuoteService::new();
        quotes
            .expect_get_rate()
            .withf(|_, _, amount, side| {
                *side == Side::Buy && *amount == U256::from(2_000_000_000_000_000_000u128)
            })
            .returning(|_, _, _, _| Ok(price("500000000000000000000", "2000000000000000000")));
        let mut fiat = MockFiatProvider::new();
        fiat.expect_accepts_input().returning(|symbol| symbol == "ETH");
        fiat.expect_estimate()
            .returning(|_| Ok(estimate("2", "3600")));

        let rates = interactor(quotes, fiat);
        let request = MultiTradeRequest {
            trade_request: TradeRequest::new(dai(), Currency::fiat("EUR"), "3600", TradeExact::Output),
            bank_info: None,
            eth_info: None,
        };
        let multi = rates.get_multi_trade_rate(&request).await.unwrap();

        assert_eq!(multi.input_amount, "500");
        assert_eq!(multi.output_amount, "3600");
    }

    #[tokio::test]
    async fn crypto_output_is_rejected() {
        let rates = interactor(MockQuoteService::new(), MockFiatProvider::new());
        let request = MultiTradeRequest {
            trade_request: TradeRequest::new(dai(), Currency::ether(), "1", TradeExact::Input),
            bank_info: None,
            eth_info: None,
        };
        let err = rates.get_multi_trade_rate(&request).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedCurrency(_)));
    }

    #[tokio::test]
    async fn checks_token_list() {
        let rates = interactor(MockQuoteService::new(), MockFiatProvider::new());
        assert!(rates
            .is_token_exchangeable("0x6b175474e89094c44da98b954eedeac495271d0f")
            .await
            .unwrap());
        assert!(!rates
            .is_token_exchangeable("0x0000000000000000000000000000000000000001")
            .await
            .unwrap());
    }
}
