use crate::bity::{create_bity_trade, BityError, FiatProvider};
use crate::entity::{
    BankInfo, BityTrade, EthInfo, MultiTrade, NewOrderRecord, Payment, PaymentStepId, TradeRequest,
};
use crate::interactor::db::OrderRepository;
use crate::utils::shorten_address;
use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderInteractor: Send + Sync {
    /// Place a fiat order and record it for referral accounting
    async fn create_order(
        &self,
        request: &TradeRequest,
        bank_info: &BankInfo,
        eth_info: &EthInfo,
    ) -> Result<BityTrade, BityError>;
}

pub struct OrderInteractorImpl {
    fiat_provider: Arc<dyn FiatProvider>,
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderInteractorImpl {
    pub fn new(
        fiat_provider: Arc<dyn FiatProvider>,
        order_repository: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            fiat_provider,
            order_repository,
        }
    }
}

#[async_trait]
impl OrderInteractor for OrderInteractorImpl {
    async fn create_order(
        &self,
        request: &TradeRequest,
        bank_info: &BankInfo,
        eth_info: &EthInfo,
    ) -> Result<BityTrade, BityError> {
        let trade =
            create_bity_trade(self.fiat_provider.as_ref(), request, bank_info, eth_info).await?;

        if let Some(order_id) = trade.order_id() {
            let record = NewOrderRecord {
                bity_order_id: order_id.to_string(),
                eth_address: eth_info.from_address.clone(),
                input_currency: request.input_currency.symbol.clone(),
                eth_amount: trade.input_amount.clone(),
                fiat_currency: request.output_currency.symbol.clone(),
                fiat_amount: trade.output_amount.clone(),
                referral_id: eth_info.referral_id.clone(),
            };
            match self.order_repository.record_order(&record).await {
                Ok(Some(saved)) => info!(
                    "Order {} from {} saved as #{}",
                    order_id,
                    shorten_address(&saved.eth_address),
                    saved.id
                ),
                Ok(None) => info!("Order {} was already recorded", order_id),
                Err(e) => error!("Failed to record order {}: {}", order_id, e),
            }
        }

        Ok(trade)
    }
}

/// Steps needed to carry out a multi-trade, in execution order
pub fn payment_steps(multi_trade: &MultiTrade) -> Vec<PaymentStepId> {
    let mut steps = Vec::with_capacity(4);
    if let Some(dex) = multi_trade.dex_trade() {
        if !dex.trade_request.input_currency.is_ether() {
            steps.push(PaymentStepId::Allowance);
        }
        steps.push(PaymentStepId::Trade);
    }
    steps.push(PaymentStepId::Payment);
    steps.push(PaymentStepId::Bity);
    steps
}

/// Fresh payment for a confirmed multi-trade, every step queued
pub fn create_payment(multi_trade: &MultiTrade) -> Payment {
    Payment::new(&payment_steps(multi_trade))
}
