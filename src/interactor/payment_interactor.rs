use crate::bity::models::BityOrderStatus;
use crate::bity::{BityOrder, FiatProvider};
use crate::entity::{
    Currency, DexTrade, MultiTrade, Payment, PaymentError, PaymentStepId, PaymentStepStatus,
};
use crate::ethereum::ens::lookup_address;
use crate::ethereum::erc20::{self, get_allowance, get_token_balance, transfer_calldata, with_gas_limit};
use crate::ethereum::paraswap::SwapService;
use crate::ethereum::utils::parse_address;
use crate::ethereum::{
    amount_to_int, EthereumClient, RpcError, TransactionReceipt, TransactionRequest, Wallet,
    WalletError,
};
use crate::interactor::order_interactor::OrderInteractor;
use crate::utils::shorten_address;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Delay between two receipt lookups while a transaction is pending
    pub receipt_poll_interval: Duration,
    /// Give up waiting for a transaction after this long
    pub receipt_timeout: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            receipt_poll_interval: Duration::from_secs(4),
            receipt_timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[async_trait]
pub trait PaymentInteractor: Send + Sync {
    /// Run every step of `payment` in order, publishing each transition.
    /// Stops at the first failure, which is recorded on the failing step.
    async fn execute(
        &self,
        multi_trade: &mut MultiTrade,
        payment: &watch::Sender<Payment>,
    ) -> Result<(), PaymentError>;
}

struct StepFailure {
    step: PaymentStepId,
    error: PaymentError,
}

fn at(step: PaymentStepId) -> impl Fn(PaymentError) -> StepFailure {
    move |error| StepFailure { step, error }
}

fn unknown(error: impl Display) -> PaymentError {
    PaymentError::Unknown(error.to_string())
}

fn rpc(error: RpcError) -> PaymentError {
    WalletError::from_rpc(error).into()
}

fn token_contract(currency: &Currency) -> Result<Address, PaymentError> {
    currency
        .address
        .as_deref()
        .and_then(parse_address)
        .ok_or_else(|| unknown(format!("{} has no valid contract address", currency)))
}

fn set_status(payment: &watch::Sender<Payment>, id: PaymentStepId, status: PaymentStepStatus) {
    payment.send_modify(|p| {
        if let Err(e) = p.update_step(id, status) {
            warn!("Ignoring step update: {}", e);
        }
    });
    debug!("Step {} is now {}", id, status);
}

pub struct PaymentInteractorImpl {
    ethereum_client: Arc<dyn EthereumClient>,
    wallet: Arc<dyn Wallet>,
    swap_service: Arc<dyn SwapService>,
    fiat_provider: Arc<dyn FiatProvider>,
    order_interactor: Arc<dyn OrderInteractor>,
    options: ExecutorOptions,
}

impl PaymentInteractorImpl {
    pub fn new(
        ethereum_client: Arc<dyn EthereumClient>,
        wallet: Arc<dyn Wallet>,
        swap_service: Arc<dyn SwapService>,
        fiat_provider: Arc<dyn FiatProvider>,
        order_interactor: Arc<dyn OrderInteractor>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            ethereum_client,
            wallet,
            swap_service,
            fiat_provider,
            order_interactor,
            options,
        }
    }

    async fn run(
        &self,
        multi_trade: &mut MultiTrade,
        payment: &watch::Sender<Payment>,
    ) -> Result<(), StepFailure> {
        let steps = payment.borrow().step_ids();

        if let Some(dex) = multi_trade.dex_trade().cloned() {
            if steps.contains(&PaymentStepId::Allowance) {
                self.approve_spender(&dex, payment)
                    .await
                    .map_err(at(PaymentStepId::Allowance))?;
            }
            if steps.contains(&PaymentStepId::Trade) {
                self.swap(&dex, payment)
                    .await
                    .map_err(at(PaymentStepId::Trade))?;
            }
        }

        let order = self
            .prepare_order(multi_trade)
            .await
            .map_err(at(PaymentStepId::Payment))?;
        self.pay(multi_trade, &order, payment)
            .await
            .map_err(at(PaymentStepId::Payment))?;

        payment.send_modify(|p| {
            if let Err(e) = p.set_bity_order_id(PaymentStepId::Bity, &order.id) {
                warn!("Cannot attach order to payment: {}", e);
            }
        });
        set_status(payment, PaymentStepId::Bity, PaymentStepStatus::Waiting);
        info!("Payment for order {} sent, waiting for Bity", order.id);
        Ok(())
    }

    /// ENS name of the paying account, or its shortened address
    async fn account_label(&self) -> String {
        let owner = self.wallet.address();
        match lookup_address(self.ethereum_client.as_ref(), owner).await {
            Ok(Some(name)) => name,
            Ok(None) => shorten_address(&owner.to_string()),
            Err(e) => {
                debug!("ENS lookup for {} failed: {}", owner, e);
                shorten_address(&owner.to_string())
            }
        }
    }

    async fn ensure_balance(&self, currency: &Currency, amount: U256) -> Result<(), PaymentError> {
        let owner = self.wallet.address();
        let balance = if currency.is_ether() {
            self.ethereum_client.get_balance(owner).await.map_err(rpc)?
        } else {
            get_token_balance(self.ethereum_client.as_ref(), token_contract(currency)?, owner)
                .await
                .map_err(rpc)?
        };

        if balance < amount {
            warn!(
                "Balance of {} too low: have {}, need {}",
                currency, balance, amount
            );
            return Err(PaymentError::TokenBalanceTooLow);
        }
        Ok(())
    }

    async fn approve_spender(
        &self,
        dex: &DexTrade,
        payment: &watch::Sender<Payment>,
    ) -> Result<(), PaymentError> {
        let input = &dex.trade_request.input_currency;
        let token = token_contract(input)?;
        let amount = amount_to_int(&dex.input_amount, input.decimals).map_err(unknown)?;
        self.ensure_balance(input, amount).await?;

        let spender = self.swap_service.get_spender(dex).map_err(unknown)?;
        let allowance = get_allowance(
            self.ethereum_client.as_ref(),
            token,
            self.wallet.address(),
            spender,
        )
        .await
        .map_err(rpc)?;

        if allowance >= amount {
            info!("Allowance of {} already covers {}", input, amount);
            set_status(payment, PaymentStepId::Allowance, PaymentStepStatus::Done);
            return Ok(());
        }

        set_status(payment, PaymentStepId::Allowance, PaymentStepStatus::Approval);
        let tx_hash = erc20::approve(
            self.ethereum_client.as_ref(),
            self.wallet.as_ref(),
            token,
            spender,
            amount,
        )
        .await?;
        self.mined(payment, PaymentStepId::Allowance, &tx_hash).await
    }

    async fn swap(&self, dex: &DexTrade, payment: &watch::Sender<Payment>) -> Result<(), PaymentError> {
        let input = &dex.trade_request.input_currency;
        if input.is_ether() {
            let amount = amount_to_int(&dex.input_amount, input.decimals).map_err(unknown)?;
            self.ensure_balance(input, amount).await?;
        }

        set_status(payment, PaymentStepId::Trade, PaymentStepStatus::Approval);
        let mut tx = self
            .swap_service
            .build_transaction(dex, self.wallet.address())
            .await
            .map_err(unknown)?;
        if tx.gas.is_none() {
            tx = with_gas_limit(self.ethereum_client.as_ref(), tx)
                .await
                .map_err(rpc)?;
        }

        let tx_hash = self.wallet.send_transaction(tx).await?;
        self.mined(payment, PaymentStepId::Trade, &tx_hash).await
    }

    /// Make sure a live fiat order exists and return its latest state
    async fn prepare_order(&self, multi_trade: &mut MultiTrade) -> Result<BityOrder, PaymentError> {
        let existing = multi_trade
            .bity_trade()
            .and_then(|t| t.bity_order_response.clone());

        let order = match existing {
            Some(order) => order,
            None => {
                let bity = multi_trade
                    .bity_trade()
                    .ok_or_else(|| unknown("multi-trade has no fiat trade"))?;
                let request = &multi_trade.multi_trade_request;
                let bank_info = request
                    .bank_info
                    .as_ref()
                    .ok_or_else(|| unknown("missing bank info"))?;
                let eth_info = request
                    .eth_info
                    .as_ref()
                    .ok_or_else(|| unknown("missing eth info"))?;

                let created = self
                    .order_interactor
                    .create_order(&bity.trade_request, bank_info, eth_info)
                    .await
                    .map_err(unknown)?;
                let order = created
                    .bity_order_response
                    .clone()
                    .ok_or_else(|| unknown("provider returned no order"))?;
                if let Some(slot) = multi_trade.bity_trade_mut() {
                    *slot = created;
                }
                order
            }
        };

        if let Some(message) = &order.message_to_sign {
            info!("Order {} requires an ownership signature", order.id);
            let signature = self.wallet.sign_message(&message.body).await?;
            self.fiat_provider
                .submit_signature(message, &signature)
                .await
                .map_err(unknown)?;
        }

        let current = self
            .fiat_provider
            .get_order(&order.id)
            .await
            .map_err(unknown)?;
        match current.status(Utc::now()) {
            BityOrderStatus::Cancelled | BityOrderStatus::Expired => {
                warn!("Order {} is no longer payable", current.id);
                Err(PaymentError::OrderCanceledNotPaying)
            }
            _ => Ok(current),
        }
    }

    async fn pay(
        &self,
        multi_trade: &MultiTrade,
        order: &BityOrder,
        payment: &watch::Sender<Payment>,
    ) -> Result<(), PaymentError> {
        let currency = multi_trade
            .bity_trade()
            .map(|t| t.trade_request.input_currency.clone())
            .ok_or_else(|| unknown("multi-trade has no fiat trade"))?;
        let deposit = order
            .deposit_address()
            .and_then(parse_address)
            .ok_or_else(|| unknown(format!("order {} has no deposit address", order.id)))?;
        let amount_text = order
            .input
            .amount
            .as_deref()
            .ok_or_else(|| unknown(format!("order {} has no input amount", order.id)))?;
        let amount = amount_to_int(amount_text, currency.decimals).map_err(unknown)?;

        self.ensure_balance(&currency, amount).await?;

        let owner = self.wallet.address();
        let tx = if currency.is_ether() {
            TransactionRequest::default()
                .from(owner)
                .to(deposit)
                .value(amount)
        } else {
            TransactionRequest::default()
                .from(owner)
                .to(token_contract(&currency)?)
                .input(transfer_calldata(deposit, amount).into())
        };
        let tx = with_gas_limit(self.ethereum_client.as_ref(), tx)
            .await
            .map_err(rpc)?;

        info!("Sending {} {} to {} for order {}", amount_text, currency, deposit, order.id);
        set_status(payment, PaymentStepId::Payment, PaymentStepStatus::Approval);
        let tx_hash = self.wallet.send_transaction(tx).await?;
        self.mined(payment, PaymentStepId::Payment, &tx_hash).await
    }

    async fn mined(
        &self,
        payment: &watch::Sender<Payment>,
        id: PaymentStepId,
        tx_hash: &str,
    ) -> Result<(), PaymentError> {
        payment.send_modify(|p| {
            if let Err(e) = p.set_tx_hash(id, tx_hash) {
                warn!("Cannot attach transaction to payment: {}", e);
            }
        });
        set_status(payment, id, PaymentStepStatus::Mining);

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            error!("Transaction {} reverted", tx_hash);
            return Err(unknown(format!("transaction {} reverted", tx_hash)));
        }

        set_status(payment, id, PaymentStepStatus::Done);
        Ok(())
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, PaymentError> {
        let poll = async {
            loop {
                match self.ethereum_client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => debug!("Transaction {} still pending", tx_hash),
                    Err(e) => warn!("Receipt lookup for {} failed: {}", tx_hash, e),
                }
                tokio::time::sleep(self.options.receipt_poll_interval).await;
            }
        };

        tokio::time::timeout(self.options.receipt_timeout, poll)
            .await
            .map_err(|_| unknown(format!("transaction {} not mined in time", tx_hash)))
    }
}

#[async_trait]
impl PaymentInteractor for PaymentInteractorImpl {
    async fn execute(
        &self,
        multi_trade: &mut MultiTrade,
        payment: &watch::Sender<Payment>,
    ) -> Result<(), PaymentError> {
        info!(
            "Executing payment from {}: {} {} -> {} {}",
            self.account_label().await,
            multi_trade.input_amount,
            multi_trade.multi_trade_request.trade_request.input_currency,
            multi_trade.output_amount,
            multi_trade.multi_trade_request.trade_request.output_currency
        );

        match self.run(multi_trade, payment).await {
            Ok(()) => Ok(()),
            Err(StepFailure { step, error }) => {
                error!("Payment step {} failed: {}", step, error);
                payment.send_modify(|p| {
                    if let Err(e) = p.fail_step(step, &error) {
                        warn!("Cannot mark step {} as failed: {}", step, e);
                    }
                });
                Err(error)
            }
        }
    }
}
