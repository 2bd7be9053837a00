use crate::entity::{MultiTrade, Payment, PaymentStatus};
use crate::interactor::create_payment;
use crate::interactor::payment_interactor::PaymentInteractor;
use crate::services::{OrderWatch, OrderWatchService};
use crate::view::payment_view::{render_payment, PaymentView};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::watch;

/// Multi-trade and payment as they stood when the payment stopped progressing
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub multi_trade: MultiTrade,
    pub payment: Payment,
}

#[async_trait]
pub trait PaymentPresenter: Send + Sync {
    /// Execute a confirmed multi-trade and follow it until it is done or failed
    async fn pay(&self, multi_trade: MultiTrade) -> Result<PaymentOutcome>;

    /// Start over with a fresh payment and a new fiat order
    async fn restart(&self, outcome: PaymentOutcome) -> Result<PaymentOutcome>;
}

pub struct PaymentPresenterImpl<I, V> {
    interactor: Arc<I>,
    view: Arc<V>,
    order_watch_service: Arc<OrderWatchService>,
}

impl<I, V> PaymentPresenterImpl<I, V>
where
    I: PaymentInteractor,
    V: PaymentView,
{
    pub fn new(interactor: Arc<I>, view: Arc<V>, order_watch_service: Arc<OrderWatchService>) -> Self {
        Self {
            interactor,
            view,
            order_watch_service,
        }
    }

    /// Render every published state and keep one order watch per step
    /// carrying an order id; watches stop once the payment settles.
    async fn follow(
        &self,
        mut rx: watch::Receiver<Payment>,
        payment: Arc<watch::Sender<Payment>>,
    ) -> Payment {
        let mut watches: Vec<OrderWatch> = Vec::new();

        let last = loop {
            let snapshot = rx.borrow_and_update().clone();
            if let Err(e) = self.view.display_status(&render_payment(&snapshot)).await {
                error!("Failed to display payment status: {}", e);
            }

            for order_id in snapshot.steps().iter().filter_map(|s| s.bity_order_id.as_deref()) {
                if !watches.iter().any(|w| w.order_id() == order_id) {
                    watches.push(self.order_watch_service.watch(order_id, payment.clone()));
                }
            }

            if snapshot.status() != PaymentStatus::Ongoing || rx.changed().await.is_err() {
                break snapshot;
            }
        };

        join_all(watches.iter_mut().map(|w| w.stop())).await;
        debug!("Payment settled with status {:?}", last.status());
        last
    }

    async fn run(&self, mut multi_trade: MultiTrade, initial: Payment) -> Result<PaymentOutcome> {
        let (tx, rx) = watch::channel(initial);
        let tx = Arc::new(tx);

        let execution = async {
            if let Err(e) = self.interactor.execute(&mut multi_trade, &tx).await {
                info!("Payment stopped: {}", e);
            }
        };
        let ((), payment) = tokio::join!(execution, self.follow(rx, tx.clone()));

        Ok(PaymentOutcome {
            multi_trade,
            payment,
        })
    }
}

#[async_trait]
impl<I, V> PaymentPresenter for PaymentPresenterImpl<I, V>
where
    I: PaymentInteractor + Send + Sync,
    V: PaymentView + Send + Sync,
{
    async fn pay(&self, multi_trade: MultiTrade) -> Result<PaymentOutcome> {
        if multi_trade.bity_trade().is_none() {
            self.view
                .display_error("nothing to pay: no fiat trade".to_string())
                .await?;
            anyhow::bail!("multi-trade has no fiat trade");
        }
        let payment = create_payment(&multi_trade);
        self.run(multi_trade, payment).await
    }

    async fn restart(&self, outcome: PaymentOutcome) -> Result<PaymentOutcome> {
        let PaymentOutcome {
            mut multi_trade,
            payment,
        } = outcome;
        if let Some(bity) = multi_trade.bity_trade_mut() {
            bity.bity_order_response = None;
        }
        info!("Restarting payment");
        self.run(multi_trade, payment.restart()).await
    }
}
