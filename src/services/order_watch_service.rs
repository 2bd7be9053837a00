use crate::bity::{BityError, BityOrderStatus, FiatProvider};
use crate::entity::{Payment, PaymentError, PaymentStepId, PaymentStepStatus};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polls fiat orders and moves the BITY step of a payment along
pub struct OrderWatchService {
    fiat_provider: Arc<dyn FiatProvider>,
    poll_interval: Duration,
}

/// A running subscription to one order
pub struct OrderWatch {
    order_id: String,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: JoinHandle<()>,
}

impl OrderWatch {
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    // Stop polling; a request already in flight is aborted and its result dropped
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(()).await;
            self.handle.abort();
            info!("Stop signal sent to watch of order {}", self.order_id);
        }
    }

    /// Wait for the polling task to end
    pub async fn finished(self) {
        match self.handle.await {
            Err(e) if e.is_panic() => error!("Watch of order {} panicked: {}", self.order_id, e),
            Err(_) => debug!("Watch of order {} aborted", self.order_id),
            Ok(()) => {}
        }
    }
}

/// Reflect a provider status onto the BITY step; returns whether it changed
pub fn apply_order_status(payment: &watch::Sender<Payment>, status: BityOrderStatus) -> bool {
    payment.send_if_modified(|p| {
        let before = p.step(PaymentStepId::Bity).map(|s| s.status);
        let result = match status {
            BityOrderStatus::Waiting => return false,
            BityOrderStatus::Received => p.update_step(PaymentStepId::Bity, PaymentStepStatus::Received),
            BityOrderStatus::Executed => p.update_step(PaymentStepId::Bity, PaymentStepStatus::Done),
            BityOrderStatus::Cancelled | BityOrderStatus::Expired => {
                if before == Some(PaymentStepStatus::Error) {
                    return false;
                }
                p.fail_step(PaymentStepId::Bity, &PaymentError::BityOrderCancelled)
            }
        };
        if let Err(e) = result {
            warn!("Ignoring order status {:?}: {}", status, e);
            return false;
        }
        p.step(PaymentStepId::Bity).map(|s| s.status) != before
    })
}

impl OrderWatchService {
    pub fn new(fiat_provider: Arc<dyn FiatProvider>, poll_interval: Duration) -> Self {
        Self {
            fiat_provider,
            poll_interval,
        }
    }

    /// Start polling `order_id` until it is executed, cancelled or expired,
    /// or until the returned watch is stopped.
    pub fn watch(&self, order_id: &str, payment: Arc<watch::Sender<Payment>>) -> OrderWatch {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let fiat_provider = self.fiat_provider.clone();
        let poll_interval = self.poll_interval;
        let id = order_id.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            let mut last_run = Instant::now();

            loop {
                select! {
                    _ = ticker.tick() => {
                        debug!("Checking order {} (last run: {:.2?} ago)", id, last_run.elapsed());
                        match Self::check_order(fiat_provider.as_ref(), &id, &payment).await {
                            Ok(status) if status.is_terminal() => {
                                info!("Order {} reached {:?}, watch finished", id, status);
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => error!("Error checking order {}: {}", id, e),
                        }
                        last_run = Instant::now();
                    }
                    _ = stop_rx.recv() => {
                        info!("Stopping watch of order {}", id);
                        break;
                    }
                }
            }
        });

        info!("Watching order {} every {:?}", order_id, self.poll_interval);
        OrderWatch {
            order_id: order_id.to_string(),
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    async fn check_order(
        fiat_provider: &dyn FiatProvider,
        order_id: &str,
        payment: &watch::Sender<Payment>,
    ) -> Result<BityOrderStatus, BityError> {
        let order = fiat_provider.get_order(order_id).await?;
        let status = order.status(Utc::now());
        if apply_order_status(payment, status) {
            info!("Order {} is now {:?}", order_id, status);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bity::client::MockFiatProvider;
    use crate::bity::models::{
        BityOrder, EstimateRequest, EstimateResponse, MessageToSign, OrderRequest,
    };
    use crate::bity::trade::fixtures::order;
    use crate::entity::PaymentStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn waiting_payment() -> Arc<watch::Sender<Payment>> {
        let mut payment = Payment::new(&[PaymentStepId::Payment, PaymentStepId::Bity]);
        payment
            .update_step(PaymentStepId::Payment, PaymentStepStatus::Done)
            .unwrap();
        payment
            .update_step(PaymentStepId::Bity, PaymentStepStatus::Waiting)
            .unwrap();
        let (tx, _rx) = watch::channel(payment);
        Arc::new(tx)
    }

    fn service(fiat: MockFiatProvider) -> OrderWatchService {
        OrderWatchService::new(Arc::new(fiat), Duration::from_millis(1))
    }

    async fn finish(watch: OrderWatch) {
        tokio::time::timeout(Duration::from_secs(2), watch.finished())
            .await
            .expect("watch did not finish");
    }

    #[tokio::test]
    async fn follows_the_order_until_executed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut fiat = MockFiatProvider::new();
        fiat.expect_get_order().returning(move |id| {
            let mut order = order(id, "1.5", "2700");
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => {}
                1 => order.timestamp_payment_received = Some("2020-05-12T12:05:00Z".to_string()),
                _ => order.timestamp_executed = Some("2020-05-12T12:30:00Z".to_string()),
            }
            Ok(order)
        });

        let payment = waiting_payment();
        let mut rx = payment.subscribe();
        finish(service(fiat).watch("order-1", payment.clone())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(rx.has_changed().unwrap());
        let current = rx.borrow_and_update().clone();
        assert_eq!(
            current.step(PaymentStepId::Bity).unwrap().status,
            PaymentStepStatus::Done
        );
        assert_eq!(current.status(), PaymentStatus::Done);
    }

    #[tokio::test]
    async fn cancelled_order_fails_the_step() {
        let mut fiat = MockFiatProvider::new();
        fiat.expect_get_order().returning(|id| {
            let mut order = order(id, "1.5", "2700");
            order.timestamp_cancelled = Some("2020-05-12T12:30:00Z".to_string());
            Ok(order)
        });

        let payment = waiting_payment();
        finish(service(fiat).watch("order-1", payment.clone())).await;

        let current = payment.borrow().clone();
        let step = current.step(PaymentStepId::Bity).unwrap();
        assert_eq!(step.status, PaymentStepStatus::Error);
        assert_eq!(step.error.as_ref().unwrap().code, "bity-order-cancelled");
        assert_eq!(current.status(), PaymentStatus::Error);
    }

    #[tokio::test]
    async fn request_failures_are_retried_next_tick() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut fiat = MockFiatProvider::new();
        fiat.expect_get_order().returning(move |id| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(BityError::Unexpected("502 Bad Gateway".to_string()));
            }
            let mut order = order(id, "1.5", "2700");
            order.timestamp_executed = Some("2020-05-12T12:30:00Z".to_string());
            Ok(order)
        });

        let payment = waiting_payment();
        finish(service(fiat).watch("order-1", payment.clone())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(payment.borrow().status(), PaymentStatus::Done);
    }

    #[tokio::test]
    async fn stopping_ends_the_watch() {
        let mut fiat = MockFiatProvider::new();
        fiat.expect_get_order()
            .returning(|id| Ok(order(id, "1.5", "2700")));

        let payment = waiting_payment();
        let mut watch = service(fiat).watch("order-1", payment.clone());
        watch.stop().await;
        finish(watch).await;

        assert_eq!(
            payment.borrow().step(PaymentStepId::Bity).unwrap().status,
            PaymentStepStatus::Waiting
        );
    }

    struct SlowProvider {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FiatProvider for SlowProvider {
        fn accepts_input(&self, _symbol: &str) -> bool {
            true
        }

        async fn estimate(&self, _request: &EstimateRequest) -> Result<EstimateResponse, BityError> {
            Err(BityError::Unexpected("not used".to_string()))
        }

        async fn create_order(&self, _request: &OrderRequest) -> Result<BityOrder, BityError> {
            Err(BityError::Unexpected("not used".to_string()))
        }

        async fn get_order(&self, order_id: &str) -> Result<BityOrder, BityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let mut order = order(order_id, "1.5", "2700");
            order.timestamp_executed = Some("2020-05-12T12:30:00Z".to_string());
            Ok(order)
        }

        async fn submit_signature(
            &self,
            _message: &MessageToSign,
            _signature: &str,
        ) -> Result<(), BityError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn stop_drops_the_request_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = OrderWatchService::new(
            Arc::new(SlowProvider {
                delay: Duration::from_millis(200),
                calls: calls.clone(),
            }),
            Duration::from_millis(1),
        );

        let payment = waiting_payment();
        let mut watch = service.watch("order-1", payment.clone());
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        watch.stop().await;
        finish(watch).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(
            payment.borrow().step(PaymentStepId::Bity).unwrap().status,
            PaymentStepStatus::Waiting
        );
    }

    #[test]
    fn waiting_status_changes_nothing() {
        let payment = waiting_payment();
        assert!(!apply_order_status(&payment, BityOrderStatus::Waiting));
        assert!(apply_order_status(&payment, BityOrderStatus::Received));
        assert!(!apply_order_status(&payment, BityOrderStatus::Received));
    }
}
