use crate::entity::{AppError, ProfitShare};
use crate::interactor::db::{OrderRepository, UserRepository};
use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfitShareInteractor: Send + Sync {
    /// Referral earnings of the user identified by `issuer`
    async fn get_profit_share(&self, issuer: &str) -> Result<ProfitShare, AppError>;
}

pub struct ProfitShareInteractorImpl {
    user_repository: Arc<dyn UserRepository>,
    order_repository: Arc<dyn OrderRepository>,
    partner_fee: Decimal,
    referral_sharing: Decimal,
}

impl ProfitShareInteractorImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        order_repository: Arc<dyn OrderRepository>,
        partner_fee: Decimal,
        referral_sharing: Decimal,
    ) -> Self {
        Self {
            user_repository,
            order_repository,
            partner_fee,
            referral_sharing,
        }
    }
}

#[async_trait]
impl ProfitShareInteractor for ProfitShareInteractorImpl {
    async fn get_profit_share(&self, issuer: &str) -> Result<ProfitShare, AppError> {
        let user = self
            .user_repository
            .find_by_issuer(issuer)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let totals = self
            .order_repository
            .referral_totals(&user.referral_id)
            .await?;
        let profit = (totals.total_eth * self.partner_fee * self.referral_sharing).normalize();
        debug!(
            "Profit share for user {}: {} orders, {} ETH",
            user.id, totals.count, profit
        );

        Ok(ProfitShare {
            referral_tx_count: totals.count,
            referral_profit: profit.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ReferralTotals, User};
    use crate::interactor::db::{MockOrderRepository, MockUserRepository};
    use chrono::Utc;
    use std::str::FromStr;

    fn user() -> User {
        User {
            id: 1,
            issuer: "did:ethr:0xabc".to_string(),
            email: None,
            eth_address: None,
            referral_id: "ref42".to_string(),
            referred_by: None,
            created_at: Utc::now(),
        }
    }

    fn interactor(users: MockUserRepository, orders: MockOrderRepository) -> ProfitShareInteractorImpl {
        ProfitShareInteractorImpl::new(
            Arc::new(users),
            Arc::new(orders),
            Decimal::from_str("0.01").unwrap(),
            Decimal::from_str("0.5").unwrap(),
        )
    }

    #[tokio::test]
    async fn applies_partner_fee_and_sharing() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_issuer().returning(|_| Ok(Some(user())));
        let mut orders = MockOrderRepository::new();
        orders
            .expect_referral_totals()
            .withf(|referral| referral == "ref42")
            .returning(|_| {
                Ok(ReferralTotals {
                    total_eth: Decimal::from_str("12.5").unwrap(),
                    count: 3,
                })
            });

        let share = interactor(users, orders)
            .get_profit_share("did:ethr:0xabc")
            .await
            .unwrap();
        assert_eq!(share.referral_tx_count, 3);
        assert_eq!(share.referral_profit, "0.0625");
    }

    #[tokio::test]
    async fn no_orders_means_zero() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_issuer().returning(|_| Ok(Some(user())));
        let mut orders = MockOrderRepository::new();
        orders
            .expect_referral_totals()
            .returning(|_| Ok(ReferralTotals::default()));

        let share = interactor(users, orders).get_profit_share("x").await.unwrap();
        assert_eq!(share.referral_tx_count, 0);
        assert_eq!(share.referral_profit, "0");
    }

    #[tokio::test]
    async fn unknown_user_is_an_error() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_issuer().returning(|_| Ok(None));

        let err = interactor(users, MockOrderRepository::new())
            .get_profit_share("nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
