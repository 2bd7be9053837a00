use crate::entity::{AppError, NewOrderRecord, OrderRecord, ReferralTotals, User};
use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Error as SqlxError, PgPool, Row};
use std::str::FromStr;

fn user_from_row(row: &PgRow) -> Result<User, SqlxError> {
    Ok(User {
        id: row.try_get("id")?,
        issuer: row.try_get("issuer")?,
        email: row.try_get("email")?,
        eth_address: row.try_get("eth_address")?,
        referral_id: row.try_get("referral_id")?,
        referred_by: row.try_get("referred_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<OrderRecord, SqlxError> {
    Ok(OrderRecord {
        id: row.try_get("id")?,
        bity_order_id: row.try_get("bity_order_id")?,
        eth_address: row.try_get("eth_address")?,
        input_currency: row.try_get("input_currency")?,
        eth_amount: row.try_get("eth_amount")?,
        fiat_currency: row.try_get("fiat_currency")?,
        fiat_amount: row.try_get("fiat_amount")?,
        referral_id: row.try_get("referral_id")?,
        created_at: row.try_get("created_at")?,
    })
}

// Get user by the issuer of their auth token
pub async fn get_user_by_issuer(pool: &PgPool, issuer: &str) -> Result<Option<User>, SqlxError> {
    let row = sqlx::query("SELECT * FROM users WHERE issuer = $1")
        .bind(issuer)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

// Record a created fiat order; None when it was already recorded
pub async fn insert_order(
    pool: &PgPool,
    order: &NewOrderRecord,
) -> Result<Option<OrderRecord>, SqlxError> {
    let row = sqlx::query(
        "INSERT INTO orders (bity_order_id, eth_address, input_currency, eth_amount, fiat_currency, fiat_amount, referral_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (bity_order_id) DO NOTHING \
         RETURNING *",
    )
    .bind(&order.bity_order_id)
    .bind(&order.eth_address)
    .bind(&order.input_currency)
    .bind(&order.eth_amount)
    .bind(&order.fiat_currency)
    .bind(&order.fiat_amount)
    .bind(&order.referral_id)
    .fetch_optional(pool)
    .await?;

    let record = row.as_ref().map(order_from_row).transpose()?;
    if let Some(record) = &record {
        info!("Recorded order {} with ID: {}", record.bity_order_id, record.id);
    }
    Ok(record)
}

// Every referred order counts; only ETH-funded ones add to the total
const REFERRAL_TOTALS_SQL: &str = "SELECT COALESCE(SUM(CAST(eth_amount AS numeric)) \
     FILTER (WHERE input_currency = 'ETH'), 0)::text AS total_eth, COUNT(*) AS count \
     FROM orders WHERE referral_id = $1";

pub async fn get_referral_totals(
    pool: &PgPool,
    referral_id: &str,
) -> Result<ReferralTotals, SqlxError> {
    let row = sqlx::query(REFERRAL_TOTALS_SQL)
        .bind(referral_id)
        .fetch_one(pool)
        .await?;

    let total: String = row.try_get("total_eth")?;
    let count: i64 = row.try_get("count")?;
    let total_eth = Decimal::from_str(&total).map_err(|e| SqlxError::Decode(Box::new(e)))?;
    debug!("Referral {}: {} orders, {} ETH", referral_id, count, total_eth);

    Ok(ReferralTotals { total_eth, count })
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_issuer(&self, issuer: &str) -> Result<Option<User>, AppError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn record_order(&self, order: &NewOrderRecord) -> Result<Option<OrderRecord>, AppError>;

    async fn referral_totals(&self, referral_id: &str) -> Result<ReferralTotals, AppError>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_issuer(&self, issuer: &str) -> Result<Option<User>, AppError> {
        Ok(get_user_by_issuer(&self.pool, issuer).await?)
    }
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn record_order(&self, order: &NewOrderRecord) -> Result<Option<OrderRecord>, AppError> {
        Ok(insert_order(&self.pool, order).await?)
    }

    async fn referral_totals(&self, referral_id: &str) -> Result<ReferralTotals, AppError> {
        Ok(get_referral_totals(&self.pool, referral_id).await?)
    }
}
