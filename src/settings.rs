use anyhow::{Context, Result};
use config::{Config, Environment};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Application settings read from the environment (after `.env` is loaded)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    pub database_url: String,
    pub ethereum_rpc_url: String,
    /// Shared secret the account service signs bearer tokens with
    pub auth_secret: String,
    /// Fraction of each order the platform keeps as partner fee
    pub bity_partner_fee: String,
    /// Fraction of the partner fee paid back to the referrer
    pub referral_sharing: String,
    pub order_poll_interval_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("server_address", "0.0.0.0:3000")?
            .set_default("bity_partner_fee", "0.01")?
            .set_default("referral_sharing", "0.5")?
            .set_default("order_poll_interval_secs", 5)?
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("DATABASE_URL, ETHEREUM_RPC_URL and AUTH_SECRET must be set")
    }

    pub fn partner_fee(&self) -> Result<Decimal> {
        parse_fraction("BITY_PARTNER_FEE", &self.bity_partner_fee)
    }

    pub fn referral_sharing(&self) -> Result<Decimal> {
        parse_fraction("REFERRAL_SHARING", &self.referral_sharing)
    }

    pub fn order_poll_interval(&self) -> Duration {
        Duration::from_secs(self.order_poll_interval_secs.max(1))
    }
}

fn parse_fraction(name: &str, value: &str) -> Result<Decimal> {
    let fraction =
        Decimal::from_str(value.trim()).with_context(|| format!("{} is not a number", name))?;
    if fraction.is_sign_negative() || fraction > Decimal::ONE {
        anyhow::bail!("{} must be between 0 and 1, got {}", name, fraction);
    }
    Ok(fraction)
}
