pub mod client;
pub mod config;
pub mod models;
pub mod trade;

pub use client::{BityClient, FiatProvider};
pub use config::{order_status_page_url, Config};
pub use models::{BityError, BityOrder, BityOrderStatus};
pub use trade::{create_bity_trade, estimate_bity_trade};
