pub mod config;
pub mod models;
pub mod quote_service;
pub mod swap_service;
pub mod token_repository;

pub use config::Config;
pub use models::{ParaswapError, PriceResponse, PriceRoute, Side};
pub use quote_service::{ParaswapQuoteService, QuoteService};
pub use swap_service::{ParaswapSwapService, SwapService};
pub use token_repository::{ParaswapTokenRepository, TokenRepository};
