#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ParaSwap API error: {0}")]
    ParaswapApi(String),

    #[error("Rate unavailable: {0}")]
    RateUnavailable(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}
