mod app_error;
mod bank_info;
mod currency;
mod order_record;
mod payment;
mod payment_error;
mod trade;
mod user;

pub use app_error::AppError;
pub use bank_info::{BankInfo, EthInfo, Owner, Recipient};
pub use currency::{
    Currency, CurrencyType, ETH_DECIMALS, ETH_SYMBOL, FIAT_CURRENCIES, FIAT_DECIMALS,
};
pub use order_record::{NewOrderRecord, OrderRecord, ProfitShare, ReferralTotals};
pub use payment::{
    compute_status, Payment, PaymentStatus, PaymentStep, PaymentStepId, PaymentStepStatus,
    StepTransitionError,
};
pub use payment_error::{PaymentError, StepError};
pub use trade::{
    BityTrade, DexTrade, Fees, MultiTrade, MultiTradeRequest, Trade, TradeExact, TradeRequest,
};
pub use user::User;
