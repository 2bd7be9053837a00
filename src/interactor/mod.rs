pub mod db;
pub mod order_interactor;
pub mod payment_interactor;
pub mod profit_share_interactor;
pub mod rate_interactor;

pub use order_interactor::{create_payment, OrderInteractor, OrderInteractorImpl};
pub use payment_interactor::{ExecutorOptions, PaymentInteractor, PaymentInteractorImpl};
pub use profit_share_interactor::{ProfitShareInteractor, ProfitShareInteractorImpl};
pub use rate_interactor::{RateInteractor, RateInteractorImpl};
