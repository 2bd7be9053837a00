pub mod payment_presenter;

pub use payment_presenter::{PaymentOutcome, PaymentPresenter, PaymentPresenterImpl};
