pub mod payment_view;

pub use payment_view::{render_payment, LogPaymentView, PaymentStatusView, PaymentView};
