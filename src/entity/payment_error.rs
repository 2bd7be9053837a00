use serde::{Deserialize, Serialize};

/// Failure of a payment step, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("user-rejected-transaction")]
    UserRejectedTransaction,

    #[error("token-balance-too-low")]
    TokenBalanceTooLow,

    #[error("bity-order-cancelled")]
    BityOrderCancelled,

    #[error("low-balance-for-gas")]
    LowBalanceForGas,

    #[error("order_canceled_not_paying")]
    OrderCanceledNotPaying,

    #[error("{0}")]
    Unknown(String),
}

impl PaymentError {
    /// Stable code for clients; `Unknown` details stay in logs
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::UserRejectedTransaction => "user-rejected-transaction",
            PaymentError::TokenBalanceTooLow => "token-balance-too-low",
            PaymentError::BityOrderCancelled => "bity-order-cancelled",
            PaymentError::LowBalanceForGas => "low-balance-for-gas",
            PaymentError::OrderCanceledNotPaying => "order_canceled_not_paying",
            PaymentError::Unknown(_) => "unknown",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            PaymentError::UserRejectedTransaction => "You refused the transaction in your wallet.",
            PaymentError::TokenBalanceTooLow => "Your token balance is too low.",
            PaymentError::BityOrderCancelled => "The order has been cancelled.",
            PaymentError::LowBalanceForGas => "You do not have enough ETH to pay for gas.",
            PaymentError::OrderCanceledNotPaying => {
                "Order is expired or has been cancelled, not sending payment. Please retry."
            }
            PaymentError::Unknown(_) => "Unknown error.",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "user-rejected-transaction" => PaymentError::UserRejectedTransaction,
            "token-balance-too-low" => PaymentError::TokenBalanceTooLow,
            "bity-order-cancelled" => PaymentError::BityOrderCancelled,
            "low-balance-for-gas" => PaymentError::LowBalanceForGas,
            "order_canceled_not_paying" => PaymentError::OrderCanceledNotPaying,
            other => PaymentError::Unknown(other.to_string()),
        }
    }
}

/// Serialized form of a step failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub code: String,
    pub message: String,
}

impl From<&PaymentError> for StepError {
    fn from(error: &PaymentError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.user_message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_their_messages() {
        let cases = [
            ("user-rejected-transaction", "You refused the transaction in your wallet."),
            ("token-balance-too-low", "Your token balance is too low."),
            ("bity-order-cancelled", "The order has been cancelled."),
            ("low-balance-for-gas", "You do not have enough ETH to pay for gas."),
            (
                "order_canceled_not_paying",
                "Order is expired or has been cancelled, not sending payment. Please retry.",
            ),
        ];

        for (code, message) in cases {
            let error = PaymentError::from_code(code);
            assert_eq!(error.code(), code);
            assert_eq!(error.user_message(), message);
        }
    }

    #[test]
    fn unmapped_errors_fall_back_to_unknown() {
        let error = PaymentError::from_code("nonce too low");
        assert_eq!(error, PaymentError::Unknown("nonce too low".to_string()));
        assert_eq!(error.user_message(), "Unknown error.");
    }

    #[test]
    fn unknown_details_stay_out_of_the_code() {
        let error = PaymentError::Unknown("JSON-RPC error -32000: execution reverted".to_string());
        assert_eq!(error.code(), "unknown");

        let step = StepError::from(&error);
        assert_eq!(step.code, "unknown");
        assert_eq!(step.message, "Unknown error.");
        assert!(error.to_string().contains("execution reverted"));
    }
}
