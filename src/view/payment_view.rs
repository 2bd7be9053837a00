use crate::bity::order_status_page_url;
use crate::entity::{Payment, PaymentStatus, PaymentStepId, PaymentStepStatus};
use crate::ethereum::etherscan_tx_url;
use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serde::Serialize;

pub const MINING_HINT: &str =
    "Your transaction is validating. Please do not speed up the transaction in your wallet.";
pub const SENDING_HINT: &str = "Your payment has been received and the bank transfer is being sent. This process can take up to 10 minutes.";
pub const KEEP_OPEN_HINT: &str = "Please do not close this tab until the process is complete.";
pub const APPROVAL_HINT: &str = "We are waiting for you to accept a transaction in your wallet.";
pub const SUCCESS_HINT: &str = "The payment is complete and the bank transfer has been sent. Funds will arrive in your bank account between one hour and four days from now, depending on your bank.";

pub fn step_label(id: PaymentStepId) -> &'static str {
    match id {
        PaymentStepId::Allowance => "Token allowance",
        PaymentStepId::Trade => "Token exchange",
        PaymentStepId::Payment => "Payment",
        PaymentStepId::Bity => "Fiat exchange",
    }
}

pub fn status_text(status: PaymentStepStatus) -> Option<&'static str> {
    match status {
        PaymentStepStatus::Mining => Some("Mining"),
        PaymentStepStatus::Waiting => Some("Confirming"),
        PaymentStepStatus::Received => Some("Sending"),
        PaymentStepStatus::Error => Some("Error"),
        PaymentStepStatus::Approval => Some("Approval"),
        PaymentStepStatus::Queued | PaymentStepStatus::Done => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRow {
    pub id: PaymentStepId,
    pub label: &'static str,
    pub status: PaymentStepStatus,
    pub status_text: Option<&'static str>,
    pub hint: Option<&'static str>,
    pub tx_url: Option<String>,
    pub order_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepErrorRow {
    pub label: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentScreen {
    Ongoing { hints: Vec<&'static str> },
    Success { hint: &'static str },
    Error { errors: Vec<StepErrorRow> },
}

/// Everything needed to display the progress of a payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatusView {
    pub rows: Vec<StepRow>,
    pub screen: PaymentScreen,
}

pub fn render_payment(payment: &Payment) -> PaymentStatusView {
    let rows = payment
        .steps()
        .iter()
        .map(|step| StepRow {
            id: step.id,
            label: step_label(step.id),
            status: step.status,
            status_text: status_text(step.status),
            hint: (step.status == PaymentStepStatus::Approval).then_some(APPROVAL_HINT),
            tx_url: step.tx_hash.as_deref().map(etherscan_tx_url),
            order_url: step.bity_order_id.as_deref().map(order_status_page_url),
        })
        .collect();

    let screen = match payment.status() {
        PaymentStatus::Ongoing => {
            let mut hints = Vec::new();
            if payment
                .steps()
                .iter()
                .any(|s| s.status == PaymentStepStatus::Mining)
            {
                hints.push(MINING_HINT);
            }
            let bity_received = payment
                .step(PaymentStepId::Bity)
                .map(|s| s.status == PaymentStepStatus::Received)
                .unwrap_or(false);
            hints.push(if bity_received { SENDING_HINT } else { KEEP_OPEN_HINT });
            PaymentScreen::Ongoing { hints }
        }
        PaymentStatus::Done => PaymentScreen::Success { hint: SUCCESS_HINT },
        PaymentStatus::Error => PaymentScreen::Error {
            errors: payment
                .steps_with_error()
                .filter_map(|step| {
                    step.error.as_ref().map(|e| StepErrorRow {
                        label: step_label(step.id),
                        message: e.message.clone(),
                    })
                })
                .collect(),
        },
    };

    PaymentStatusView { rows, screen }
}

#[async_trait]
pub trait PaymentView: Send + Sync {
    async fn display_status(&self, view: &PaymentStatusView) -> Result<()>;
    async fn display_error(&self, error_message: String) -> Result<()>;
}

/// View writing payment progress to the application log
pub struct LogPaymentView;

#[async_trait]
impl PaymentView for LogPaymentView {
    async fn display_status(&self, view: &PaymentStatusView) -> Result<()> {
        for row in &view.rows {
            let mut line = format!("{}: {}", row.label, row.status_text.unwrap_or(""));
            if let Some(url) = &row.tx_url {
                line.push_str(&format!(" [Transaction {}]", url));
            }
            if let Some(url) = &row.order_url {
                line.push_str(&format!(" [Bity order {}]", url));
            }
            info!("{}", line.trim_end());
        }

        match &view.screen {
            PaymentScreen::Ongoing { hints } => hints.iter().for_each(|h| info!("{}", h)),
            PaymentScreen::Success { hint } => info!("That's a success. {}", hint),
            PaymentScreen::Error { errors } => {
                error!("Oops, something went wrong");
                for e in errors {
                    error!("{}: {}", e.label, e.message);
                }
            }
        }
        Ok(())
    }

    async fn display_error(&self, error_message: String) -> Result<()> {
        error!("Payment could not run: {}", error_message);
        Ok(())
    }
}
