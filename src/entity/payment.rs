use crate::entity::{PaymentError, StepError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStepId {
    Allowance,
    Trade,
    Payment,
    Bity,
}

impl fmt::Display for PaymentStepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStepId::Allowance => write!(f, "ALLOWANCE"),
            PaymentStepId::Trade => write!(f, "TRADE"),
            PaymentStepId::Payment => write!(f, "PAYMENT"),
            PaymentStepId::Bity => write!(f, "BITY"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStepStatus {
    Queued,
    Approval,
    Mining,
    Waiting,
    Received,
    Done,
    Error,
}

impl PaymentStepStatus {
    /// Position in the linear progression; `None` for `Error`
    fn rank(self) -> Option<u8> {
        match self {
            PaymentStepStatus::Queued => Some(0),
            PaymentStepStatus::Approval => Some(1),
            PaymentStepStatus::Mining => Some(2),
            PaymentStepStatus::Waiting => Some(3),
            PaymentStepStatus::Received => Some(4),
            PaymentStepStatus::Done => Some(5),
            PaymentStepStatus::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStepStatus::Done | PaymentStepStatus::Error)
    }

    /// Whether moving from `self` to `next` keeps the progression monotonic.
    /// Re-entering the current status is allowed.
    pub fn can_transition_to(self, next: PaymentStepStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(next)) => next > current,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for PaymentStepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PaymentStepStatus::Queued => "QUEUED",
            PaymentStepStatus::Approval => "APPROVAL",
            PaymentStepStatus::Mining => "MINING",
            PaymentStepStatus::Waiting => "WAITING",
            PaymentStepStatus::Received => "RECEIVED",
            PaymentStepStatus::Done => "DONE",
            PaymentStepStatus::Error => "ERROR",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Ongoing,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStep {
    pub id: PaymentStepId,
    pub status: PaymentStepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bity_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

impl PaymentStep {
    pub fn queued(id: PaymentStepId) -> Self {
        Self {
            id,
            status: PaymentStepStatus::Queued,
            tx_hash: None,
            bity_order_id: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepTransitionError {
    #[error("Unknown payment step {0}")]
    UnknownStep(PaymentStepId),

    #[error("Step {id} cannot move from {from} to {to}")]
    Regression {
        id: PaymentStepId,
        from: PaymentStepStatus,
        to: PaymentStepStatus,
    },
}

/// Overall status derived from the step statuses
pub fn compute_status(steps: &[PaymentStep]) -> PaymentStatus {
    if steps.iter().any(|s| s.status == PaymentStepStatus::Error) {
        PaymentStatus::Error
    } else if steps.iter().all(|s| s.status == PaymentStepStatus::Done) {
        PaymentStatus::Done
    } else {
        PaymentStatus::Ongoing
    }
}

/// Observable state of one payment attempt.
///
/// Steps only move forward; `status` is recomputed after every change so it
/// always agrees with the steps.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Payment {
    status: PaymentStatus,
    steps: Vec<PaymentStep>,
}

impl Payment {
    pub fn new(step_ids: &[PaymentStepId]) -> Self {
        let steps: Vec<PaymentStep> = step_ids.iter().copied().map(PaymentStep::queued).collect();
        Self {
            status: compute_status(&steps),
            steps,
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn steps(&self) -> &[PaymentStep] {
        &self.steps
    }

    pub fn step(&self, id: PaymentStepId) -> Option<&PaymentStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_ids(&self) -> Vec<PaymentStepId> {
        self.steps.iter().map(|s| s.id).collect()
    }

    fn step_mut(&mut self, id: PaymentStepId) -> Result<&mut PaymentStep, StepTransitionError> {
        self.steps
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StepTransitionError::UnknownStep(id))
    }

    pub fn update_step(
        &mut self,
        id: PaymentStepId,
        status: PaymentStepStatus,
    ) -> Result<(), StepTransitionError> {
        let step = self.step_mut(id)?;
        if !step.status.can_transition_to(status) {
            return Err(StepTransitionError::Regression {
                id,
                from: step.status,
                to: status,
            });
        }
        step.status = status;
        self.status = compute_status(&self.steps);
        Ok(())
    }

    pub fn set_tx_hash(&mut self, id: PaymentStepId, tx_hash: &str) -> Result<(), StepTransitionError> {
        self.step_mut(id)?.tx_hash = Some(tx_hash.to_string());
        Ok(())
    }

    pub fn set_bity_order_id(
        &mut self,
        id: PaymentStepId,
        order_id: &str,
    ) -> Result<(), StepTransitionError> {
        self.step_mut(id)?.bity_order_id = Some(order_id.to_string());
        Ok(())
    }

    pub fn fail_step(
        &mut self,
        id: PaymentStepId,
        error: &PaymentError,
    ) -> Result<(), StepTransitionError> {
        self.update_step(id, PaymentStepStatus::Error)?;
        self.step_mut(id)?.error = Some(StepError::from(error));
        Ok(())
    }

    /// Step currently being worked on, if any
    pub fn active_step(&self) -> Option<&PaymentStep> {
        self.steps.iter().find(|s| !s.status.is_terminal())
    }

    pub fn steps_with_error(&self) -> impl Iterator<Item = &PaymentStep> {
        self.steps.iter().filter(|s| s.error.is_some())
    }

    /// Fresh payment over the same steps, everything queued again
    pub fn restart(&self) -> Payment {
        Payment::new(&self.step_ids())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [PaymentStepStatus; 7] = [
        PaymentStepStatus::Queued,
        PaymentStepStatus::Approval,
        PaymentStepStatus::Mining,
        PaymentStepStatus::Waiting,
        PaymentStepStatus::Received,
        PaymentStepStatus::Done,
        PaymentStepStatus::Error,
    ];

    const STEP_IDS: [PaymentStepId; 3] = [
        PaymentStepId::Allowance,
        PaymentStepId::Payment,
        PaymentStepId::Bity,
    ];

    fn steps_with(statuses: &[PaymentStepStatus]) -> Vec<PaymentStep> {
        statuses
            .iter()
            .zip(STEP_IDS.iter())
            .map(|(status, id)| PaymentStep {
                status: *status,
                ..PaymentStep::queued(*id)
            })
            .collect()
    }

    #[test]
    fn status_is_derived_for_every_combination() {
        for a in ALL_STATUSES {
            for b in ALL_STATUSES {
                for c in ALL_STATUSES {
                    let statuses = [a, b, c];
                    let status = compute_status(&steps_with(&statuses));

                    let any_error = statuses.contains(&PaymentStepStatus::Error);
                    let all_done = statuses.iter().all(|s| *s == PaymentStepStatus::Done);

                    assert_eq!(status == PaymentStatus::Error, any_error, "{:?}", statuses);
                    assert_eq!(status == PaymentStatus::Done, all_done, "{:?}", statuses);
                    if !any_error && !all_done {
                        assert_eq!(status, PaymentStatus::Ongoing);
                    }
                }
            }
        }
    }

    #[test]
    fn transitions_never_regress() {
        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                let mut payment = Payment::new(&[PaymentStepId::Payment]);
                // Walk up to `from` along the happy path first
                if from != PaymentStepStatus::Queued {
                    payment.update_step(PaymentStepId::Payment, from).unwrap();
                }

                let result = payment.update_step(PaymentStepId::Payment, to);
                let current = payment.step(PaymentStepId::Payment).unwrap().status;

                match result {
                    Ok(()) => assert_eq!(current, to),
                    Err(StepTransitionError::Regression { .. }) => assert_eq!(current, from),
                    Err(e) => panic!("unexpected error {e}"),
                }
            }
        }
    }

    #[test]
    fn done_and_error_are_terminal() {
        let mut payment = Payment::new(&[PaymentStepId::Trade]);
        payment
            .update_step(PaymentStepId::Trade, PaymentStepStatus::Done)
            .unwrap();
        assert!(payment
            .update_step(PaymentStepId::Trade, PaymentStepStatus::Error)
            .is_err());

        let mut payment = Payment::new(&[PaymentStepId::Trade]);
        payment
            .fail_step(PaymentStepId::Trade, &PaymentError::UserRejectedTransaction)
            .unwrap();
        assert!(payment
            .update_step(PaymentStepId::Trade, PaymentStepStatus::Mining)
            .is_err());
        assert_eq!(payment.status(), PaymentStatus::Error);
    }

    #[test]
    fn skipping_forward_is_allowed() {
        let mut payment = Payment::new(&[PaymentStepId::Allowance]);
        payment
            .update_step(PaymentStepId::Allowance, PaymentStepStatus::Done)
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Done);
    }

    #[test]
    fn failing_a_step_records_the_mapped_message() {
        let mut payment = Payment::new(&[PaymentStepId::Payment, PaymentStepId::Bity]);
        payment
            .fail_step(PaymentStepId::Payment, &PaymentError::LowBalanceForGas)
            .unwrap();

        let step = payment.step(PaymentStepId::Payment).unwrap();
        let error = step.error.as_ref().unwrap();
        assert_eq!(error.code, "low-balance-for-gas");
        assert_eq!(error.message, "You do not have enough ETH to pay for gas.");
        assert_eq!(payment.steps_with_error().count(), 1);
    }

    #[test]
    fn restart_resets_every_step() {
        let mut payment = Payment::new(&STEP_IDS);
        payment
            .update_step(PaymentStepId::Allowance, PaymentStepStatus::Done)
            .unwrap();
        payment
            .set_tx_hash(PaymentStepId::Payment, "0xdead")
            .unwrap();
        payment
            .fail_step(PaymentStepId::Payment, &PaymentError::UserRejectedTransaction)
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Error);

        let fresh = payment.restart();
        assert_eq!(fresh.status(), PaymentStatus::Ongoing);
        assert_eq!(fresh.step_ids(), STEP_IDS.to_vec());
        assert!(fresh
            .steps()
            .iter()
            .all(|s| s.status == PaymentStepStatus::Queued && s.tx_hash.is_none() && s.error.is_none()));
    }

    #[test]
    fn unknown_step_is_rejected() {
        let mut payment = Payment::new(&[PaymentStepId::Payment]);
        assert_eq!(
            payment.update_step(PaymentStepId::Trade, PaymentStepStatus::Mining),
            Err(StepTransitionError::UnknownStep(PaymentStepId::Trade))
        );
    }
}
