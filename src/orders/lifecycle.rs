//! Order state machine.
//!
//! ```text
//! pending ──accept──▶ accepted ──choose type──▶ online | offline ──settle──▶ paid ──▶ feedback
//!    └────reject────▶ rejected (terminal)
//! ```
//!
//! Confirmation and payment are one-way. The payment type may change while the
//! order is unpaid; feedback may be left once, after payment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Pending,
    Accepted,
    Rejected { reason: String },
}

/// Admin decision on a pending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject { reason: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Offline,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Offline => "offline",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentMethod::Online),
            "offline" => Ok(PaymentMethod::Offline),
            other => Err(format!("unknown payment type {other:?}")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Order has already been accepted")]
    AlreadyAccepted,
    #[error("Order has already been rejected")]
    AlreadyRejected,
    #[error("Order has not been accepted")]
    NotAccepted,
    #[error("Order has already been paid")]
    AlreadyPaid,
    #[error("Order is not set for offline payment")]
    NotOffline,
    #[error("Feedback can only be left after payment")]
    NotPaid,
    #[error("Feedback has already been submitted")]
    FeedbackExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    pub confirmation: Confirmation,
    pub payment_type: Option<PaymentMethod>,
    pub paid: bool,
    pub feedback: Option<String>,
}

impl Lifecycle {
    pub fn pending() -> Self {
        Self {
            confirmation: Confirmation::Pending,
            payment_type: None,
            paid: false,
            feedback: None,
        }
    }

    /// Rebuilds the state from stored columns. `payment_type` is `""` while unset.
    pub fn from_columns(
        is_confirmed: Option<bool>,
        rejection_reason: Option<String>,
        payment_type: &str,
        payment_status: bool,
        feedback: Option<String>,
    ) -> Result<Self, String> {
        let confirmation = match is_confirmed {
            None => Confirmation::Pending,
            Some(true) => Confirmation::Accepted,
            Some(false) => Confirmation::Rejected {
                reason: rejection_reason.unwrap_or_default(),
            },
        };
        let payment_type = match payment_type {
            "" => None,
            other => Some(other.parse()?),
        };
        Ok(Self {
            confirmation,
            payment_type,
            paid: payment_status,
            feedback,
        })
    }

    pub fn is_confirmed(&self) -> Option<bool> {
        match self.confirmation {
            Confirmation::Pending => None,
            Confirmation::Accepted => Some(true),
            Confirmation::Rejected { .. } => Some(false),
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.confirmation {
            Confirmation::Rejected { reason } => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn payment_type_column(&self) -> &'static str {
        self.payment_type.map_or("", PaymentMethod::as_str)
    }

    pub fn decide(&mut self, decision: Decision) -> Result<(), TransitionError> {
        match self.confirmation {
            Confirmation::Accepted => return Err(TransitionError::AlreadyAccepted),
            Confirmation::Rejected { .. } => return Err(TransitionError::AlreadyRejected),
            Confirmation::Pending => {}
        }
        self.confirmation = match decision {
            Decision::Accept => Confirmation::Accepted,
            Decision::Reject { reason } => Confirmation::Rejected { reason },
        };
        Ok(())
    }

    pub fn choose_payment_type(&mut self, method: PaymentMethod) -> Result<(), TransitionError> {
        self.ensure_payable()?;
        self.payment_type = Some(method);
        Ok(())
    }

    /// Admin confirms cash/counter settlement of an offline order.
    pub fn settle_offline(&mut self) -> Result<(), TransitionError> {
        self.ensure_payable()?;
        if self.payment_type != Some(PaymentMethod::Offline) {
            return Err(TransitionError::NotOffline);
        }
        self.paid = true;
        Ok(())
    }

    /// Gateway-verified payment; the payment type becomes online regardless of the earlier choice.
    pub fn settle_online(&mut self) -> Result<(), TransitionError> {
        self.ensure_payable()?;
        self.payment_type = Some(PaymentMethod::Online);
        self.paid = true;
        Ok(())
    }

    pub fn leave_feedback(&mut self, text: String) -> Result<(), TransitionError> {
        if !self.paid {
            return Err(TransitionError::NotPaid);
        }
        if self.feedback.is_some() {
            return Err(TransitionError::FeedbackExists);
        }
        self.feedback = Some(text);
        Ok(())
    }

    fn ensure_payable(&self) -> Result<(), TransitionError> {
        if self.confirmation != Confirmation::Accepted {
            return Err(TransitionError::NotAccepted);
        }
        if self.paid {
            return Err(TransitionError::AlreadyPaid);
        }
        Ok(())
    }
}
