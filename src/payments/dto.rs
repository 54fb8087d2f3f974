use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Validator};

pub const CURRENCY: &str = "INR";

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    /// Whole rupees.
    pub amount: Option<i64>,
}

impl CreateIntentRequest {
    /// Amount in paise.
    pub fn amount_minor(&self) -> Result<i64, ApiError> {
        Validator::new()
            .check(
                matches!(self.amount, Some(a) if a > 0),
                "amount",
                "Amount must be a positive number",
            )
            .finish()?;
        self.amount
            .and_then(|a| a.checked_mul(100))
            .ok_or_else(|| ApiError::BadRequest("Amount is too large".into()))
    }
}

/// Checkout callback fields, named as Razorpay returns them.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
    pub db_order_id: Option<Uuid>,
}

impl VerifyPaymentRequest {
    pub fn validate(&self) -> Result<Uuid, ApiError> {
        Validator::new()
            .require(&self.razorpay_order_id, "razorpay_order_id", "razorpay_order_id is required")
            .require(
                &self.razorpay_payment_id,
                "razorpay_payment_id",
                "razorpay_payment_id is required",
            )
            .require(
                &self.razorpay_signature,
                "razorpay_signature",
                "razorpay_signature is required",
            )
            .check(self.db_order_id.is_some(), "db_order_id", "db_order_id is required")
            .finish()?;
        self.db_order_id
            .ok_or_else(|| ApiError::BadRequest("db_order_id is required".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub message: &'static str,
}
