use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::RazorpayConfig;

/// Gateway-side record authorizing an online charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    /// Smallest currency unit (paise).
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<PaymentIntent>;
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Clone)]
pub struct Razorpay {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl Razorpay {
    pub fn new(cfg: &RazorpayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("build razorpay http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            key_id: cfg.key_id.clone(),
            key_secret: cfg.key_secret.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for Razorpay {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<PaymentIntent> {
        let url = format!("{}/v1/orders", self.base_url);
        let res = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount_minor,
                currency,
                receipt,
            })
            .send()
            .await
            .context("razorpay create order request")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(%status, %body, "razorpay rejected create order");
            anyhow::bail!("razorpay create order failed: HTTP {}", status);
        }

        let intent = res
            .json::<PaymentIntent>()
            .await
            .context("decode razorpay order")?;
        debug!(intent_id = %intent.id, amount = intent.amount, "razorpay order created");
        Ok(intent)
    }
}
