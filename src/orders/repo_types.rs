use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::lifecycle::Lifecycle;

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_price: i64,
    pub room_no: Option<String>,
    pub message: String,
    pub is_confirmed: Option<bool>,
    pub rejection_reason: Option<String>,
    pub payment_type: String,
    pub payment_status: bool,
    pub feedback: Option<String>,
    pub created_at: OffsetDateTime,
}

impl OrderRow {
    pub fn lifecycle(&self) -> anyhow::Result<Lifecycle> {
        Lifecycle::from_columns(
            self.is_confirmed,
            self.rejection_reason.clone(),
            &self.payment_type,
            self.payment_status,
            self.feedback.clone(),
        )
        .map_err(|e| anyhow::anyhow!("order {}: {}", self.id, e))
    }
}

/// Order joined with the owner's public profile, for the admin list.
#[derive(Debug, Clone, FromRow)]
pub struct OrderWithOwner {
    #[sqlx(flatten)]
    pub order: OrderRow,
    pub owner_name: String,
    pub owner_branch: String,
    pub owner_role: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub food_type: String,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub image: String,
}

/// Snapshot of one cart entry, copied verbatim into `order_items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub food_type: String,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total_price: i64,
    pub room_no: Option<String>,
    pub message: String,
    pub items: Vec<NewOrderItem>,
}
