use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub food_type: String,
    pub name: String,
    pub price: i64,
    pub quantity_description: String,
    pub image: String,
    pub created_at: OffsetDateTime,
}

/// Columns an admin may overwrite; `None` leaves the stored value untouched.
#[derive(Debug, Default)]
pub struct FoodChanges {
    pub food_type: Option<String>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub quantity_description: Option<String>,
    pub image: Option<String>,
}
