use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    lifecycle::{Decision, PaymentMethod},
    repo_types::{NewOrder, NewOrderItem, OrderItemRow, OrderRow},
};
use crate::error::{ApiError, FieldError, Validator};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default)]
    pub food_type: String,
    #[serde(default)]
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub cart: Vec<CartItem>,
    pub total_price: Option<i64>,
    pub room_no: Option<String>,
    pub message: Option<String>,
}

impl PlaceOrderRequest {
    pub fn into_new_order(self, user_id: Uuid) -> Result<NewOrder, ApiError> {
        let mut errors = Vec::new();
        if self.cart.is_empty() {
            errors.push(FieldError::new("cart", "Cart is empty"));
        }
        for item in &self.cart {
            if item.name.trim().is_empty() {
                errors.push(FieldError::new("cart", "Every item needs a name"));
            }
            if item.price < 0 {
                errors.push(FieldError::new("cart", format!("{}: price cannot be negative", item.name)));
            }
            if item.quantity < 1 {
                errors.push(FieldError::new("cart", format!("{}: quantity must be at least 1", item.name)));
            }
        }
        if !matches!(self.total_price, Some(t) if t > 0) {
            errors.push(FieldError::new("totalPrice", "Total price is required"));
        }
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let room_no = self
            .room_no
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Ok(NewOrder {
            user_id,
            total_price: self.total_price.unwrap_or_default(),
            room_no,
            message: self.message.unwrap_or_default().trim().to_string(),
            items: self
                .cart
                .into_iter()
                .map(|c| NewOrderItem {
                    food_type: c.food_type,
                    name: c.name.trim().to_string(),
                    price: c.price,
                    quantity: c.quantity,
                    image: c.image,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOrderRequest {
    pub is_confirmed: Option<bool>,
    pub rejection_reason: Option<String>,
}

impl ConfirmOrderRequest {
    pub fn into_decision(self) -> Result<Decision, ApiError> {
        let reason = self
            .rejection_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let mut v = Validator::new();
        v.check(self.is_confirmed.is_some(), "isConfirmed", "isConfirmed is required");
        match self.is_confirmed {
            Some(true) => {
                v.check(
                    reason.is_none(),
                    "rejectionReason",
                    "An accepted order cannot carry a rejection reason",
                );
            }
            Some(false) => {
                v.check(
                    reason.is_some(),
                    "rejectionReason",
                    "A rejection reason is required",
                );
            }
            None => {}
        }
        v.finish()?;
        Ok(match reason {
            Some(reason) if self.is_confirmed == Some(false) => Decision::Reject { reason },
            _ => Decision::Accept,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTypeRequest {
    pub payment_type: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub feedback: String,
}

impl FeedbackRequest {
    pub fn into_text(self) -> Result<String, ApiError> {
        let text = self.feedback.trim().to_string();
        Validator::new()
            .check(!text.is_empty(), "feedback", "Feedback cannot be empty")
            .check(
                text.chars().count() <= 1000,
                "feedback",
                "Feedback must be at most 1000 characters",
            )
            .finish()?;
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: Uuid,
    pub food_type: String,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub image: String,
}

impl From<OrderItemRow> for OrderItemView {
    fn from(r: OrderItemRow) -> Self {
        Self {
            id: r.id,
            food_type: r.food_type,
            name: r.name,
            price: r.price,
            quantity: r.quantity,
            image: r.image,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerView {
    pub name: String,
    pub branch: String,
    pub role: String,
}

/// Keys follow the web client's contract: `_id`, line items under `orders`, timestamp as `date`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OwnerView>,
    #[serde(rename = "orders")]
    pub items: Vec<OrderItemView>,
    pub total_price: i64,
    pub room_no: Option<String>,
    pub message: String,
    pub is_confirmed: Option<bool>,
    pub rejection_reason: Option<String>,
    pub payment_type: String,
    pub payment_status: bool,
    pub feedback: Option<String>,
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl OrderView {
    pub fn new(row: OrderRow, items: Vec<OrderItemRow>, user: Option<OwnerView>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user,
            items: items.into_iter().map(OrderItemView::from).collect(),
            total_price: row.total_price,
            room_no: row.room_no,
            message: row.message,
            is_confirmed: row.is_confirmed,
            rejection_reason: row.rejection_reason,
            payment_type: row.payment_type,
            payment_status: row.payment_status,
            feedback: row.feedback,
            created_at: row.created_at,
        }
    }

    /// Owners never see orders that lost their items or total.
    pub fn is_presentable(&self) -> bool {
        !self.items.is_empty() && self.total_price > 0
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tea_cart() -> PlaceOrderRequest {
        serde_json::from_str(
            r#"{"cart":[{"foodType":"beverages","name":"Tea","price":10,"quantity":2,"image":"tea.jpg"}],
                "totalPrice":20,"roomNo":" 304 ","message":"less sugar"}"#,
        )
        .unwrap()
    }

    fn row(total: i64) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_price: total,
            room_no: None,
            message: String::new(),
            is_confirmed: None,
            rejection_reason: None,
            payment_type: String::new(),
            payment_status: false,
            feedback: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn item(order_id: Uuid, name: &str) -> OrderItemRow {
        OrderItemRow {
            id: Uuid::new_v4(),
            order_id,
            position: 0,
            food_type: "snacks".into(),
            name: name.into(),
            price: 10,
            quantity: 2,
            image: String::new(),
        }
    }

    #[test]
    fn cart_becomes_exact_snapshot() {
        let user = Uuid::new_v4();
        let order = tea_cart().into_new_order(user).unwrap();
        assert_eq!(order.user_id, user);
        assert_eq!(order.total_price, 20);
        assert_eq!(order.room_no.as_deref(), Some("304"));
        assert_eq!(order.message, "less sugar");
        assert_eq!(
            order.items,
            vec![NewOrderItem {
                food_type: "beverages".into(),
                name: "Tea".into(),
                price: 10,
                quantity: 2,
                image: "tea.jpg".into(),
            }]
        );
    }

    #[test]
    fn missing_message_and_room_default() {
        let req: PlaceOrderRequest = serde_json::from_str(
            r#"{"cart":[{"name":"Vada Pav","price":15,"quantity":1}],"totalPrice":15,"roomNo":""}"#,
        )
        .unwrap();
        let order = req.into_new_order(Uuid::nil()).unwrap();
        assert_eq!(order.room_no, None);
        assert_eq!(order.message, "");
    }

    #[test]
    fn empty_cart_and_zero_total_are_rejected() {
        let req: PlaceOrderRequest =
            serde_json::from_str(r#"{"cart":[],"totalPrice":0}"#).unwrap();
        match req.into_new_order(Uuid::nil()).unwrap_err() {
            ApiError::Validation(list) => {
                let fields: Vec<_> = list.iter().map(|f| f.field).collect();
                assert_eq!(fields, vec!["cart", "totalPrice"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_item_quantity_is_rejected() {
        let req: PlaceOrderRequest = serde_json::from_str(
            r#"{"cart":[{"name":"Tea","price":10,"quantity":0}],"totalPrice":10}"#,
        )
        .unwrap();
        assert!(matches!(
            req.into_new_order(Uuid::nil()),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn confirm_request_maps_to_decision() {
        let accept = ConfirmOrderRequest {
            is_confirmed: Some(true),
            rejection_reason: None,
        };
        assert_eq!(accept.into_decision().unwrap(), Decision::Accept);

        let reject = ConfirmOrderRequest {
            is_confirmed: Some(false),
            rejection_reason: Some(" Out of stock ".into()),
        };
        assert_eq!(
            reject.into_decision().unwrap(),
            Decision::Reject {
                reason: "Out of stock".into()
            }
        );
    }

    #[test]
    fn confirm_request_guards_reason() {
        let reject_without_reason = ConfirmOrderRequest {
            is_confirmed: Some(false),
            rejection_reason: Some("   ".into()),
        };
        assert!(reject_without_reason.into_decision().is_err());

        let accept_with_reason = ConfirmOrderRequest {
            is_confirmed: Some(true),
            rejection_reason: Some("why".into()),
        };
        assert!(accept_with_reason.into_decision().is_err());

        let missing = ConfirmOrderRequest {
            is_confirmed: None,
            rejection_reason: None,
        };
        assert!(missing.into_decision().is_err());
    }

    #[test]
    fn payment_type_request_accepts_only_known_types() {
        let ok: PaymentTypeRequest = serde_json::from_str(r#"{"paymentType":"offline"}"#).unwrap();
        assert_eq!(ok.payment_type, PaymentMethod::Offline);
        assert!(serde_json::from_str::<PaymentTypeRequest>(r#"{"paymentType":""}"#).is_err());
    }

    #[test]
    fn feedback_is_trimmed_and_required() {
        let ok = FeedbackRequest {
            feedback: "  tasty  ".into(),
        };
        assert_eq!(ok.into_text().unwrap(), "tasty");
        assert!(FeedbackRequest { feedback: " ".into() }.into_text().is_err());
    }

    #[test]
    fn view_is_camel_case_and_filters_partial_orders() {
        let r = row(20);
        let id = r.id;
        let view = OrderView::new(r, vec![item(id, "Tea")], None);
        assert!(view.is_presentable());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["totalPrice"], 20);
        assert_eq!(json["isConfirmed"], serde_json::Value::Null);
        assert_eq!(json["paymentType"], "");
        assert_eq!(json["orders"][0]["name"], "Tea");
        assert_eq!(json["orders"][0]["foodType"], "snacks");
        assert_eq!(json["_id"], id.to_string());
        assert_eq!(json["date"], "1970-01-01T00:00:00Z");
        assert!(json.get("items").is_none());
        assert!(json.get("user").is_none());

        assert!(!OrderView::new(row(20), vec![], None).is_presentable());
        let zero = row(0);
        let zid = zero.id;
        assert!(!OrderView::new(zero, vec![item(zid, "Tea")], None).is_presentable());
    }

    #[test]
    fn admin_view_embeds_owner() {
        let view = OrderView::new(
            row(20),
            vec![],
            Some(OwnerView {
                name: "Prof. Iyer".into(),
                branch: "IT".into(),
                role: "teacher".into(),
            }),
        );
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["user"]["role"], "teacher");
    }
}
