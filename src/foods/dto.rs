use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{FoodChanges, FoodItem};
use crate::error::{ApiError, Validator};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

/// Form fields arrive as text, JSON bodies as numbers; both become whole rupees.
fn price_field<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<NumberOrText>::deserialize(d)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(t)) if t.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(t)) => t
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("price {t:?} is not a whole number"))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFoodRequest {
    #[serde(default)]
    pub food_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "price_field")]
    pub price: Option<i64>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub image: String,
}

impl AddFoodRequest {
    /// `image` may be omitted when a file was uploaded with the form.
    pub fn validate(&self, has_upload: bool) -> Result<(), ApiError> {
        Validator::new()
            .require(&self.name, "name", "Food name is required")
            .require(&self.food_type, "foodType", "Food category is required")
            .check(self.price.is_some(), "price", "Food price is required")
            .check(
                self.price.map_or(true, |p| p >= 0),
                "price",
                "Food price cannot be negative",
            )
            .require(&self.quantity, "quantity", "Quantity is required")
            .check(
                has_upload || !self.image.trim().is_empty(),
                "image",
                "Image is required",
            )
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFoodRequest {
    pub food_type: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "price_field")]
    pub price: Option<i64>,
    pub quantity: Option<String>,
    pub image: Option<String>,
}

impl EditFoodRequest {
    /// Blank strings count as "not provided", matching the add form's behaviour.
    pub fn into_changes(self) -> Result<FoodChanges, ApiError> {
        Validator::new()
            .check(
                self.price.map_or(true, |p| p >= 0),
                "price",
                "Food price cannot be negative",
            )
            .finish()?;
        let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(FoodChanges {
            food_type: keep(self.food_type),
            name: keep(self.name),
            price: self.price,
            quantity_description: keep(self.quantity),
            image: keep(self.image),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodView {
    pub id: Uuid,
    pub food_type: String,
    pub name: String,
    pub price: i64,
    pub quantity: String,
    pub image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<FoodItem> for FoodView {
    fn from(f: FoodItem) -> Self {
        Self {
            id: f.id,
            food_type: f.food_type,
            name: f.name,
            price: f.price,
            quantity: f.quantity_description,
            image: f.image,
            created_at: f.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FoodList {
    pub data: Vec<FoodView>,
}

#[derive(Debug, Serialize)]
pub struct AddedFood {
    pub msg: &'static str,
    pub food: FoodView,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub msg: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_reads_camel_case_and_validates() {
        let req: AddFoodRequest = serde_json::from_str(
            r#"{"foodType":"snacks","name":"Samosa","price":15,"quantity":"2 pcs","image":"https://img/samosa.jpg"}"#,
        )
        .unwrap();
        assert!(req.validate(false).is_ok());
        assert_eq!(req.food_type, "snacks");
    }

    #[test]
    fn uploaded_file_stands_in_for_image_url() {
        let req: AddFoodRequest = serde_json::from_str(
            r#"{"foodType":"snacks","name":"Samosa","price":"15","quantity":"2 pcs"}"#,
        )
        .unwrap();
        assert_eq!(req.price, Some(15));
        assert!(req.validate(true).is_ok());
        match req.validate(false).unwrap_err() {
            ApiError::Validation(list) => assert_eq!(list[0].field, "image"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn price_text_must_be_a_whole_number() {
        let blank: EditFoodRequest = serde_json::from_str(r#"{"price":" "}"#).unwrap();
        assert_eq!(blank.price, None);
        assert!(serde_json::from_str::<AddFoodRequest>(r#"{"price":"12.5"}"#).is_err());
    }

    #[test]
    fn add_request_lists_missing_fields() {
        let req: AddFoodRequest = serde_json::from_str(r#"{"name":"Samosa","price":-1}"#).unwrap();
        match req.validate(false).unwrap_err() {
            ApiError::Validation(list) => {
                let fields: Vec<_> = list.iter().map(|f| f.field).collect();
                assert_eq!(fields, vec!["foodType", "price", "quantity", "image"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edit_request_drops_blank_fields() {
        let req = EditFoodRequest {
            name: Some("  ".into()),
            quantity: Some(" 1 cup ".into()),
            price: Some(12),
            ..Default::default()
        };
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.quantity_description.as_deref(), Some("1 cup"));
        assert_eq!(changes.price, Some(12));
        assert_eq!(changes.food_type, None);
    }

    #[test]
    fn view_renames_quantity_description() {
        let view = FoodView::from(FoodItem {
            id: Uuid::nil(),
            food_type: "beverages".into(),
            name: "Tea".into(),
            price: 10,
            quantity_description: "1 cup".into(),
            image: "tea.jpg".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        });
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["quantity"], "1 cup");
        assert_eq!(json["foodType"], "beverages");
        assert!(json.get("quantityDescription").is_none());
    }
}
