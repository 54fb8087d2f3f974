use anyhow::Context;
use tracing::debug;
use uuid::Uuid;

use super::{
    dto::{AddFoodRequest, EditFoodRequest},
    form::ImageUpload,
    repo,
    repo_types::FoodItem,
};
use crate::{
    error::{ApiError, FieldError},
    state::AppState,
};

const IMAGE_FOLDER: &str = "canteen-food-items";

/// `canteen-food-items/{id}-{name}` with the client's file name reduced to a safe basename.
fn object_key(id: Uuid, file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let clean = clean.trim_start_matches('.');
    if clean.is_empty() {
        format!("{IMAGE_FOLDER}/{id}")
    } else {
        format!("{IMAGE_FOLDER}/{id}-{clean}")
    }
}

/// Uploads the file and returns the URL to store in `food_items.image`.
pub async fn store_image(state: &AppState, upload: ImageUpload) -> Result<String, ApiError> {
    if !upload.content_type.starts_with("image/") {
        return Err(ApiError::Validation(vec![FieldError::new(
            "image",
            "Image must be an image file",
        )]));
    }
    let key = object_key(Uuid::new_v4(), &upload.file_name);
    let size = upload.body.len();
    state
        .storage
        .put_object(&key, upload.body, &upload.content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;
    debug!(%key, size, "food image stored");
    Ok(state.storage.public_url(&key))
}

pub async fn add_food(
    state: &AppState,
    req: AddFoodRequest,
    upload: Option<ImageUpload>,
) -> Result<FoodItem, ApiError> {
    req.validate(upload.is_some())?;
    let image = match upload {
        Some(file) => store_image(state, file).await?,
        None => req.image.trim().to_string(),
    };
    let item = repo::insert(
        &state.db,
        req.food_type.trim(),
        req.name.trim(),
        req.price.unwrap_or_default(),
        req.quantity.trim(),
        &image,
    )
    .await?;
    Ok(item)
}

/// An uploaded file replaces the stored image; otherwise `image` in the body may.
pub async fn edit_food(
    state: &AppState,
    id: Uuid,
    req: EditFoodRequest,
    upload: Option<ImageUpload>,
) -> Result<FoodItem, ApiError> {
    let mut changes = req.into_changes()?;
    if repo::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Food item"));
    }
    if let Some(file) = upload {
        changes.image = Some(store_image(state, file).await?);
    }
    repo::update(&state.db, id, changes)
        .await?
        .ok_or(ApiError::NotFound("Food item"))
}
