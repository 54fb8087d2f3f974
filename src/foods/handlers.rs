use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{AddFoodRequest, AddedFood, EditFoodRequest, FoodList, FoodView, Message},
    form::FoodForm,
    repo, services,
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/food/:food_type", get(list_by_type))
        .route("/food-item/:id", get(get_food_item))
        .route("/search/:food", get(search))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_food))
        .route("/edit/:id", put(edit_food))
        .route("/delete/:id", delete(delete_food))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

#[instrument(skip(state, form))]
pub async fn add_food(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    form: FoodForm<AddFoodRequest>,
) -> Result<Json<AddedFood>, ApiError> {
    let uploaded = form.upload.is_some();
    let item = services::add_food(&state, form.fields, form.upload).await?;
    info!(%admin_id, food_id = %item.id, uploaded, "food item added");
    Ok(Json(AddedFood {
        msg: "Added item successfully",
        food: item.into(),
    }))
}

#[instrument(skip(state, form))]
pub async fn edit_food(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    form: FoodForm<EditFoodRequest>,
) -> Result<Json<FoodView>, ApiError> {
    let uploaded = form.upload.is_some();
    let item = services::edit_food(&state, id, form.fields, form.upload).await?;
    info!(%admin_id, food_id = %id, uploaded, "food item edited");
    Ok(Json(item.into()))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Food item"));
    }
    info!(%admin_id, food_id = %id, "food item deleted");
    Ok(Json(Message {
        msg: "Deleted item successfully",
    }))
}

#[instrument(skip(state))]
pub async fn get_food_item(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodView>, ApiError> {
    let item = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Food item"))?;
    Ok(Json(item.into()))
}

#[instrument(skip(state))]
pub async fn list_by_type(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(food_type): Path<String>,
) -> Result<Json<FoodList>, ApiError> {
    let rows = repo::list_by_type(&state.db, &food_type).await?;
    Ok(Json(FoodList {
        data: rows.into_iter().map(FoodView::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(food): Path<String>,
) -> Result<Json<FoodList>, ApiError> {
    let rows = repo::search_by_name(&state.db, &food).await?;
    Ok(Json(FoodList {
        data: rows.into_iter().map(FoodView::from).collect(),
    }))
}
