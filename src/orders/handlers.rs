use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        ConfirmOrderRequest, Envelope, FeedbackRequest, OrderView, PaymentTypeRequest,
        PlaceOrderRequest,
    },
    services,
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::ApiError,
    state::AppState,
};

pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/place/order", post(place_order))
        .route("/myorders", get(my_orders))
        .route("/order/payment-type/:id", put(set_payment_type))
        .route("/order/feedback/:id", put(submit_feedback))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin_orders))
        .route("/orders/:id", put(confirm_order))
        .route("/payment-status/:id", put(set_payment_status))
}

#[instrument(skip(state, payload))]
pub async fn place_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Json<OrderView>, ApiError> {
    let order = payload.into_new_order(user_id)?;
    services::place_order(&state, order).await.map(Json)
}

#[instrument(skip(state))]
pub async fn admin_orders(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<Envelope<Vec<OrderView>>>, ApiError> {
    let data = services::list_admin_orders(&state).await?;
    Ok(Json(Envelope { data }))
}

#[instrument(skip(state))]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    services::list_my_orders(&state, user_id).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn confirm_order(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmOrderRequest>,
) -> Result<Json<Envelope<OrderView>>, ApiError> {
    let decision = payload.into_decision()?;
    let data = services::confirm_order(&state, id, decision).await?;
    Ok(Json(Envelope { data }))
}

#[instrument(skip(state, payload))]
pub async fn set_payment_type(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentTypeRequest>,
) -> Result<Json<Envelope<OrderView>>, ApiError> {
    let data = services::set_payment_type(&state, user_id, id, payload.payment_type).await?;
    Ok(Json(Envelope { data }))
}

#[instrument(skip(state))]
pub async fn set_payment_status(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<OrderView>>, ApiError> {
    let data = services::mark_paid_offline(&state, id).await?;
    Ok(Json(Envelope { data }))
}

#[instrument(skip(state, payload))]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<OrderView>, ApiError> {
    let text = payload.into_text()?;
    services::submit_feedback(&state, user_id, id, text).await.map(Json)
}
