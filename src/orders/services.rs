use std::collections::HashMap;

use anyhow::Context;
use sqlx::PgConnection;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{OrderView, OwnerView},
    lifecycle::{Decision, Lifecycle, PaymentMethod, TransitionError},
    repo,
    repo_types::NewOrder,
};
use crate::{auth::repo_types::User, error::ApiError, state::AppState};

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

/// Who is allowed to drive a transition on a given order.
#[derive(Debug, Clone, Copy)]
pub enum Access {
    /// Admin already verified by the extractor.
    Admin,
    Owner(Uuid),
    OwnerOrAdmin(Uuid),
}

/// Runs on the transition's own connection; the order row is already locked there.
async fn authorize(conn: &mut PgConnection, access: Access, owner: Uuid) -> Result<(), ApiError> {
    let allowed = match access {
        Access::Admin => true,
        Access::Owner(caller) => caller == owner,
        Access::OwnerOrAdmin(caller) if caller == owner => true,
        Access::OwnerOrAdmin(caller) => User::admin_flag(conn, caller).await? == Some(true),
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Order and items are written in one transaction; any failure leaves nothing behind.
pub async fn place_order(state: &AppState, order: NewOrder) -> Result<OrderView, ApiError> {
    let mut tx = state.db.begin().await.context("begin tx")?;
    let row = repo::insert_order_tx(&mut tx, &order).await?;
    let mut items = Vec::with_capacity(order.items.len());
    for (position, item) in order.items.iter().enumerate() {
        items.push(repo::insert_item_tx(&mut tx, row.id, position as i32, item).await?);
    }
    tx.commit().await.context("commit tx")?;

    info!(order_id = %row.id, user_id = %row.user_id, items = items.len(), total = row.total_price, "order placed");
    Ok(OrderView::new(row, items, None))
}

pub async fn list_admin_orders(state: &AppState) -> Result<Vec<OrderView>, ApiError> {
    let rows = repo::list_all_with_owner(&state.db).await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.order.id).collect();
    let mut items = repo::items_for_orders(&state.db, &ids).await?;

    let orders: Vec<OrderView> = rows
        .into_iter()
        .map(|r| {
            let order_items = items.remove(&r.order.id).unwrap_or_default();
            let owner = OwnerView {
                name: r.owner_name,
                branch: r.owner_branch,
                role: r.owner_role,
            };
            OrderView::new(r.order, order_items, Some(owner))
        })
        .collect();

    if let Some(first) = orders.first() {
        if first.items.is_empty() {
            warn!(order_id = %first.id, "newest order has no items");
        }
    }
    Ok(orders)
}

pub async fn list_my_orders(state: &AppState, user_id: Uuid) -> Result<Vec<OrderView>, ApiError> {
    let rows = repo::list_by_user(&state.db, user_id).await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = repo::items_for_orders(&state.db, &ids).await?;
    Ok(assemble_owner_view(rows, items))
}

fn assemble_owner_view(
    rows: Vec<super::repo_types::OrderRow>,
    mut items: HashMap<Uuid, Vec<super::repo_types::OrderItemRow>>,
) -> Vec<OrderView> {
    rows.into_iter()
        .map(|r| {
            let order_items = items.remove(&r.id).unwrap_or_default();
            OrderView::new(r, order_items, None)
        })
        .filter(OrderView::is_presentable)
        .collect()
}

/// Locks the order, checks access, applies `step`, persists the result.
async fn transition<F>(
    state: &AppState,
    order_id: Uuid,
    access: Access,
    action: &'static str,
    step: F,
) -> Result<OrderView, ApiError>
where
    F: FnOnce(&mut Lifecycle) -> Result<(), TransitionError>,
{
    let mut tx = state.db.begin().await.context("begin tx")?;
    let row = repo::lock_order_tx(&mut tx, order_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    authorize(&mut *tx, access, row.user_id).await?;

    let mut lc = row.lifecycle()?;
    if let Err(e) = step(&mut lc) {
        warn!(%order_id, action, error = %e, "order transition refused");
        return Err(e.into());
    }

    let updated = repo::write_lifecycle_tx(&mut tx, order_id, &lc).await?;
    let mut items = repo::items_for_orders(&mut *tx, &[order_id]).await?;
    tx.commit().await.context("commit tx")?;

    info!(
        %order_id,
        action,
        is_confirmed = ?updated.is_confirmed,
        payment_type = %updated.payment_type,
        payment_status = updated.payment_status,
        "order updated"
    );
    let order_items = items.remove(&order_id).unwrap_or_default();
    Ok(OrderView::new(updated, order_items, None))
}

pub async fn confirm_order(
    state: &AppState,
    order_id: Uuid,
    decision: Decision,
) -> Result<OrderView, ApiError> {
    transition(state, order_id, Access::Admin, "confirm", |lc| {
        lc.decide(decision)
    })
    .await
}

pub async fn set_payment_type(
    state: &AppState,
    caller: Uuid,
    order_id: Uuid,
    method: PaymentMethod,
) -> Result<OrderView, ApiError> {
    transition(
        state,
        order_id,
        Access::OwnerOrAdmin(caller),
        "set_payment_type",
        |lc| lc.choose_payment_type(method),
    )
    .await
}

/// Admin settlement of an offline order.
pub async fn mark_paid_offline(state: &AppState, order_id: Uuid) -> Result<OrderView, ApiError> {
    transition(state, order_id, Access::Admin, "settle_offline", |lc| {
        lc.settle_offline()
    })
    .await
}

/// Called by the payment bridge once the gateway signature has been verified.
pub async fn mark_paid_online(
    state: &AppState,
    caller: Uuid,
    order_id: Uuid,
) -> Result<OrderView, ApiError> {
    transition(
        state,
        order_id,
        Access::Owner(caller),
        "settle_online",
        Lifecycle::settle_online,
    )
    .await
}

pub async fn submit_feedback(
    state: &AppState,
    caller: Uuid,
    order_id: Uuid,
    text: String,
) -> Result<OrderView, ApiError> {
    transition(state, order_id, Access::Owner(caller), "feedback", |lc| {
        lc.leave_feedback(text)
    })
    .await
}
