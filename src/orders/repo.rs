use std::collections::HashMap;

use anyhow::Context;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    lifecycle::Lifecycle,
    repo_types::{NewOrder, NewOrderItem, OrderItemRow, OrderRow, OrderWithOwner},
};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.total_price, o.room_no, o.message, \
     o.is_confirmed, o.rejection_reason, o.payment_type, o.payment_status, o.feedback, o.created_at";

const ITEM_COLUMNS: &str = "id, order_id, position, food_type, name, price, quantity, image";

pub async fn insert_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    order: &NewOrder,
) -> anyhow::Result<OrderRow> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        INSERT INTO orders AS o (user_id, total_price, room_no, message)
        VALUES ($1, $2, $3, $4)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(order.user_id)
    .bind(order.total_price)
    .bind(order.room_no.as_deref())
    .bind(&order.message)
    .fetch_one(&mut **tx)
    .await
    .context("insert order")?;
    Ok(row)
}

pub async fn insert_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    position: i32,
    item: &NewOrderItem,
) -> anyhow::Result<OrderItemRow> {
    let row = sqlx::query_as::<_, OrderItemRow>(&format!(
        r#"
        INSERT INTO order_items (order_id, position, food_type, name, price, quantity, image)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(position)
    .bind(&item.food_type)
    .bind(&item.name)
    .bind(item.price)
    .bind(item.quantity)
    .bind(&item.image)
    .fetch_one(&mut **tx)
    .await
    .context("insert order item")?;
    Ok(row)
}

/// All orders with their owner, newest first.
pub async fn list_all_with_owner(db: &PgPool) -> anyhow::Result<Vec<OrderWithOwner>> {
    let rows = sqlx::query_as::<_, OrderWithOwner>(&format!(
        r#"
        SELECT {ORDER_COLUMNS},
               u.name AS owner_name, u.branch AS owner_branch, u.role AS owner_role
          FROM orders o
          JOIN users u ON u.id = o.user_id
         ORDER BY o.created_at DESC
        "#
    ))
    .fetch_all(db)
    .await
    .context("list all orders")?;
    Ok(rows)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<OrderRow>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
          FROM orders o
         WHERE o.user_id = $1
         ORDER BY o.created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list orders by user")?;
    Ok(rows)
}

/// Line items for many orders at once, grouped by order and kept in cart order.
pub async fn items_for_orders<'e, E>(
    executor: E,
    order_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<OrderItemRow>>>
where
    E: Executor<'e, Database = Postgres>,
{
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
          FROM order_items
         WHERE order_id = ANY($1)
         ORDER BY order_id, position
        "#
    ))
    .bind(order_ids)
    .fetch_all(executor)
    .await
    .context("list order items")?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

/// Loads one order and holds its row lock until the transaction ends.
pub async fn lock_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> anyhow::Result<Option<OrderRow>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
          FROM orders o
         WHERE o.id = $1
           FOR UPDATE
        "#
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock order")?;
    Ok(row)
}

pub async fn write_lifecycle_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    lc: &Lifecycle,
) -> anyhow::Result<OrderRow> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE orders AS o
           SET is_confirmed = $2,
               rejection_reason = $3,
               payment_type = $4,
               payment_status = $5,
               feedback = $6
         WHERE o.id = $1
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(lc.is_confirmed())
    .bind(lc.rejection_reason())
    .bind(lc.payment_type_column())
    .bind(lc.paid)
    .bind(lc.feedback.as_deref())
    .fetch_one(&mut **tx)
    .await
    .context("update order lifecycle")?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::lifecycle::{Decision, PaymentMethod};

    async fn pending_order(pool: &PgPool) -> OrderRow {
        let user_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, password_hash, branch, role)
            VALUES ('Asha', 'asha@ssbs.sies.edu.in', 'x', 'IT', 'student')
            RETURNING id
            "#,
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let mut tx = pool.begin().await.unwrap();
        let row = insert_order_tx(
            &mut tx,
            &NewOrder {
                user_id,
                total_price: 20,
                room_no: None,
                message: String::new(),
                items: vec![],
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        row
    }

    async fn violates(pool: &PgPool, id: Uuid, set: &str) -> bool {
        sqlx::query(&format!("UPDATE orders SET {set} WHERE id = $1"))
            .bind(id)
            .execute(pool)
            .await
            .is_err()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn schema_refuses_impossible_states(pool: PgPool) {
        let order = pending_order(&pool).await;
        assert!(violates(&pool, order.id, "payment_status = TRUE").await);
        assert!(violates(&pool, order.id, "is_confirmed = FALSE").await);
        assert!(violates(&pool, order.id, "is_confirmed = TRUE, rejection_reason = 'no'").await);
        assert!(violates(&pool, order.id, "payment_type = 'card'").await);
        assert!(
            violates(&pool, order.id, "is_confirmed = TRUE, feedback = 'early'").await
        );
        assert!(!violates(&pool, order.id, "is_confirmed = TRUE, payment_type = 'online'").await);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn lifecycle_write_round_trips_through_lock(pool: PgPool) {
        let order = pending_order(&pool).await;
        let mut lc = order.lifecycle().unwrap();
        lc.decide(Decision::Accept).unwrap();
        lc.choose_payment_type(PaymentMethod::Offline).unwrap();

        let mut tx = pool.begin().await.unwrap();
        let locked = lock_order_tx(&mut tx, order.id).await.unwrap().unwrap();
        assert_eq!(locked.id, order.id);
        let written = write_lifecycle_tx(&mut tx, order.id, &lc).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(written.is_confirmed, Some(true));
        assert_eq!(written.payment_type, "offline");
        assert_eq!(written.lifecycle().unwrap(), lc);

        let mut tx = pool.begin().await.unwrap();
        assert!(lock_order_tx(&mut tx, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn items_come_back_grouped_in_position_order(pool: PgPool) {
        let order = pending_order(&pool).await;
        let mut tx = pool.begin().await.unwrap();
        for (position, name) in [(1, "Samosa"), (0, "Tea")] {
            let item = NewOrderItem {
                food_type: "snacks".into(),
                name: name.into(),
                price: 10,
                quantity: 1,
                image: String::new(),
            };
            insert_item_tx(&mut tx, order.id, position, &item).await.unwrap();
        }
        tx.commit().await.unwrap();

        let grouped = items_for_orders(&pool, &[order.id, Uuid::new_v4()]).await.unwrap();
        let names: Vec<_> = grouped[&order.id].iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Tea", "Samosa"]);
        assert_eq!(grouped.len(), 1);
        assert!(items_for_orders(&pool, &[]).await.unwrap().is_empty());
    }
}
