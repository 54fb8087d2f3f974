use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{FoodChanges, FoodItem};

const COLUMNS: &str = "id, food_type, name, price, quantity_description, image, created_at";

pub async fn insert(
    db: &PgPool,
    food_type: &str,
    name: &str,
    price: i64,
    quantity_description: &str,
    image: &str,
) -> anyhow::Result<FoodItem> {
    let item = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        INSERT INTO food_items (food_type, name, price, quantity_description, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(food_type)
    .bind(name)
    .bind(price)
    .bind(quantity_description)
    .bind(image)
    .fetch_one(db)
    .await
    .context("insert food item")?;
    Ok(item)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FoodItem>> {
    let item = sqlx::query_as::<_, FoodItem>(&format!(
        "SELECT {COLUMNS} FROM food_items WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get food item")?;
    Ok(item)
}

pub async fn list_by_type(db: &PgPool, food_type: &str) -> anyhow::Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodItem>(&format!(
        "SELECT {COLUMNS} FROM food_items WHERE food_type = $1 ORDER BY name"
    ))
    .bind(food_type)
    .fetch_all(db)
    .await
    .context("list food items by type")?;
    Ok(rows)
}

pub async fn search_by_name(db: &PgPool, needle: &str) -> anyhow::Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodItem>(&format!(
        r#"SELECT {COLUMNS} FROM food_items WHERE name ILIKE $1 ESCAPE '\' ORDER BY name"#
    ))
    .bind(like_pattern(needle))
    .fetch_all(db)
    .await
    .context("search food items")?;
    Ok(rows)
}

/// Partial update; returns `None` when the id does not exist.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    changes: FoodChanges,
) -> anyhow::Result<Option<FoodItem>> {
    let item = sqlx::query_as::<_, FoodItem>(&format!(
        r#"
        UPDATE food_items
           SET food_type = COALESCE($2, food_type),
               name = COALESCE($3, name),
               price = COALESCE($4, price),
               quantity_description = COALESCE($5, quantity_description),
               image = COALESCE($6, image)
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.food_type)
    .bind(changes.name)
    .bind(changes.price)
    .bind(changes.quantity_description)
    .bind(changes.image)
    .fetch_optional(db)
    .await
    .context("update food item")?;
    Ok(item)
}

/// Returns whether a row was removed.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM food_items WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete food item")?;
    Ok(res.rows_affected() > 0)
}

/// Substring pattern for `ILIKE … ESCAPE '\'` with the user's wildcards neutralised.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("tea"), "%tea%");
        assert_eq!(like_pattern(" 50%_off "), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(like_pattern(""), "%%");
    }
}
