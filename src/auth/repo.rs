use crate::auth::repo_types::User;
use anyhow::Context;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

/// Fields captured at signup.
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub branch: &'a str,
    pub role: &'a str,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, branch, role, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, branch, role, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Create a new, non-admin user. `None` when the email is already registered,
    /// including when a concurrent signup won the race.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, branch, role, is_admin)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, password_hash, branch, role, is_admin, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.branch)
        .bind(new.role)
        .fetch_optional(db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    /// Current admin flag; `None` when the user no longer exists.
    /// Runs on any executor, including a transaction that already holds a connection.
    pub async fn admin_flag<'e, E>(db: E, id: Uuid) -> anyhow::Result<Option<bool>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let flag = sqlx::query_scalar::<_, bool>(r#"SELECT is_admin FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await
            .context("load admin flag")?;
        Ok(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asha<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            name: "Asha",
            email,
            password_hash: "$argon2id$stub",
            branch: "IT",
            role: "student",
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_email_yields_none(pool: PgPool) {
        let first = User::create(&pool, asha("asha@ssbs.sies.edu.in")).await.unwrap();
        assert!(first.is_some());
        let again = User::create(&pool, asha("asha@ssbs.sies.edu.in")).await.unwrap();
        assert!(again.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn admin_flag_reads_current_value(pool: PgPool) {
        let user = User::create(&pool, asha("admin@ssbs.sies.edu.in"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(User::admin_flag(&pool, user.id).await.unwrap(), Some(false));

        sqlx::query("UPDATE users SET is_admin = TRUE WHERE id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();
        let mut tx = pool.begin().await.unwrap();
        assert_eq!(User::admin_flag(&mut *tx, user.id).await.unwrap(), Some(true));
        assert_eq!(User::admin_flag(&mut *tx, Uuid::new_v4()).await.unwrap(), None);
    }
}
