use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use time::PrimitiveDateTime;
use tracing::debug;

use crate::auth::dto::UserSummary;
use crate::auth::repo_types::{NewUser, User};
use crate::auth::validation::Field;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage layer refused the insert because of a UNIQUE index.
    #[error("unique constraint violated on {}", .0.as_str())]
    ConstraintViolation(Field),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Handle to the `users` table. Cheap to clone, shares the pool.
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse database url {}", url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the schema if absent. Safe to run on every startup.
    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("apply migrations")?;
        debug!("users schema ready");
        Ok(())
    }

    /// Single-connection in-memory database with the schema applied.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory sqlite");
        let store = Self::from_pool(pool);
        store.init().await.expect("apply schema");
        store
    }

    #[cfg(test)]
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Insert a user and return the stored row.
    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, StoreError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, full_name)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, email, password, full_name, created_at
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.full_name)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::ConstraintViolation(violated_field(e.message())))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find the user whose username or email equals `identifier`.
    pub async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, full_name, created_at
            FROM users
            WHERE username = ? OR email = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// All users by ascending id. The password column is never read.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String, String, String, PrimitiveDateTime)>(
            r#"
            SELECT id, username, email, full_name, created_at
              FROM users
             ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username, email, full_name, created_at)| UserSummary {
                id,
                username,
                email,
                full_name,
                created_at,
            })
            .collect())
    }
}

// SQLite reports e.g. "UNIQUE constraint failed: users.email".
fn violated_field(message: &str) -> Field {
    if message.contains("users.email") {
        Field::Email
    } else {
        Field::Username
    }
}
