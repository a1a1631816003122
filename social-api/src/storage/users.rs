//! User repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::{StorageResult, UserRepository};

/// User record. `id` and the timestamps are assigned by the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    /// Stored as given; never hashed here and never serialized.
    #[serde(skip_serializing, default)]
    #[sqlx(skip)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

/// PostgreSQL-backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct UsersStore {
    pool: PgPool,
}

impl UsersStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UsersStore {
    /// The password is written but not read back; the caller's copy is kept.
    async fn create(&self, user: &mut User) -> StorageResult<()> {
        let mut stored: User = sqlx::query_as(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, username, email, created_at, updated_at
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await?;

        stored.password = std::mem::take(&mut user.password);
        *user = stored;
        tracing::info!(user_id = user.id, username = %user.username, "Created user");
        Ok(())
    }
}
