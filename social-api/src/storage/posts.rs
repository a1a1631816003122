//! Post repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::{PostRepository, StorageResult};

/// Post record. `id` and the timestamps are assigned by the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        user_id: i64,
        tags: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
            tags,
            ..Self::default()
        }
    }
}

/// PostgreSQL-backed [`PostRepository`].
#[derive(Debug, Clone)]
pub struct PostsStore {
    pool: PgPool,
}

impl PostsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostsStore {
    /// Single INSERT ... RETURNING; the stored row replaces `post` wholesale,
    /// so title, content and tags reflect what the database kept.
    async fn create(&self, post: &mut Post) -> StorageResult<()> {
        let stored: Post = sqlx::query_as(
            r#"
            INSERT INTO posts (title, content, user_id, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, user_id, tags, created_at, updated_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.user_id)
        .bind(&post.tags)
        .fetch_one(&self.pool)
        .await?;

        *post = stored;
        tracing::info!(post_id = post.id, user_id = post.user_id, "Created post");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{test_pool, unreachable_pool, User, UserRepository, UsersStore};

    #[test]
    fn new_post_has_no_server_fields() {
        let post = Post::new("T", "C", 1, vec!["a".into(), "b".into()]);

        assert_eq!(post.id, 0);
        assert_eq!(post.created_at, DateTime::<Utc>::default());
        assert_eq!(post.updated_at, DateTime::<Utc>::default());
        assert_eq!(post.tags, vec!["a", "b"]);
    }

    #[test]
    fn serializes_with_column_names() {
        let post = Post::new("T", "C", 7, vec!["x".into()]);
        let json = serde_json::to_value(&post).unwrap();

        assert_eq!(json["title"], "T");
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["tags"], serde_json::json!(["x"]));
        assert!(json.get("created_at").is_some());
    }

    #[tokio::test]
    async fn failed_insert_leaves_post_unchanged() {
        let store = PostsStore::new(unreachable_pool());
        let mut post = Post::new("T", "C", 1, vec!["a".into(), "b".into()]);
        let before = post.clone();

        let err = store.create(&mut post).await.unwrap_err();

        assert!(!err.is_constraint_violation());
        assert_eq!(post, before);
        assert_eq!(post.id, 0);
    }

    // Integration tests - run with DATABASE_URL set
    // cargo test -p social-api -- --ignored

    async fn insert_owner(pool: &PgPool) -> User {
        let suffix = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut user = User::new(
            "Post",
            "Owner",
            format!("owner{}", suffix),
            format!("owner{}@example.com", suffix),
            "secret",
        );
        UsersStore::new(pool.clone())
            .create(&mut user)
            .await
            .expect("owner insert failed");
        user
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_populates_server_fields() {
        let pool = test_pool().await;
        let owner = insert_owner(&pool).await;
        let store = PostsStore::new(pool);
        let mut post = Post::new("T", "C", owner.id, vec!["a".into(), "b".into()]);

        store.create(&mut post).await.expect("insert failed");

        assert!(post.id > 0);
        assert!(post.created_at > DateTime::<Utc>::default());
        assert!(post.updated_at > DateTime::<Utc>::default());
        assert_eq!(post.title, "T");
        assert_eq!(post.content, "C");
        assert_eq!(post.user_id, owner.id);
        assert_eq!(post.tags, vec!["a", "b"]);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_owner_is_a_constraint_violation() {
        let store = PostsStore::new(test_pool().await);
        let mut post = Post::new("T", "C", i64::MAX, vec![]);
        let before = post.clone();

        let err = store.create(&mut post).await.unwrap_err();

        assert!(err.is_constraint_violation());
        assert_eq!(post, before);
        assert_eq!(post.id, 0);
    }
}
