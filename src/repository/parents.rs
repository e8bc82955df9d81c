use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Narrow contract the discussion engine holds against a parent-entity
/// module: an existence check before comment creation, plus the comment
/// counter mutators. One engine instance exists per implementation instead
/// of one copy-pasted engine per entity kind.
///
/// The counter mutators run on the caller's transaction connection so a
/// comment row mutation and its counter side effect commit together or not
/// at all. Each mutator is a single atomic UPDATE; correctness under
/// concurrent authors rests on that atomicity.
#[async_trait]
pub trait ParentEntityStore: Send + Sync {
    async fn exists(&self, parent_entity_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn increment_comment_count(
        &self,
        conn: &mut PgConnection,
        parent_entity_id: Uuid,
    ) -> Result<(), sqlx::Error>;

    async fn decrement_comment_count(
        &self,
        conn: &mut PgConnection,
        parent_entity_id: Uuid,
    ) -> Result<(), sqlx::Error>;
}

/// Parent-entity store for posts
#[derive(Clone)]
pub struct PostStore {
    pool: PgPool,
}

impl PostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParentEntityStore for PostStore {
    async fn exists(&self, parent_entity_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(parent_entity_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn increment_comment_count(
        &self,
        conn: &mut PgConnection,
        parent_entity_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(parent_entity_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn decrement_comment_count(
        &self,
        conn: &mut PgConnection,
        parent_entity_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE posts SET comment_count = comment_count - 1 WHERE id = $1")
            .bind(parent_entity_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}

/// Parent-entity store for location reviews
#[derive(Clone)]
pub struct ReviewStore {
    pool: PgPool,
}

impl ReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParentEntityStore for ReviewStore {
    async fn exists(&self, parent_entity_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reviews WHERE id = $1)")
                .bind(parent_entity_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn increment_comment_count(
        &self,
        conn: &mut PgConnection,
        parent_entity_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reviews SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(parent_entity_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn decrement_comment_count(
        &self,
        conn: &mut PgConnection,
        parent_entity_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reviews SET comment_count = comment_count - 1 WHERE id = $1")
            .bind(parent_entity_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
