use crate::domain::models::Comment;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

/// Get a single comment by ID (soft-deleted rows included; the lifecycle
/// layer decides what a deleted row may still do)
pub async fn find_by_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, parent_entity_id, author_id, parent_comment_id, content, deleted_at, created_at, updated_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

/// Get the entire flat thread for a parent entity, ascending by creation
/// time. No server-side limit: tree assembly needs every row, soft-deleted
/// parents included.
pub async fn list_by_parent(
    pool: &PgPool,
    parent_entity_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, parent_entity_id, author_id, parent_comment_id, content, deleted_at, created_at, updated_at
        FROM comments
        WHERE parent_entity_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(parent_entity_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Count root-level comments for a parent entity. This is the listing
/// `total`, not the parent entity's comment counter.
pub async fn count_roots(pool: &PgPool, parent_entity_id: Uuid) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM comments
        WHERE parent_entity_id = $1 AND parent_comment_id IS NULL
        "#,
    )
    .bind(parent_entity_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Insert a new comment row. The caller is expected to pass a
/// parent_comment_id that already belongs to the same parent entity.
pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    author_id: Uuid,
    parent_entity_id: Uuid,
    content: &str,
    parent_comment_id: Option<Uuid>,
) -> Result<Comment, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (author_id, parent_entity_id, content, parent_comment_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, parent_entity_id, author_id, parent_comment_id, content, deleted_at, created_at, updated_at
        "#,
    )
    .bind(author_id)
    .bind(parent_entity_id)
    .bind(content)
    .bind(parent_comment_id)
    .fetch_one(executor)
    .await?;

    Ok(comment)
}

/// Update comment content. Returns None when the row no longer exists
/// (hard-deleted since the caller last saw it).
pub async fn update_content(
    pool: &PgPool,
    comment_id: Uuid,
    content: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments
        SET content = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, parent_entity_id, author_id, parent_comment_id, content, deleted_at, created_at, updated_at
        "#,
    )
    .bind(content)
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

/// Delete a comment, soft or hard depending on whether replies exist.
///
/// Returns `Some(true)` when the row was hard-deleted (leaf comment, row
/// removed) and `Some(false)` when it was soft-deleted (replies present,
/// row retained with `deleted_at` set). `None` means the row was already
/// gone when the mutation landed, which happens when a concurrent delete
/// won the race; the caller must not touch the parent-entity counter in
/// that case. Runs on a transaction connection so the caller can pair a
/// hard delete with the counter decrement.
pub async fn delete(
    conn: &mut PgConnection,
    comment_id: Uuid,
) -> Result<Option<bool>, sqlx::Error> {
    let has_replies: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM comments
            WHERE parent_comment_id = $1
        )
        "#,
    )
    .bind(comment_id)
    .fetch_one(&mut *conn)
    .await?;

    if has_replies {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .execute(&mut *conn)
        .await?;

        Ok((result.rows_affected() > 0).then_some(false))
    } else {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *conn)
            .await?;

        Ok((result.rows_affected() > 0).then_some(true))
    }
}

/// Get one page of an author's comments across threads, newest first,
/// optionally narrowed to a single parent entity
pub async fn list_by_author(
    pool: &PgPool,
    author_id: Uuid,
    parent_entity_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, parent_entity_id, author_id, parent_comment_id, content, deleted_at, created_at, updated_at
        FROM comments
        WHERE author_id = $1
          AND ($2::uuid IS NULL OR parent_entity_id = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(author_id)
    .bind(parent_entity_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Count an author's comments, matching the filter of `list_by_author`
pub async fn count_by_author(
    pool: &PgPool,
    author_id: Uuid,
    parent_entity_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM comments
        WHERE author_id = $1
          AND ($2::uuid IS NULL OR parent_entity_id = $2)
        "#,
    )
    .bind(author_id)
    .bind(parent_entity_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
