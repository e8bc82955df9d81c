use crate::domain::models::{CommentVote, VotePolarity};
use sqlx::PgPool;
use uuid::Uuid;

/// Record or change a vote. Upsert keyed by (voter, comment): voting again
/// with the same or opposite polarity overwrites the existing row instead
/// of inserting a duplicate.
pub async fn upsert(
    pool: &PgPool,
    voter_id: Uuid,
    comment_id: Uuid,
    polarity: VotePolarity,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comment_votes (voter_id, comment_id, polarity)
        VALUES ($1, $2, $3)
        ON CONFLICT (voter_id, comment_id) DO UPDATE
        SET polarity = EXCLUDED.polarity
        "#,
    )
    .bind(voter_id)
    .bind(comment_id)
    .bind(polarity)
    .execute(pool)
    .await?;

    Ok(())
}

/// Retract a vote. Returns false when no row existed; the lifecycle layer
/// turns that into a failure rather than a silent no-op.
pub async fn remove(pool: &PgPool, voter_id: Uuid, comment_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM comment_votes
        WHERE voter_id = $1 AND comment_id = $2
        "#,
    )
    .bind(voter_id)
    .bind(comment_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get every vote row for a thread in a single query, joined through the
/// comments table. Tallies are always computed fresh from these rows.
pub async fn list_by_parent(
    pool: &PgPool,
    parent_entity_id: Uuid,
) -> Result<Vec<CommentVote>, sqlx::Error> {
    let votes = sqlx::query_as::<_, CommentVote>(
        r#"
        SELECT cv.voter_id, cv.comment_id, cv.polarity, cv.created_at
        FROM comment_votes cv
        JOIN comments c ON c.id = cv.comment_id
        WHERE c.parent_entity_id = $1
        "#,
    )
    .bind(parent_entity_id)
    .fetch_all(pool)
    .await?;

    Ok(votes)
}

/// Batch fetch vote rows for an explicit set of comments (flat listings)
pub async fn list_for_comments(
    pool: &PgPool,
    comment_ids: &[Uuid],
) -> Result<Vec<CommentVote>, sqlx::Error> {
    if comment_ids.is_empty() {
        return Ok(Vec::new());
    }

    let votes = sqlx::query_as::<_, CommentVote>(
        r#"
        SELECT voter_id, comment_id, polarity, created_at
        FROM comment_votes
        WHERE comment_id = ANY($1)
        "#,
    )
    .bind(comment_ids)
    .fetch_all(pool)
    .await?;

    Ok(votes)
}
