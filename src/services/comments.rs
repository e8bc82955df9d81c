/// Comment lifecycle orchestration: authorization, the soft/hard delete
/// rule, and parent-entity counter side effects.
///
/// One service instance exists per parent entity kind, differing only in
/// the injected `ParentEntityStore`. Row mutations and their counter side
/// effects share a single transaction, so a failed counter update rolls
/// the row back with it.
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{Comment, CommentPage, Pagination, ThreadPage, VotePolarity};
use crate::error::{AppError, Result};
use crate::repository::{comments, votes, ParentEntityStore};
use crate::services::tree::{self, PageParams};

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    parents: Arc<dyn ParentEntityStore>,
}

impl CommentService {
    pub fn new(pool: PgPool, parents: Arc<dyn ParentEntityStore>) -> Self {
        Self { pool, parents }
    }

    /// List one page of a parent entity's thread: paginated roots carrying
    /// their complete reply subtrees, vote tallies computed fresh.
    ///
    /// The read is not transactionally isolated from concurrent writers; a
    /// reply inserted mid-listing may or may not appear. Acceptable read
    /// skew for a discussion UI.
    pub async fn list_thread(
        &self,
        parent_entity_id: Uuid,
        params: PageParams,
        viewer_id: Option<Uuid>,
    ) -> Result<ThreadPage> {
        let (page, limit) = params.normalize();

        let flat = comments::list_by_parent(&self.pool, parent_entity_id).await?;
        let vote_rows = votes::list_by_parent(&self.pool, parent_entity_id).await?;
        let total = comments::count_roots(&self.pool, parent_entity_id).await?;

        let forest = tree::build_thread(flat, &vote_rows, viewer_id);
        let items = tree::paginate_roots(forest, page, limit);

        Ok(ThreadPage {
            items,
            total,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Create a comment (root or reply) under an existing parent entity.
    /// Every successful create increments the parent's comment counter,
    /// root and reply alike.
    pub async fn create(
        &self,
        author_id: Uuid,
        parent_entity_id: Uuid,
        content: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Comment> {
        if !self.parents.exists(parent_entity_id).await? {
            return Err(AppError::NotFound("parent entity not found".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let comment = comments::insert(
            &mut *tx,
            author_id,
            parent_entity_id,
            content,
            parent_comment_id,
        )
        .await?;
        self.parents
            .increment_comment_count(&mut tx, parent_entity_id)
            .await?;
        tx.commit().await?;

        tracing::debug!(
            comment_id = %comment.id,
            parent_entity_id = %parent_entity_id,
            is_reply = parent_comment_id.is_some(),
            "comment created"
        );

        Ok(comment)
    }

    /// Edit a comment's content. Author-only; a soft-deleted comment can
    /// never be edited again.
    pub async fn update(&self, actor_id: Uuid, comment_id: Uuid, content: &str) -> Result<Comment> {
        let comment = self.find_existing(comment_id).await?;

        if comment.author_id != actor_id {
            return Err(AppError::Unauthorized(
                "you can only edit your own comments".to_string(),
            ));
        }
        if comment.is_deleted() {
            return Err(AppError::InvalidState(
                "cannot edit a deleted comment".to_string(),
            ));
        }

        let updated = comments::update_content(&self.pool, comment_id, content)
            .await?
            .ok_or_else(|| AppError::NotFound("comment not found".to_string()))?;
        Ok(updated)
    }

    /// Delete a comment. With replies present the row is soft-deleted and
    /// the counter untouched; a leaf is hard-deleted and the counter
    /// decremented, in the same transaction.
    pub async fn delete(&self, actor_id: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = self.find_existing(comment_id).await?;

        if comment.author_id != actor_id {
            return Err(AppError::Unauthorized(
                "you can only delete your own comments".to_string(),
            ));
        }
        if comment.is_deleted() {
            return Err(AppError::InvalidState(
                "comment is already deleted".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        // a concurrent delete may have removed the row after the lifecycle
        // checks above; the counter must not be decremented twice
        let Some(hard_deleted) = comments::delete(&mut tx, comment_id).await? else {
            tx.rollback().await?;
            return Err(AppError::NotFound("comment not found".to_string()));
        };
        if hard_deleted {
            self.parents
                .decrement_comment_count(&mut tx, comment.parent_entity_id)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(
            comment_id = %comment_id,
            hard_deleted,
            "comment deleted"
        );

        Ok(())
    }

    /// Cast or change a vote on an existing comment. Repeat votes from the
    /// same voter overwrite polarity; no counter is touched, tallies are
    /// derived at read time.
    pub async fn vote(&self, voter_id: Uuid, comment_id: Uuid, polarity: VotePolarity) -> Result<()> {
        self.find_existing(comment_id).await?;
        // the comment can be hard-deleted between the check and the insert;
        // the FK violation is the target disappearing, not a server fault
        match votes::upsert(&self.pool, voter_id, comment_id, polarity).await {
            Ok(()) => Ok(()),
            Err(e)
                if e.as_database_error()
                    .is_some_and(|db| db.is_foreign_key_violation()) =>
            {
                Err(AppError::NotFound("comment not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Retract a vote. Fails when no vote row exists; retraction is not a
    /// silent no-op.
    pub async fn remove_vote(&self, voter_id: Uuid, comment_id: Uuid) -> Result<()> {
        self.find_existing(comment_id).await?;
        let removed = votes::remove(&self.pool, voter_id, comment_id).await?;
        if !removed {
            return Err(AppError::NotFound("vote not found".to_string()));
        }
        Ok(())
    }

    /// Flat, newest-first page of one author's comments across threads,
    /// optionally narrowed to a single parent entity
    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        parent_entity_id: Option<Uuid>,
        params: PageParams,
        viewer_id: Option<Uuid>,
    ) -> Result<CommentPage> {
        let (page, limit) = params.normalize();
        let offset = PageParams::offset(page, limit);

        let rows =
            comments::list_by_author(&self.pool, author_id, parent_entity_id, limit, offset)
                .await?;
        let total = comments::count_by_author(&self.pool, author_id, parent_entity_id).await?;

        let ids: Vec<Uuid> = rows.iter().map(|c| c.id).collect();
        let vote_rows = votes::list_for_comments(&self.pool, &ids).await?;
        let items = tree::annotate_flat(rows, &vote_rows, viewer_id);

        Ok(CommentPage {
            items,
            total,
            pagination: Pagination::new(page, limit, total),
        })
    }

    async fn find_existing(&self, comment_id: Uuid) -> Result<Comment> {
        comments::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("comment not found".to_string()))
    }
}
