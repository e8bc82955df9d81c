use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder shown in place of a soft-deleted comment's content.
/// Deletion state is stored in `deleted_at`; this string never hits the
/// database.
pub const DELETED_PLACEHOLDER: &str = "[deleted]";

/// Direction of a comment vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_polarity", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VotePolarity {
    Upvote,
    Downvote,
}

/// Comment entity - a row in the comments table, either a root comment on a
/// parent entity (post or review) or a reply to another comment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub parent_entity_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Vote entity - one row per (voter, comment) pair; repeat votes by the
/// same voter overwrite polarity instead of inserting a duplicate
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentVote {
    pub voter_id: Uuid,
    pub comment_id: Uuid,
    pub polarity: VotePolarity,
    pub created_at: DateTime<Utc>,
}

/// A comment as returned to readers: vote tallies attached, content masked
/// when soft-deleted, replies nested in conversation order
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub id: Uuid,
    pub parent_entity_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub deleted: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub viewer_vote: Option<VotePolarity>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn from_comment(
        comment: Comment,
        upvotes: i64,
        downvotes: i64,
        viewer_vote: Option<VotePolarity>,
    ) -> Self {
        let deleted = comment.is_deleted();
        CommentNode {
            id: comment.id,
            parent_entity_id: comment.parent_entity_id,
            author_id: comment.author_id,
            parent_comment_id: comment.parent_comment_id,
            content: if deleted {
                DELETED_PLACEHOLDER.to_string()
            } else {
                comment.content
            },
            deleted,
            upvotes,
            downvotes,
            viewer_vote,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            replies: Vec::new(),
        }
    }
}

/// Pagination metadata returned alongside paginated listings
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Pagination {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// One page of a thread listing: paginated roots with complete subtrees.
/// `total` counts root comments only, which deliberately diverges from the
/// parent entity's comment counter (that one counts every node).
#[derive(Debug, Clone, Serialize)]
pub struct ThreadPage {
    pub items: Vec<CommentNode>,
    pub total: i64,
    pub pagination: Pagination,
}

/// One page of a flat, per-author comment listing (no tree assembly)
#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub items: Vec<CommentNode>,
    pub total: i64,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(deleted: bool) -> Comment {
        let now = Utc::now();
        Comment {
            id: Uuid::new_v4(),
            parent_entity_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            parent_comment_id: None,
            content: "original text".to_string(),
            deleted_at: if deleted { Some(now) } else { None },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn node_masks_soft_deleted_content() {
        let node = CommentNode::from_comment(comment(true), 0, 0, None);
        assert_eq!(node.content, DELETED_PLACEHOLDER);
        assert!(node.deleted);
    }

    #[test]
    fn node_keeps_live_content() {
        let node = CommentNode::from_comment(comment(false), 2, 1, Some(VotePolarity::Upvote));
        assert_eq!(node.content, "original text");
        assert!(!node.deleted);
        assert_eq!(node.upvotes, 2);
        assert_eq!(node.downvotes, 1);
    }

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 20, 0).pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).pages, 2);
        assert_eq!(Pagination::new(1, 20, 41).pages, 3);
    }

    #[test]
    fn polarity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&VotePolarity::Upvote).unwrap(),
            "\"UPVOTE\""
        );
        assert_eq!(
            serde_json::to_string(&VotePolarity::Downvote).unwrap(),
            "\"DOWNVOTE\""
        );
    }

    #[test]
    fn nested_replies_serialize_as_arrays() {
        let mut root = CommentNode::from_comment(comment(false), 0, 0, None);
        root.replies
            .push(CommentNode::from_comment(comment(false), 0, 0, None));
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["replies"].as_array().unwrap().len(), 1);
        assert_eq!(json["replies"][0]["replies"].as_array().unwrap().len(), 0);
    }
}
