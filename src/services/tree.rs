/// Thread assembly: vote aggregation, reply-tree construction, and
/// root-level pagination.
///
/// Everything here is pure and synchronous. The repository hands over one
/// flat, creation-ascending list of comments plus the raw vote rows; tree
/// construction is two linear passes over an id-keyed arena, no recursion
/// and no further queries regardless of thread depth.
use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::models::{Comment, CommentNode, CommentVote, VotePolarity};

/// Aggregated votes for one comment
#[derive(Debug, Clone, Copy, Default)]
struct VoteTally {
    upvotes: i64,
    downvotes: i64,
    viewer_vote: Option<VotePolarity>,
}

/// Fold raw vote rows into per-comment tallies. Comment vote counts are
/// recomputed on every read instead of being cached in a counter column;
/// they are low-cardinality and read rarely enough that the recount is
/// cheaper than keeping a transactional counter honest.
fn tally_votes(votes: &[CommentVote], viewer_id: Option<Uuid>) -> HashMap<Uuid, VoteTally> {
    let mut tallies: HashMap<Uuid, VoteTally> = HashMap::new();

    for vote in votes {
        let tally = tallies.entry(vote.comment_id).or_default();
        match vote.polarity {
            VotePolarity::Upvote => tally.upvotes += 1,
            VotePolarity::Downvote => tally.downvotes += 1,
        }
        if viewer_id == Some(vote.voter_id) {
            tally.viewer_vote = Some(vote.polarity);
        }
    }

    tallies
}

fn annotate(comment: Comment, tallies: &HashMap<Uuid, VoteTally>) -> CommentNode {
    let tally = tallies.get(&comment.id).copied().unwrap_or_default();
    CommentNode::from_comment(comment, tally.upvotes, tally.downvotes, tally.viewer_vote)
}

/// Build the reply forest from a flat thread ordered ascending by creation
/// time.
///
/// Pass 1 indexes every annotated comment by id. Pass 2 walks the thread
/// newest-to-oldest: a reply is always created after its parent, so by the
/// time a comment is detached from the arena its reply list is already
/// complete. Replies whose parent is missing from the arena are omitted
/// from the result (soft delete retains rows, so this only happens on
/// inconsistent data).
///
/// Roots come out sorted by creation time descending (newest discussion
/// first) while reply lists keep ascending, natural conversation order.
/// The asymmetry is intentional.
pub fn build_thread(
    comments: Vec<Comment>,
    votes: &[CommentVote],
    viewer_id: Option<Uuid>,
) -> Vec<CommentNode> {
    let tallies = tally_votes(votes, viewer_id);

    let order: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut arena: HashMap<Uuid, CommentNode> = HashMap::with_capacity(comments.len());
    for comment in comments {
        arena.insert(comment.id, annotate(comment, &tallies));
    }

    let mut roots: Vec<CommentNode> = Vec::new();
    for id in order.iter().rev() {
        let Some(mut node) = arena.remove(id) else {
            continue;
        };
        // children were attached newest-first while this node sat in the arena
        node.replies.reverse();

        match node.parent_comment_id {
            None => roots.push(node),
            Some(parent_id) => match arena.get_mut(&parent_id) {
                Some(parent) => parent.replies.push(node),
                None => {
                    tracing::debug!(
                        comment_id = %id,
                        parent_comment_id = %parent_id,
                        "dropping reply whose parent is not in the thread"
                    );
                }
            },
        }
    }

    roots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    roots
}

/// Annotate a flat comment list without tree assembly (per-author listings)
pub fn annotate_flat(
    comments: Vec<Comment>,
    votes: &[CommentVote],
    viewer_id: Option<Uuid>,
) -> Vec<CommentNode> {
    let tallies = tally_votes(votes, viewer_id);
    comments
        .into_iter()
        .map(|comment| annotate(comment, &tallies))
        .collect()
}

/// Pagination query parameters, normalized before use
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamp to page >= 1 and limit in [1, 100]
    pub fn normalize(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (page, limit)
    }

    /// Saturating arithmetic: an absurd page number must produce an
    /// empty page, never an overflow
    pub fn offset(page: i64, limit: i64) -> i64 {
        page.saturating_sub(1).saturating_mul(limit)
    }
}

/// Slice the root list for one page. Applied after the full tree is built:
/// every reply beneath an included root ships in full, whatever the depth
/// or count, so payload size is bounded by root pagination only.
pub fn paginate_roots(roots: Vec<CommentNode>, page: i64, limit: i64) -> Vec<CommentNode> {
    roots
        .into_iter()
        .skip(PageParams::offset(page, limit) as usize)
        .take(limit as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DELETED_PLACEHOLDER;
    use chrono::{Duration, TimeZone, Utc};

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn comment(n: u128, parent: Option<u128>, author: u128) -> Comment {
        let created = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap() + Duration::seconds(n as i64);
        Comment {
            id: uuid(n),
            parent_entity_id: uuid(999),
            author_id: uuid(author),
            parent_comment_id: parent.map(uuid),
            content: format!("comment {}", n),
            deleted_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn vote(comment: u128, voter: u128, polarity: VotePolarity) -> CommentVote {
        CommentVote {
            voter_id: uuid(voter),
            comment_id: uuid(comment),
            polarity,
            created_at: Utc::now(),
        }
    }

    fn count_nodes(nodes: &[CommentNode]) -> usize {
        let mut total = 0;
        let mut stack: Vec<&CommentNode> = nodes.iter().collect();
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.replies.iter());
        }
        total
    }

    #[test]
    fn builds_forest_with_every_stored_comment() {
        // two roots, one with a nested reply chain
        let comments = vec![
            comment(1, None, 10),
            comment(2, Some(1), 11),
            comment(3, Some(2), 12),
            comment(4, None, 13),
            comment(5, Some(1), 14),
        ];

        let roots = build_thread(comments, &[], None);

        assert_eq!(roots.len(), 2);
        assert_eq!(count_nodes(&roots), 5);
    }

    #[test]
    fn roots_descend_replies_ascend() {
        let comments = vec![
            comment(1, None, 10),
            comment(2, None, 10),
            comment(3, Some(1), 11),
            comment(4, Some(1), 11),
            comment(5, Some(1), 11),
        ];

        let roots = build_thread(comments, &[], None);

        // newest root first
        assert_eq!(roots[0].id, uuid(2));
        assert_eq!(roots[1].id, uuid(1));
        // replies in natural conversation order
        let reply_ids: Vec<Uuid> = roots[1].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![uuid(3), uuid(4), uuid(5)]);
    }

    #[test]
    fn deep_chains_need_no_recursion() {
        // 500-deep reply chain; would overflow a recursive builder's stack
        // budget long before a real thread would
        let mut comments = vec![comment(1, None, 10)];
        for n in 2..=500u128 {
            comments.push(comment(n, Some(n - 1), 10));
        }

        let roots = build_thread(comments, &[], None);

        assert_eq!(roots.len(), 1);
        assert_eq!(count_nodes(&roots), 500);
    }

    #[test]
    fn orphaned_reply_is_omitted() {
        let comments = vec![
            comment(1, None, 10),
            // parent 77 was never fetched for this thread
            comment(2, Some(77), 11),
        ];

        let roots = build_thread(comments, &[], None);

        assert_eq!(roots.len(), 1);
        assert_eq!(count_nodes(&roots), 1);
    }

    #[test]
    fn tallies_votes_per_comment() {
        let comments = vec![comment(1, None, 10), comment(2, None, 10)];
        let votes = vec![
            vote(1, 20, VotePolarity::Upvote),
            vote(1, 21, VotePolarity::Upvote),
            vote(1, 22, VotePolarity::Downvote),
            vote(2, 20, VotePolarity::Downvote),
        ];

        let roots = build_thread(comments, &votes, None);

        let c1 = roots.iter().find(|n| n.id == uuid(1)).unwrap();
        let c2 = roots.iter().find(|n| n.id == uuid(2)).unwrap();
        assert_eq!((c1.upvotes, c1.downvotes), (2, 1));
        assert_eq!((c2.upvotes, c2.downvotes), (0, 1));
    }

    #[test]
    fn viewer_vote_only_set_for_the_viewer() {
        let comments = vec![comment(1, None, 10)];
        let votes = vec![
            vote(1, 20, VotePolarity::Upvote),
            vote(1, 21, VotePolarity::Downvote),
        ];

        let as_voter = build_thread(comments.clone(), &votes, Some(uuid(21)));
        assert_eq!(as_voter[0].viewer_vote, Some(VotePolarity::Downvote));

        let as_stranger = build_thread(comments.clone(), &votes, Some(uuid(99)));
        assert_eq!(as_stranger[0].viewer_vote, None);

        let anonymous = build_thread(comments, &votes, None);
        assert_eq!(anonymous[0].viewer_vote, None);
    }

    #[test]
    fn soft_deleted_parent_keeps_replies_and_masks_content() {
        let mut deleted_root = comment(1, None, 10);
        deleted_root.deleted_at = Some(deleted_root.created_at);
        let comments = vec![deleted_root, comment(2, Some(1), 11)];

        let roots = build_thread(comments, &[], None);

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].content, DELETED_PLACEHOLDER);
        assert!(roots[0].deleted);
        assert_eq!(roots[0].replies.len(), 1);
        assert_eq!(roots[0].replies[0].content, "comment 2");
    }

    #[test]
    fn annotate_flat_preserves_input_order() {
        let comments = vec![comment(3, None, 10), comment(1, None, 10)];
        let nodes = annotate_flat(comments, &[], None);
        let ids: Vec<Uuid> = nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![uuid(3), uuid(1)]);
    }

    #[test]
    fn page_params_clamp() {
        let defaults = PageParams::default();
        assert_eq!(defaults.normalize(), (1, 20));

        let wild = PageParams {
            page: Some(-3),
            limit: Some(100_000),
        };
        assert_eq!(wild.normalize(), (1, 100));

        let tiny = PageParams {
            page: Some(2),
            limit: Some(0),
        };
        assert_eq!(tiny.normalize(), (2, 1));
    }

    #[test]
    fn pagination_slices_roots_only() {
        let mut comments = Vec::new();
        for n in 1..=5u128 {
            comments.push(comment(n, None, 10));
        }
        // a large subtree under the newest root survives pagination intact
        for n in 6..=30u128 {
            comments.push(comment(n, Some(5), 11));
        }

        let roots = build_thread(comments, &[], None);
        let page = paginate_roots(roots, 1, 2);

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, uuid(5));
        assert_eq!(page[0].replies.len(), 25);
    }

    #[test]
    fn absurd_page_numbers_do_not_overflow() {
        assert_eq!(PageParams::offset(i64::MAX, 20), i64::MAX);
        assert_eq!(PageParams::offset(i64::MAX, i64::MAX), i64::MAX);

        let comments = vec![comment(1, None, 10), comment(2, None, 10)];
        let roots = build_thread(comments, &[], None);
        assert!(paginate_roots(roots, i64::MAX, 20).is_empty());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let comments = vec![comment(1, None, 10), comment(2, None, 10)];
        let roots = build_thread(comments, &[], None);
        let page = paginate_roots(roots, 4, 20);
        assert!(page.is_empty());
    }
}
