use std::collections::HashMap;

use crate::{
    api::{CommentId, LikeStatus},
    CommentPatch, CommentTree,
};

/// State of one comment before its in-flight toggle started
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Snapshot {
    seq: u64,
    is_liked: bool,
    like_count: u64,
}

/// Proof that a like toggle was started, to be handed back to `succeed` or
/// `fail` once the server answered
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LikeTicket {
    pub id: CommentId,
    seq: u64,

    /// Liked state the comment was optimistically switched to
    pub now_liked: bool,
}

/// Optimistic like/unlike with rollback.
///
/// Each comment is either idle or has exactly one toggle pending. Comments
/// are independent from one another.
#[derive(Clone, Debug, Default)]
pub struct LikeController {
    pending: HashMap<CommentId, Snapshot>,
    next_seq: u64,
}

impl LikeController {
    pub fn new() -> LikeController {
        LikeController::default()
    }

    pub fn is_pending(&self, id: &CommentId) -> bool {
        self.pending.contains_key(id)
    }

    /// Flips the like state of `id` locally and marks it pending.
    ///
    /// Returns None, changing nothing, if a toggle is already pending for
    /// `id` or if `id` is not cached.
    pub fn begin(&mut self, tree: &mut CommentTree, id: CommentId) -> Option<LikeTicket> {
        if self.is_pending(&id) {
            tracing::debug!(?id, "ignoring like toggle while another one is pending");
            return None;
        }
        let c = tree.get(&id)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        let before = Snapshot {
            seq,
            is_liked: c.is_liked,
            like_count: c.like_count,
        };
        let now_liked = !before.is_liked;
        let like_count = match now_liked {
            true => before.like_count.saturating_add(1),
            false => before.like_count.saturating_sub(1),
        };
        tree.patch(&id, &CommentPatch::like(now_liked, like_count));
        self.pending.insert(id, before);
        Some(LikeTicket { id, seq, now_liked })
    }

    /// The server accepted the toggle: the optimistic state is kept
    pub fn succeed(&mut self, ticket: &LikeTicket, status: LikeStatus) {
        if self.take(ticket).is_none() {
            return;
        }
        if status.status != ticket.now_liked {
            tracing::warn!(id=?ticket.id, server = status.status, local = ticket.now_liked, "server like state differs from optimistic state");
        }
    }

    /// The toggle failed: the comment goes back to exactly its state before
    /// `begin`. Does nothing to the tree if the comment was evicted meanwhile.
    pub fn fail(&mut self, tree: &mut CommentTree, ticket: &LikeTicket) {
        if let Some(before) = self.take(ticket) {
            tree.patch(
                &ticket.id,
                &CommentPatch::like(before.is_liked, before.like_count),
            );
        }
    }

    /// Removes the pending state `ticket` refers to. Tickets outlived by an
    /// eviction of their comment match nothing.
    fn take(&mut self, ticket: &LikeTicket) -> Option<Snapshot> {
        match self.pending.get(&ticket.id) {
            Some(s) if s.seq == ticket.seq => self.pending.remove(&ticket.id),
            _ => None,
        }
    }

    /// Drops the pending state of an evicted comment
    pub fn forget(&mut self, id: &CommentId) {
        self.pending.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::comment;

    fn tree_with(like_count: u64, is_liked: bool) -> (CommentTree, CommentId) {
        let mut t = CommentTree::new();
        let mut c = comment(None, "c");
        c.like_count = like_count;
        c.is_liked = is_liked;
        let id = c.id;
        t.attach_page(None, vec![c]);
        (t, id)
    }

    fn state(t: &CommentTree, id: &CommentId) -> (bool, u64) {
        let c = t.get(id).unwrap();
        (c.is_liked, c.like_count)
    }

    #[test]
    fn failure_rolls_back_exactly() {
        let (mut t, id) = tree_with(5, false);
        let mut likes = LikeController::new();
        let ticket = likes.begin(&mut t, id).unwrap();
        assert_eq!(state(&t, &id), (true, 6));
        likes.fail(&mut t, &ticket);
        assert_eq!(state(&t, &id), (false, 5));
        assert!(!likes.is_pending(&id));
    }

    #[test]
    fn success_keeps_optimistic_state() {
        let (mut t, id) = tree_with(5, true);
        let mut likes = LikeController::new();
        let ticket = likes.begin(&mut t, id).unwrap();
        assert!(!ticket.now_liked);
        likes.succeed(&ticket, LikeStatus { status: false });
        assert_eq!(state(&t, &id), (false, 4));
        assert!(likes.begin(&mut t, id).is_some());
    }

    #[test]
    fn second_toggle_while_pending_is_rejected() {
        let (mut t, id) = tree_with(0, false);
        let mut likes = LikeController::new();
        let ticket = likes.begin(&mut t, id).unwrap();
        assert!(likes.begin(&mut t, id).is_none());
        assert_eq!(state(&t, &id), (true, 1));
        likes.fail(&mut t, &ticket);
        assert_eq!(state(&t, &id), (false, 0));
    }

    #[test]
    fn nodes_are_independent() {
        let mut t = CommentTree::new();
        let a = comment(None, "a");
        let b = comment(None, "b");
        t.attach_page(None, vec![a.clone(), b.clone()]);
        let mut likes = LikeController::new();
        let ta = likes.begin(&mut t, a.id).unwrap();
        let tb = likes.begin(&mut t, b.id).unwrap();
        likes.fail(&mut t, &ta);
        likes.succeed(&tb, LikeStatus { status: true });
        assert_eq!(state(&t, &a.id), (false, 0));
        assert_eq!(state(&t, &b.id), (true, 1));
    }

    #[test]
    fn unlike_at_zero_does_not_underflow() {
        let (mut t, id) = tree_with(0, true);
        let mut likes = LikeController::new();
        let ticket = likes.begin(&mut t, id).unwrap();
        assert_eq!(state(&t, &id), (false, 0));
        likes.fail(&mut t, &ticket);
        assert_eq!(state(&t, &id), (true, 0));
    }

    #[test]
    fn rollback_after_eviction_is_a_no_op() {
        let (mut t, id) = tree_with(2, false);
        let mut likes = LikeController::new();
        let ticket = likes.begin(&mut t, id).unwrap();
        t.remove(&id);
        likes.fail(&mut t, &ticket);
        assert!(t.is_empty());
        assert!(likes.begin(&mut t, id).is_none());
    }

    #[test]
    fn outdated_ticket_does_not_touch_new_toggle() {
        let (mut t, id) = tree_with(2, false);
        let mut likes = LikeController::new();
        let old = likes.begin(&mut t, id).unwrap();

        // the comment got evicted and fetched again
        let refetched = t.get(&id).cloned().unwrap();
        t.remove(&id);
        likes.forget(&id);
        t.attach_page(None, vec![refetched]);

        let new = likes.begin(&mut t, id).unwrap();
        assert_eq!(state(&t, &id), (false, 2));
        likes.fail(&mut t, &old);
        assert!(likes.is_pending(&id));
        assert_eq!(state(&t, &id), (false, 2));
        likes.fail(&mut t, &new);
        assert_eq!(state(&t, &id), (true, 3));
    }
}
