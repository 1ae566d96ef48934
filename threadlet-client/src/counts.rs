use crate::{api::CommentId, CommentTree};

/// Keeps the section-wide comment count and the parents' `reply_count` in
/// step with local creations and deletions.
///
/// Only the direct parent of a created or deleted comment is touched:
/// deleting a comment never accounts for its replies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ThreadCounts {
    total: u64,
}

impl ThreadCounts {
    pub fn new(total: u64) -> ThreadCounts {
        ThreadCounts { total }
    }

    /// Number of comments, at any depth, in the section
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn on_created(&mut self, tree: &mut CommentTree, parent: Option<CommentId>) {
        self.total = self.total.saturating_add(1);
        if let Some(p) = parent {
            tree.update(&p, |c| c.reply_count = c.reply_count.saturating_add(1));
        }
    }

    pub fn on_deleted(&mut self, tree: &mut CommentTree, parent: Option<CommentId>) {
        self.total = self.total.saturating_sub(1);
        if let Some(p) = parent {
            tree.update(&p, |c| c.reply_count = c.reply_count.saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::comment;

    #[test]
    fn reply_round_trip_restores_counters() {
        let mut t = CommentTree::new();
        let mut p = comment(None, "p");
        p.reply_count = 2;
        t.attach_page(None, vec![p.clone()]);
        let mut counts = ThreadCounts::new(10);

        counts.on_created(&mut t, Some(p.id));
        assert_eq!(counts.total(), 11);
        assert_eq!(t.get(&p.id).unwrap().reply_count, 3);

        counts.on_deleted(&mut t, Some(p.id));
        assert_eq!(counts.total(), 10);
        assert_eq!(t.get(&p.id).unwrap().reply_count, 2);
    }

    #[test]
    fn root_comments_only_touch_the_total() {
        let mut t = CommentTree::new();
        let mut counts = ThreadCounts::new(0);
        counts.on_created(&mut t, None);
        counts.on_created(&mut t, None);
        counts.on_deleted(&mut t, None);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn uncached_parent_still_counts_in_total() {
        let mut t = CommentTree::new();
        let mut counts = ThreadCounts::new(3);
        counts.on_created(&mut t, Some(CommentId::stub()));
        assert_eq!(counts.total(), 4);
        assert!(t.is_empty());
    }
}
