use std::collections::HashMap;

use crate::api::{Comment, CommentId, Time};

/// Shallow field update applied to a cached comment. `None` fields are left
/// untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub is_private: Option<bool>,
    pub show_client_info: Option<bool>,
    pub like_count: Option<u64>,
    pub is_liked: Option<bool>,
    pub reply_count: Option<u64>,
    pub updated_at: Option<Time>,
}

impl CommentPatch {
    /// Fields an edit is allowed to change, taken from the server's answer
    pub fn edited(c: &Comment) -> CommentPatch {
        CommentPatch {
            content: Some(c.content.clone()),
            is_private: Some(c.is_private),
            show_client_info: Some(c.show_client_info),
            updated_at: Some(c.updated_at),
            ..CommentPatch::default()
        }
    }

    pub fn like(is_liked: bool, like_count: u64) -> CommentPatch {
        CommentPatch {
            is_liked: Some(is_liked),
            like_count: Some(like_count),
            ..CommentPatch::default()
        }
    }

    pub fn apply(&self, c: &mut Comment) {
        if let Some(content) = &self.content {
            c.content = content.clone();
        }
        if let Some(p) = self.is_private {
            c.is_private = p;
        }
        if let Some(s) = self.show_client_info {
            c.show_client_info = s;
        }
        if let Some(n) = self.like_count {
            c.like_count = n;
        }
        if let Some(l) = self.is_liked {
            c.is_liked = l;
        }
        if let Some(n) = self.reply_count {
            c.reply_count = n;
        }
        if let Some(t) = self.updated_at {
            c.updated_at = t;
        }
    }
}

/// In-memory cache of the loaded part of a comment thread.
///
/// Nodes are stored flat by id, and every level (the root level being keyed
/// by `None`) keeps the ordered list of its children's ids. A node is only
/// ever cached while it is listed under its parent.
#[derive(Clone, Debug, Default)]
pub struct CommentTree {
    nodes: HashMap<CommentId, Comment>,
    children: HashMap<Option<CommentId>, Vec<CommentId>>,
}

impl CommentTree {
    pub fn new() -> CommentTree {
        CommentTree::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.nodes.get(id)
    }

    /// Ids of the cached children of `parent`, in display order
    pub fn child_ids(&self, parent: Option<CommentId>) -> &[CommentId] {
        self.children
            .get(&parent)
            .map(|v| &v[..])
            .unwrap_or(&[])
    }

    pub fn children(&self, parent: Option<CommentId>) -> impl Iterator<Item = &Comment> {
        self.child_ids(parent)
            .iter()
            .filter_map(move |id| self.nodes.get(id))
    }

    /// Whether `parent` can currently receive children: the root level always
    /// can, any other level only while its node is cached
    fn level_exists(&self, parent: Option<CommentId>) -> bool {
        match parent {
            None => true,
            Some(p) => self.nodes.contains_key(&p),
        }
    }

    /// Checks a record received for level `parent` against what is cached.
    /// Depth is never computed here, only compared.
    fn fits_level(&self, parent: Option<CommentId>, c: &Comment) -> bool {
        if c.parent_id != parent {
            tracing::warn!(id=?c.id, expected=?parent, got=?c.parent_id, "dropping comment listed under the wrong parent");
            return false;
        }
        let expected_depth = match parent {
            None => 0,
            Some(p) => match self.nodes.get(&p) {
                Some(p) => p.depth + 1,
                None => return false,
            },
        };
        if c.depth != expected_depth {
            tracing::warn!(id=?c.id, expected_depth, got = c.depth, "dropping comment with inconsistent depth");
            return false;
        }
        true
    }

    /// Appends `records` to the children of `parent`. A record already listed
    /// there is replaced in place, so attaching the same page twice is a no-op
    /// apart from refreshing the fields.
    ///
    /// Returns the number of records attached. Nothing is attached when
    /// `parent` is not cached (anymore).
    pub fn attach_page(&mut self, parent: Option<CommentId>, records: Vec<Comment>) -> usize {
        if !self.level_exists(parent) {
            tracing::debug!(?parent, "ignoring page for a level that is not cached");
            return 0;
        }
        let mut attached = 0;
        for c in records {
            if !self.fits_level(parent, &c) {
                continue;
            }
            let id = c.id;
            if self.nodes.insert(id, c).is_none() {
                self.children.entry(parent).or_insert_with(Vec::new).push(id);
            }
            attached += 1;
        }
        attached
    }

    /// Makes `records` the whole child list of `parent`. Previously cached
    /// children that are not in `records` are evicted with their subtrees;
    /// those still present keep their cached replies.
    ///
    /// Returns the ids of all evicted nodes.
    pub fn replace_children(
        &mut self,
        parent: Option<CommentId>,
        records: Vec<Comment>,
    ) -> Vec<CommentId> {
        if !self.level_exists(parent) {
            tracing::debug!(?parent, "ignoring page for a level that is not cached");
            return Vec::new();
        }
        let records = records
            .into_iter()
            .filter(|c| self.fits_level(parent, c))
            .collect::<Vec<_>>();
        let old = self.children.remove(&parent).unwrap_or_default();
        let mut evicted = Vec::new();
        for id in old {
            if !records.iter().any(|c| c.id == id) {
                self.evict_subtree(id, &mut evicted);
            }
        }
        let mut ids = Vec::with_capacity(records.len());
        for c in records {
            if !ids.contains(&c.id) {
                ids.push(c.id);
            }
            self.nodes.insert(c.id, c);
        }
        self.children.insert(parent, ids);
        evicted
    }

    /// Inserts a comment just created by the current user at the head of its
    /// level, whatever the level's order is.
    ///
    /// Returns false if its parent is not cached.
    pub fn insert_local(&mut self, c: Comment) -> bool {
        let parent = c.parent_id;
        if !self.level_exists(parent) || !self.fits_level(parent, &c) {
            return false;
        }
        let id = c.id;
        let list = self.children.entry(parent).or_insert_with(Vec::new);
        list.retain(|i| *i != id);
        list.insert(0, id);
        self.nodes.insert(id, c);
        true
    }

    /// Runs `f` on the cached comment. Returns false without calling `f` if
    /// `id` is not cached.
    pub fn update<F: FnOnce(&mut Comment)>(&mut self, id: &CommentId, f: F) -> bool {
        match self.nodes.get_mut(id) {
            Some(c) => {
                f(c);
                true
            }
            None => false,
        }
    }

    /// Returns false if `id` is not cached
    pub fn patch(&mut self, id: &CommentId, patch: &CommentPatch) -> bool {
        self.update(id, |c| patch.apply(c))
    }

    /// Evicts `id` and its whole cached subtree.
    ///
    /// Returns the removed comment and the ids of every evicted node
    /// (including `id` itself), or None if `id` was not cached.
    pub fn remove(&mut self, id: &CommentId) -> Option<(Comment, Vec<CommentId>)> {
        let parent = self.nodes.get(id)?.parent_id;
        if let Some(list) = self.children.get_mut(&parent) {
            list.retain(|i| i != id);
        }
        let removed = self.nodes.get(id).cloned()?;
        let mut evicted = Vec::new();
        self.evict_subtree(*id, &mut evicted);
        Some((removed, evicted))
    }

    /// Evicts the cached children of `id` and their subtrees, keeping `id`
    pub fn clear_children(&mut self, id: &CommentId) -> Vec<CommentId> {
        let mut evicted = Vec::new();
        for child in self.children.remove(&Some(*id)).unwrap_or_default() {
            self.evict_subtree(child, &mut evicted);
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.children.clear();
    }

    fn evict_subtree(&mut self, id: CommentId, evicted: &mut Vec<CommentId>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            self.nodes.remove(&id);
            evicted.push(id);
            if let Some(children) = self.children.remove(&Some(id)) {
                stack.extend(children);
            }
        }
    }
}
