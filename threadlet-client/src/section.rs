use std::collections::HashMap;

use crate::{
    api::{
        Comment, CommentApi, CommentId, CommentPage, CommentUpdate, Error, LikeStatus, NewComment,
        Order, TargetType, Viewer,
    },
    ActiveInput, CommentPatch, CommentTree, InputArbiter, InputMode, LikeController, LikeTicket,
    PageCursor, PageOutcome, PageRequest, SectionConfig, ThreadCounts,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionState {
    /// The first page of top-level comments has not arrived yet
    Loading,
    Ready,
}

fn report(what: &'static str) -> impl FnOnce(Error) -> Error {
    move |err| {
        tracing::warn!(%err, "failed to {what}");
        err
    }
}

/// A comment section: the lazily loaded comment tree of one commented entity
/// together with everything needed to browse and mutate it.
///
/// Fetches and like toggles are split in a synchronous `begin_*` step, the
/// remote call, and a synchronous `finish_*` step, so that a host driving an
/// event loop can keep several of them in flight. The `async` methods chain
/// the three steps for hosts that do not need this.
///
/// Creations, edits and deletions only touch local state once the server
/// confirmed them.
pub struct CommentSection {
    config: SectionConfig,
    viewer: Option<Viewer>,
    state: SectionState,
    tree: CommentTree,
    cursors: HashMap<Option<CommentId>, PageCursor>,
    likes: LikeController,
    input: InputArbiter,
    counts: ThreadCounts,

    /// Generation of the next cursor opened, shared by all levels
    next_generation: u64,
}

impl CommentSection {
    pub fn new(config: SectionConfig, viewer: Option<Viewer>) -> CommentSection {
        let counts = ThreadCounts::new(config.total_thread_count);
        CommentSection {
            config,
            viewer,
            state: SectionState::Loading,
            tree: CommentTree::new(),
            cursors: HashMap::new(),
            likes: LikeController::new(),
            input: InputArbiter::new(),
            counts,
            next_generation: 0,
        }
    }

    pub fn config(&self) -> &SectionConfig {
        &self.config
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.tree.get(id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Comment> {
        self.tree.children(None)
    }

    pub fn replies(&self, id: &CommentId) -> impl Iterator<Item = &Comment> {
        self.tree.children(Some(*id))
    }

    pub fn total_thread_count(&self) -> u64 {
        self.counts.total()
    }

    pub fn cursor(&self, parent: Option<CommentId>) -> Option<&PageCursor> {
        self.cursors.get(&parent)
    }

    /// Whether "load more" should be enabled for the level under `parent`.
    /// A level never opened can always load.
    pub fn can_load_more(&self, parent: Option<CommentId>) -> bool {
        self.cursors
            .get(&parent)
            .map(|c| c.can_load_more())
            .unwrap_or(true)
    }

    /// Whether at least one page of replies to `id` was loaded
    pub fn is_expanded(&self, id: &CommentId) -> bool {
        self.cursors
            .get(&Some(*id))
            .map(|c| c.page() > 0)
            .unwrap_or(false)
    }

    pub fn is_like_pending(&self, id: &CommentId) -> bool {
        self.likes.is_pending(id)
    }

    pub fn active_input(&self) -> Option<ActiveInput> {
        self.input.active()
    }

    pub fn is_input_open(&self, id: &CommentId, mode: InputMode) -> bool {
        self.input.is_open_for(id, mode)
    }

    /// Whether the viewer may edit or delete `c`
    pub fn can_modify(&self, c: &Comment) -> bool {
        self.viewer
            .map(|v| v.can_modify(&c.author))
            .unwrap_or(false)
    }

    fn check_can_modify(&self, id: CommentId) -> Result<(), Error> {
        let viewer = self.viewer.ok_or(Error::LoginRequired)?;
        let c = self.tree.get(&id).ok_or(Error::NotFound(id))?;
        if !viewer.can_modify(&c.author) {
            return Err(Error::PermissionDenied);
        }
        Ok(())
    }

    /// Clears everything attached to nodes that just left the cache
    fn forget(&mut self, evicted: &[CommentId]) {
        for id in evicted {
            self.cursors.remove(&Some(*id));
            self.likes.forget(id);
        }
        self.input.close_for_any(evicted);
    }

    fn new_cursor(&mut self, parent: Option<CommentId>, order: Order) -> Option<PageCursor> {
        let depth = match parent {
            None => 0,
            Some(p) => self.tree.get(&p)?.depth + 1,
        };
        let generation = self.next_generation;
        self.next_generation += 1;
        Some(PageCursor::new(
            self.config.target_type,
            self.config.target_id,
            parent,
            depth,
            order,
            self.config.page_size,
            generation,
        ))
    }

    // Loading

    /// Starts fetching the next page of the level under `parent` (None for the
    /// top-level comments), opening the level with the default order if
    /// needed.
    ///
    /// Returns None if there is nothing to fetch: the level is exhausted,
    /// already loading, or its parent is not cached.
    pub fn begin_load(&mut self, parent: Option<CommentId>) -> Option<PageRequest> {
        if !self.cursors.contains_key(&parent) {
            let cursor = self.new_cursor(parent, self.config.default_order)?;
            self.cursors.insert(parent, cursor);
        }
        self.cursors.get_mut(&parent)?.next_request()
    }

    /// Starts over the level under `parent` with `order`, and returns the
    /// request for its first page. Other levels keep their own order.
    ///
    /// The currently cached comments of the level stay displayed until the
    /// first page arrives.
    pub fn begin_set_order(
        &mut self,
        parent: Option<CommentId>,
        order: Order,
    ) -> Option<PageRequest> {
        if !self.cursors.contains_key(&parent) {
            let cursor = self.new_cursor(parent, order)?;
            self.cursors.insert(parent, cursor);
        }
        self.cursors.get_mut(&parent)?.reset(order);
        self.begin_load(parent)
    }

    /// Merges the answer to `req` into the tree.
    ///
    /// A first page replaces the whole level, later pages are appended.
    /// Answers to superseded requests are dropped. Returns the number of
    /// comments now cached for the level.
    pub fn finish_load(
        &mut self,
        req: PageRequest,
        res: Result<CommentPage, Error>,
    ) -> Result<usize, Error> {
        let parent = req.parent();
        let cursor = match self.cursors.get_mut(&parent) {
            Some(c) => c,
            None => {
                tracing::debug!(?parent, "dropping page for a level that was closed");
                return Ok(0);
            }
        };
        let page = match res {
            Ok(page) => page,
            Err(err) => {
                cursor.fail(&req);
                return Err(report("load comments")(err));
            }
        };
        match cursor.complete(&req, page.comments.len()) {
            PageOutcome::Stale => return Ok(self.tree.child_ids(parent).len()),
            PageOutcome::Applied { page: 1, .. } => {
                let evicted = self.tree.replace_children(parent, page.comments);
                self.forget(&evicted);
            }
            PageOutcome::Applied { .. } => {
                self.tree.attach_page(parent, page.comments);
            }
        }
        if parent.is_none() {
            self.state = SectionState::Ready;
        }
        Ok(self.tree.child_ids(parent).len())
    }

    pub async fn load_more<A>(
        &mut self,
        api: &mut A,
        parent: Option<CommentId>,
    ) -> Result<usize, Error>
    where
        A: CommentApi + ?Sized,
    {
        let req = match self.begin_load(parent) {
            Some(req) => req,
            None => return Ok(self.tree.child_ids(parent).len()),
        };
        let res = api.list_comments(&req.query).await;
        self.finish_load(req, res)
    }

    /// Loads the first page of top-level comments
    pub async fn load<A>(&mut self, api: &mut A) -> Result<usize, Error>
    where
        A: CommentApi + ?Sized,
    {
        self.load_more(api, None).await
    }

    /// Loads the first page of replies to `id`, unless already done
    pub async fn expand<A>(&mut self, api: &mut A, id: CommentId) -> Result<usize, Error>
    where
        A: CommentApi + ?Sized,
    {
        if self.is_expanded(&id) {
            return Ok(self.tree.child_ids(Some(id)).len());
        }
        self.load_more(api, Some(id)).await
    }

    /// Forgets the cached replies to `id`, so that the next `expand` starts
    /// again from the first page
    pub fn collapse(&mut self, id: &CommentId) {
        let evicted = self.tree.clear_children(id);
        self.cursors.remove(&Some(*id));
        self.forget(&evicted);
    }

    pub async fn set_order<A>(
        &mut self,
        api: &mut A,
        parent: Option<CommentId>,
        order: Order,
    ) -> Result<usize, Error>
    where
        A: CommentApi + ?Sized,
    {
        let req = match self.begin_set_order(parent, order) {
            Some(req) => req,
            None => return Ok(self.tree.child_ids(parent).len()),
        };
        let res = api.list_comments(&req.query).await;
        self.finish_load(req, res)
    }

    // Inputs

    pub fn open_reply(&mut self, id: CommentId) -> Result<(), Error> {
        if !self.tree.contains(&id) {
            return Err(Error::NotFound(id));
        }
        self.input.open(id, InputMode::Reply);
        Ok(())
    }

    pub fn open_edit(&mut self, id: CommentId) -> Result<(), Error> {
        self.check_can_modify(id)?;
        self.input.open(id, InputMode::Edit);
        Ok(())
    }

    pub fn close_input(&mut self) {
        self.input.close();
    }

    // Mutations

    /// Builds the creation request for a comment under `parent`, or a
    /// top-level comment if `parent` is None
    pub fn new_comment(
        &self,
        parent: Option<CommentId>,
        draft: CommentUpdate,
    ) -> Result<NewComment, Error> {
        if self.viewer.is_none() {
            return Err(Error::LoginRequired);
        }
        if let Some(p) = parent {
            if !self.tree.contains(&p) {
                return Err(Error::NotFound(p));
            }
        }
        let c = NewComment {
            target_type: self.config.target_type,
            target_id: self.config.target_id,
            content: draft.content,
            reply_id: parent,
            is_private: draft.is_private,
            show_client_info: draft.show_client_info,
        };
        c.validate()?;
        Ok(c)
    }

    /// Records a comment the server just created. Returns its id.
    pub fn apply_created(&mut self, c: Comment) -> CommentId {
        let id = c.id;
        let parent = c.parent_id;
        if !self.tree.insert_local(c) {
            tracing::debug!(?id, ?parent, "created comment's parent is not cached");
        }
        self.counts.on_created(&mut self.tree, parent);
        if let Some(p) = parent {
            self.input.close_if(&p, InputMode::Reply);
        }
        id
    }

    pub async fn submit<A>(
        &mut self,
        api: &mut A,
        parent: Option<CommentId>,
        draft: CommentUpdate,
    ) -> Result<CommentId, Error>
    where
        A: CommentApi + ?Sized,
    {
        let new = self.new_comment(parent, draft)?;
        let created = api
            .create_comment(&new)
            .await
            .map_err(report("create comment"))?;
        Ok(self.apply_created(created))
    }

    /// Records an edit the server just confirmed. Returns false if the
    /// comment is no longer cached.
    pub fn apply_edited(&mut self, c: &Comment) -> bool {
        self.input.close_if(&c.id, InputMode::Edit);
        self.tree.patch(&c.id, &CommentPatch::edited(c))
    }

    pub async fn edit<A>(
        &mut self,
        api: &mut A,
        id: CommentId,
        update: CommentUpdate,
    ) -> Result<(), Error>
    where
        A: CommentApi + ?Sized,
    {
        self.check_can_modify(id)?;
        update.validate()?;
        let edited = api
            .update_comment(id, &update)
            .await
            .map_err(report("edit comment"))?;
        self.apply_edited(&edited);
        Ok(())
    }

    /// Records a deletion the server just confirmed: the comment and its
    /// cached replies are evicted, and only its parent's counters change.
    /// The section total drops by one even if the comment was no longer
    /// cached. Returns false in that case.
    pub fn apply_deleted(&mut self, id: CommentId) -> bool {
        match self.tree.remove(&id) {
            None => {
                tracing::debug!(?id, "deleted comment is not cached");
                self.counts.on_deleted(&mut self.tree, None);
                false
            }
            Some((c, evicted)) => {
                self.counts.on_deleted(&mut self.tree, c.parent_id);
                self.forget(&evicted);
                true
            }
        }
    }

    pub async fn delete<A>(&mut self, api: &mut A, id: CommentId) -> Result<(), Error>
    where
        A: CommentApi + ?Sized,
    {
        self.check_can_modify(id)?;
        api.delete_comment(id)
            .await
            .map_err(report("delete comment"))?;
        self.apply_deleted(id);
        Ok(())
    }

    // Likes

    /// Optimistically toggles the like state of `id`. Returns None if a toggle
    /// is already pending for it or if it is not cached.
    pub fn begin_toggle_like(&mut self, id: CommentId) -> Result<Option<LikeTicket>, Error> {
        if self.viewer.is_none() {
            return Err(Error::LoginRequired);
        }
        Ok(self.likes.begin(&mut self.tree, id))
    }

    pub fn finish_toggle_like(
        &mut self,
        ticket: LikeTicket,
        res: Result<LikeStatus, Error>,
    ) -> Result<(), Error> {
        match res {
            Ok(status) => {
                self.likes.succeed(&ticket, status);
                Ok(())
            }
            Err(err) => {
                self.likes.fail(&mut self.tree, &ticket);
                Err(report("toggle like")(err))
            }
        }
    }

    /// Returns whether a toggle was actually sent
    pub async fn toggle_like<A>(&mut self, api: &mut A, id: CommentId) -> Result<bool, Error>
    where
        A: CommentApi + ?Sized,
    {
        let ticket = match self.begin_toggle_like(id)? {
            Some(t) => t,
            None => return Ok(false),
        };
        let res = api.toggle_like(TargetType::Comment, id.0).await;
        self.finish_toggle_like(ticket, res)?;
        Ok(true)
    }
}
