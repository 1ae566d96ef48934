use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
};

use async_trait::async_trait;
use chrono::Utc;
use threadlet_api::{
    Author, Comment, CommentApi, CommentId, CommentPage, CommentUpdate, Error, LikeStatus,
    ListComments, NewComment, OrderBy, Role, TargetId, TargetType, Time, UserId, Uuid, Viewer,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    ListComments,
    CreateComment,
    UpdateComment,
    DeleteComment,
    ToggleLike,
}

/// In-memory stand-in for the comment service.
///
/// Comments are stored without their viewer-dependent fields, which are
/// computed on every answer: `like_count` and `is_liked` from the like set,
/// `reply_count` from the stored direct replies. Deleting a comment deletes
/// only that comment.
pub struct MockServer {
    comments: BTreeMap<CommentId, Comment>,
    likes: HashSet<(UserId, CommentId)>,
    viewer: Option<Author>,
    clock: Time,
    failures: HashSet<Endpoint>,
    calls: HashMap<Endpoint, usize>,
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            comments: BTreeMap::new(),
            likes: HashSet::new(),
            viewer: None,
            clock: Utc::now(),
            failures: HashSet::new(),
            calls: HashMap::new(),
        }
    }

    pub fn user(name: &str, role: Role) -> Author {
        Author {
            id: UserId(Uuid::new_v4()),
            name: String::from(name),
            avatar: None,
            role,
        }
    }

    /// Makes all following calls on behalf of `a`
    pub fn login(&mut self, a: &Author) {
        self.viewer = Some(a.clone());
    }

    pub fn logout(&mut self) {
        self.viewer = None;
    }

    /// Makes the next call to `e` fail with a network error
    pub fn fail_next(&mut self, e: Endpoint) {
        self.failures.insert(e);
    }

    /// Number of calls made to `e` so far, failed ones included
    pub fn test_num_calls(&self, e: Endpoint) -> usize {
        self.calls.get(&e).copied().unwrap_or(0)
    }

    /// Number of comments stored for a target, at any depth
    pub fn test_num_comments(&self, target_id: TargetId) -> usize {
        self.comments
            .values()
            .filter(|c| c.target_id == target_id)
            .count()
    }

    pub fn test_contains(&self, id: &CommentId) -> bool {
        self.comments.contains_key(id)
    }

    /// Stores a comment written by `author`, bypassing authentication.
    /// Returns the stored comment as `author` would see it.
    ///
    /// Panics if `parent` is not stored.
    pub fn seed(
        &mut self,
        author: &Author,
        target_id: TargetId,
        parent: Option<CommentId>,
        content: &str,
    ) -> Comment {
        let depth = parent
            .map(|p| {
                self.comments
                    .get(&p)
                    .unwrap_or_else(|| panic!("seeding reply to unknown comment {p:?}"))
                    .depth
                    + 1
            })
            .unwrap_or(0);
        let now = self.tick();
        let c = Comment {
            id: CommentId(Uuid::new_v4()),
            target_type: TargetType::Post,
            target_id,
            parent_id: parent,
            depth,
            content: String::from(content),
            is_private: false,
            show_client_info: false,
            like_count: 0,
            is_liked: false,
            reply_count: 0,
            author: author.clone(),
            created_at: now,
            updated_at: now,
            location: None,
            browser: None,
            os: None,
        };
        self.comments.insert(c.id, c.clone());
        c
    }

    /// Registers a like from `user` on `id`, bypassing authentication
    pub fn seed_like(&mut self, user: &Author, id: CommentId) {
        self.likes.insert((user.id, id));
    }

    fn tick(&mut self) -> Time {
        self.clock = self.clock + chrono::Duration::seconds(1);
        self.clock
    }

    fn call(&mut self, e: Endpoint) -> Result<(), Error> {
        *self.calls.entry(e).or_insert(0) += 1;
        if self.failures.remove(&e) {
            return Err(Error::Network(format!("injected failure on {e:?}")));
        }
        Ok(())
    }

    fn resolve(&self) -> Result<&Author, Error> {
        self.viewer.as_ref().ok_or(Error::LoginRequired)
    }

    fn resolve_modifiable(&self, id: CommentId) -> Result<&Comment, Error> {
        let viewer = Viewer::from(self.resolve()?);
        let c = self.comments.get(&id).ok_or(Error::NotFound(id))?;
        if !viewer.can_modify(&c.author) {
            return Err(Error::PermissionDenied);
        }
        Ok(c)
    }

    fn like_count(&self, id: &CommentId) -> u64 {
        self.likes.iter().filter(|(_, c)| c == id).count() as u64
    }

    fn is_visible(&self, c: &Comment) -> bool {
        if !c.is_private {
            return true;
        }
        match &self.viewer {
            None => false,
            Some(v) => Viewer::from(v).can_modify(&c.author),
        }
    }

    /// `c` as seen by the current viewer
    fn view(&self, c: &Comment) -> Comment {
        let mut res = c.clone();
        res.like_count = self.like_count(&c.id);
        res.is_liked = self
            .viewer
            .as_ref()
            .map(|v| self.likes.contains(&(v.id, c.id)))
            .unwrap_or(false);
        res.reply_count = self
            .comments
            .values()
            .filter(|r| r.parent_id == Some(c.id))
            .count() as u64;
        res
    }
}

fn compare(by: OrderBy, a: &Comment, b: &Comment) -> Ordering {
    let primary = match by {
        OrderBy::CreatedAt => Ordering::Equal,
        OrderBy::LikeCount => a.like_count.cmp(&b.like_count),
        OrderBy::ReplyCount => a.reply_count.cmp(&b.reply_count),
    };
    primary
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl CommentApi for MockServer {
    async fn list_comments(&mut self, q: &ListComments) -> Result<CommentPage, Error> {
        self.call(Endpoint::ListComments)?;
        q.validate()?;
        let mut comments = self
            .comments
            .values()
            .filter(|c| {
                c.target_type == q.target_type
                    && c.target_id == q.target_id
                    && c.parent_id == q.parent_comment_id
                    && c.depth == q.depth
                    && self.is_visible(c)
            })
            .map(|c| self.view(c))
            .collect::<Vec<_>>();
        comments.sort_by(|a, b| match q.desc {
            true => compare(q.order_by, b, a),
            false => compare(q.order_by, a, b),
        });
        let skip = (q.page as usize - 1).saturating_mul(q.size as usize);
        Ok(CommentPage {
            comments: comments
                .into_iter()
                .skip(skip)
                .take(q.size as usize)
                .collect(),
        })
    }

    async fn create_comment(&mut self, new: &NewComment) -> Result<Comment, Error> {
        self.call(Endpoint::CreateComment)?;
        let author = self.resolve()?.clone();
        new.validate()?;
        let depth = match new.reply_id {
            None => 0,
            Some(p) => match self.comments.get(&p) {
                Some(parent) if parent.target_id == new.target_id => parent.depth + 1,
                _ => return Err(Error::NotFound(p)),
            },
        };
        let now = self.tick();
        let c = Comment {
            id: CommentId(Uuid::new_v4()),
            target_type: new.target_type,
            target_id: new.target_id,
            parent_id: new.reply_id,
            depth,
            content: new.content.clone(),
            is_private: new.is_private,
            show_client_info: new.show_client_info,
            like_count: 0,
            is_liked: false,
            reply_count: 0,
            author,
            created_at: now,
            updated_at: now,
            location: None,
            browser: None,
            os: None,
        };
        self.comments.insert(c.id, c.clone());
        tracing::debug!(id=?c.id, parent=?c.parent_id, "mock server created comment");
        Ok(self.view(&c))
    }

    async fn update_comment(
        &mut self,
        id: CommentId,
        u: &CommentUpdate,
    ) -> Result<Comment, Error> {
        self.call(Endpoint::UpdateComment)?;
        self.resolve_modifiable(id)?;
        u.validate()?;
        let now = self.tick();
        let c = self.comments.get_mut(&id).ok_or(Error::NotFound(id))?;
        c.content = u.content.clone();
        c.is_private = u.is_private;
        c.show_client_info = u.show_client_info;
        c.updated_at = now;
        let c = c.clone();
        Ok(self.view(&c))
    }

    async fn delete_comment(&mut self, id: CommentId) -> Result<(), Error> {
        self.call(Endpoint::DeleteComment)?;
        self.resolve_modifiable(id)?;
        self.comments.remove(&id);
        self.likes.retain(|(_, c)| *c != id);
        Ok(())
    }

    async fn toggle_like(
        &mut self,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<LikeStatus, Error> {
        self.call(Endpoint::ToggleLike)?;
        let user = self.resolve()?.id;
        if target_type != TargetType::Comment {
            return Err(Error::Unknown(format!(
                "likes on {} are not supported",
                target_type.as_str()
            )));
        }
        let id = CommentId(target_id);
        if !self.comments.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        let status = match self.likes.remove(&(user, id)) {
            true => false,
            false => {
                self.likes.insert((user, id));
                true
            }
        };
        Ok(LikeStatus { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn root_query(target_id: TargetId, order_by: OrderBy, page: u32, size: u32) -> ListComments {
        ListComments {
            target_type: TargetType::Post,
            target_id,
            depth: 0,
            parent_comment_id: None,
            order_by,
            desc: true,
            page,
            size,
        }
    }

    #[test]
    fn lists_pages_newest_first() {
        let mut s = MockServer::new();
        let ann = MockServer::user("ann", Role::User);
        let post = TargetId(Uuid::new_v4());
        for i in 0..5 {
            s.seed(&ann, post, None, &format!("c{i}"));
        }
        let p1 = block_on(s.list_comments(&root_query(post, OrderBy::CreatedAt, 1, 3))).unwrap();
        let p2 = block_on(s.list_comments(&root_query(post, OrderBy::CreatedAt, 2, 3))).unwrap();
        let contents = p1
            .comments
            .iter()
            .chain(p2.comments.iter())
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["c4", "c3", "c2", "c1", "c0"]);
    }

    #[test]
    fn computes_viewer_dependent_fields() {
        let mut s = MockServer::new();
        let ann = MockServer::user("ann", Role::User);
        let bob = MockServer::user("bob", Role::User);
        let post = TargetId(Uuid::new_v4());
        let a = s.seed(&ann, post, None, "a");
        let b = s.seed(&ann, post, None, "b");
        s.seed(&bob, post, Some(a.id), "reply");
        s.seed_like(&bob, a.id);
        s.seed_like(&ann, a.id);

        s.login(&bob);
        let page = block_on(s.list_comments(&root_query(post, OrderBy::LikeCount, 1, 10))).unwrap();
        assert_eq!(page.comments[0].id, a.id);
        assert_eq!(page.comments[0].like_count, 2);
        assert!(page.comments[0].is_liked);
        assert_eq!(page.comments[0].reply_count, 1);
        assert_eq!(page.comments[1].id, b.id);
        assert!(!page.comments[1].is_liked);
    }

    #[test]
    fn private_comments_are_hidden_from_others() {
        let mut s = MockServer::new();
        let ann = MockServer::user("ann", Role::User);
        let bob = MockServer::user("bob", Role::User);
        let admin = MockServer::user("root", Role::Admin);
        let post = TargetId(Uuid::new_v4());
        s.login(&ann);
        block_on(s.create_comment(&NewComment {
            target_type: TargetType::Post,
            target_id: post,
            content: String::from("secret"),
            reply_id: None,
            is_private: true,
            show_client_info: false,
        }))
        .unwrap();
        let q = root_query(post, OrderBy::CreatedAt, 1, 10);
        assert_eq!(block_on(s.list_comments(&q)).unwrap().comments.len(), 1);
        s.login(&bob);
        assert_eq!(block_on(s.list_comments(&q)).unwrap().comments.len(), 0);
        s.login(&admin);
        assert_eq!(block_on(s.list_comments(&q)).unwrap().comments.len(), 1);
    }

    #[test]
    fn only_authors_and_admins_modify() {
        let mut s = MockServer::new();
        let ann = MockServer::user("ann", Role::User);
        let bob = MockServer::user("bob", Role::User);
        let admin = MockServer::user("root", Role::Admin);
        let post = TargetId(Uuid::new_v4());
        let a = s.seed(&ann, post, None, "a");

        assert_eq!(block_on(s.delete_comment(a.id)), Err(Error::LoginRequired));
        s.login(&bob);
        assert_eq!(block_on(s.delete_comment(a.id)), Err(Error::PermissionDenied));
        s.login(&admin);
        assert_eq!(block_on(s.delete_comment(a.id)), Ok(()));
        assert!(!s.test_contains(&a.id));
    }

    #[test]
    fn delete_leaves_replies_stored() {
        let mut s = MockServer::new();
        let ann = MockServer::user("ann", Role::User);
        let post = TargetId(Uuid::new_v4());
        let a = s.seed(&ann, post, None, "a");
        let r = s.seed(&ann, post, Some(a.id), "r");
        s.login(&ann);
        block_on(s.delete_comment(a.id)).unwrap();
        assert!(s.test_contains(&r.id));
        assert_eq!(s.test_num_comments(post), 1);
    }

    #[test]
    fn toggle_like_reports_resulting_state() {
        let mut s = MockServer::new();
        let ann = MockServer::user("ann", Role::User);
        let post = TargetId(Uuid::new_v4());
        let a = s.seed(&ann, post, None, "a");
        s.login(&ann);
        let like = |s: &mut MockServer| block_on(s.toggle_like(TargetType::Comment, a.id.0));
        assert_eq!(like(&mut s), Ok(LikeStatus { status: true }));
        assert_eq!(like(&mut s), Ok(LikeStatus { status: false }));
        assert!(block_on(s.toggle_like(TargetType::Post, post.0)).is_err());
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut s = MockServer::new();
        let post = TargetId(Uuid::new_v4());
        let q = root_query(post, OrderBy::CreatedAt, 1, 10);
        s.fail_next(Endpoint::ListComments);
        assert!(matches!(block_on(s.list_comments(&q)), Err(Error::Network(_))));
        assert!(block_on(s.list_comments(&q)).is_ok());
        assert_eq!(s.test_num_calls(Endpoint::ListComments), 2);
    }
}
