use async_trait::async_trait;

use crate::{
    Comment, CommentId, CommentPage, CommentUpdate, Error, LikeStatus, ListComments, NewComment,
    TargetType, Uuid,
};

/// The remote service holding the authoritative comment data.
///
/// Calls have no timeout and are never retried: a failed call is final for
/// that attempt.
#[async_trait]
pub trait CommentApi {
    async fn list_comments(&mut self, q: &ListComments) -> Result<CommentPage, Error>;
    async fn create_comment(&mut self, c: &NewComment) -> Result<Comment, Error>;
    async fn update_comment(
        &mut self,
        id: CommentId,
        u: &CommentUpdate,
    ) -> Result<Comment, Error>;
    async fn delete_comment(&mut self, id: CommentId) -> Result<(), Error>;
    async fn toggle_like(
        &mut self,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<LikeStatus, Error>;
}
