use crate::{Comment, CommentId, Error, TargetId, TargetType};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum OrderBy {
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "likeCount")]
    LikeCount,
    #[serde(rename = "replyCount")]
    ReplyCount,
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::CreatedAt => "createdAt",
            OrderBy::LikeCount => "likeCount",
            OrderBy::ReplyCount => "replyCount",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Order {
    pub by: OrderBy,
    pub desc: bool,
}

impl Order {
    pub fn newest_first() -> Order {
        Order {
            by: OrderBy::CreatedAt,
            desc: true,
        }
    }
}

impl Default for Order {
    fn default() -> Order {
        Order::newest_first()
    }
}

/// Selects one page of one level of a comment tree.
///
/// `depth = 0, parent_comment_id = None` lists the top-level comments,
/// `depth = k, parent_comment_id = Some(p)` lists the direct replies to `p`,
/// whose own depth is `k - 1`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListComments {
    pub target_type: TargetType,
    pub target_id: TargetId,
    pub depth: u32,
    pub parent_comment_id: Option<CommentId>,
    pub order_by: OrderBy,
    pub desc: bool,

    /// 1-based
    pub page: u32,
    pub size: u32,
}

impl ListComments {
    pub fn validate(&self) -> Result<(), Error> {
        if self.page == 0 || self.size == 0 {
            return Err(Error::Unknown(String::from(
                "page and size must both be at least 1",
            )));
        }
        if (self.depth == 0) != self.parent_comment_id.is_none() {
            return Err(Error::Unknown(String::from(
                "depth 0 must be listed without a parent and only depth 0",
            )));
        }
        Ok(())
    }

    pub fn order(&self) -> Order {
        Order {
            by: self.order_by,
            desc: self.desc,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
}

/// Answer to a like toggle: the resulting liked state, not a delta
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LikeStatus {
    pub status: bool,
}
