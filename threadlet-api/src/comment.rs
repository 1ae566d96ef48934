use crate::{Author, Error, Time, Uuid, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// Identifies the entity a comment section is attached to (eg. a post)
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct TargetId(pub Uuid);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum TargetType {
    Post,
    Page,
    Comment,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Post => "Post",
            TargetType::Page => "Page",
            TargetType::Comment => "Comment",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub target_type: TargetType,
    pub target_id: TargetId,

    /// None for top-level comments
    pub parent_id: Option<CommentId>,

    /// 0 for top-level comments, parent's depth + 1 otherwise. Server-assigned.
    pub depth: u32,

    pub content: String,
    pub is_private: bool,
    pub show_client_info: bool,

    pub like_count: u64,

    /// Whether the viewer who fetched this record liked it
    pub is_liked: bool,

    /// Number of direct replies, not the whole subtree
    pub reply_count: u64,

    pub author: Author,
    pub created_at: Time,
    pub updated_at: Time,

    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub target_type: TargetType,
    pub target_id: TargetId,
    pub content: String,

    /// Comment being replied to, None for a top-level comment
    pub reply_id: Option<CommentId>,

    pub is_private: bool,
    pub show_client_info: bool,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdate {
    pub content: String,
    pub is_private: bool,
    pub show_client_info: bool,
}

impl CommentUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}
