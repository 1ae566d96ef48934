use crate::STUB_UUID;

use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Role {
    Admin,
    User,
}

/// Snapshot of a comment's author, as of fetch time
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

/// The logged-in user looking at a comment section
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Viewer {
    pub id: UserId,
    pub role: Role,
}

impl Viewer {
    /// Authors can edit and delete their own comments, admins any comment
    pub fn can_modify(&self, author: &Author) -> bool {
        self.role == Role::Admin || self.id == author.id
    }
}

impl From<&Author> for Viewer {
    fn from(a: &Author) -> Viewer {
        Viewer {
            id: a.id,
            role: a.role,
        }
    }
}
