use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Maximum number of characters in a comment body
pub const MAX_CONTENT_LEN: usize = 2000;

mod comment;
pub use comment::{Comment, CommentId, CommentUpdate, NewComment, TargetId, TargetType};

mod error;
pub use error::Error;

mod query;
pub use query::{CommentPage, LikeStatus, ListComments, Order, OrderBy};

mod service;
pub use service::CommentApi;

mod user;
pub use user::{Author, Role, UserId, Viewer};

// `validate` functions make sure the data can be handled by the server.
// They never look at whether the current user is allowed to do the action.

pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

pub fn validate_content(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    let len = s.chars().count();
    if len > MAX_CONTENT_LEN {
        return Err(Error::ContentTooLong(len));
    }
    Ok(())
}
