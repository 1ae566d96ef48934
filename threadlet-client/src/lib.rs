mod config;
pub use config::{SectionConfig, DEFAULT_PAGE_SIZE};

mod counts;
pub use counts::ThreadCounts;

mod cursor;
pub use cursor::{PageCursor, PageOutcome, PageRequest, PageTicket};

mod input;
pub use input::{ActiveInput, InputArbiter, InputMode};

mod like;
pub use like::{LikeController, LikeTicket};

mod section;
pub use section::{CommentSection, SectionState};

mod tree;
pub use tree::{CommentPatch, CommentTree};

pub mod api {
    pub use threadlet_api::*;
}
