use crate::api::{Order, TargetId, TargetType};

pub const DEFAULT_PAGE_SIZE: u32 = 8;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Static parameters of one comment section
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConfig {
    pub target_type: TargetType,
    pub target_id: TargetId,

    /// Number of comments per page, at every depth
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Order used when a level is opened for the first time
    #[serde(default)]
    pub default_order: Order,

    /// Number of comments in the section when it is opened, as known by
    /// whatever displays the commented entity
    #[serde(default)]
    pub total_thread_count: u64,
}

impl SectionConfig {
    pub fn new(target_type: TargetType, target_id: TargetId) -> SectionConfig {
        SectionConfig {
            target_type,
            target_id,
            page_size: DEFAULT_PAGE_SIZE,
            default_order: Order::default(),
            total_thread_count: 0,
        }
    }
}
