//! Domain entities mirrored from persistent storage.

use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostStatRecord {
    pub id: i64,
    pub slug: String,
    pub view_count: u64,
    pub first_viewed_at: OffsetDateTime,
    pub last_viewed_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEntryRecord {
    pub id: i64,
    pub body: String,
    pub pinned: bool,
    pub created_at: OffsetDateTime,
}
