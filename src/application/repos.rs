//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{LiveEntryRecord, PostStatRecord};

/// Page size for `LiveEntriesRepo::list_entries` callers that do not pick one.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait PostStatsRepo: Send + Sync {
    /// Record one view of `slug`, creating the counter on first sight.
    /// Returns the row as it is after the update.
    async fn increment_view(&self, slug: &str) -> Result<PostStatRecord, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostStatRecord>, RepoError>;

    /// All counters, most viewed first; ties by slug.
    async fn list_all(&self) -> Result<Vec<PostStatRecord>, RepoError>;
}

#[async_trait]
pub trait LiveEntriesRepo: Send + Sync {
    async fn create_entry(&self, body: &str, pinned: bool) -> Result<LiveEntryRecord, RepoError>;

    /// Pinned entries first, then newest first.
    async fn list_entries(&self, limit: u32, offset: u64)
    -> Result<Vec<LiveEntryRecord>, RepoError>;

    async fn count_entries(&self) -> Result<u64, RepoError>;

    /// Returns `false` when no entry has this id.
    async fn delete_entry(&self, id: i64) -> Result<bool, RepoError>;

    /// Flip the pinned flag. `None` when no entry has this id.
    async fn toggle_pin(&self, id: i64) -> Result<Option<LiveEntryRecord>, RepoError>;
}
