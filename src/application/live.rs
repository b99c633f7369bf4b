//! Live feed: short markdown entries stored in the database.

use std::sync::Arc;

use thiserror::Error;
use time::{format_description::BorrowedFormatItem, macros::format_description};
use tracing::info;

use crate::{
    application::{
        render::MarkdownRenderer,
        repos::{LiveEntriesRepo, RepoError},
    },
    domain::{entities::LiveEntryRecord, error::DomainError},
};

pub const LIVE_PAGE_SIZE: u32 = 20;

const CREATED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("live entry {0} not found")]
    NotFound(i64),
}

/// An entry ready for display.
#[derive(Debug, Clone)]
pub struct LiveEntryView {
    pub id: i64,
    pub body_html: String,
    pub pinned: bool,
    pub created_label: String,
}

#[derive(Debug, Clone)]
pub struct LivePage {
    pub entries: Vec<LiveEntryView>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

impl LivePage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn previous_page(&self) -> u32 {
        self.page.saturating_sub(1).max(1)
    }

    pub fn next_page(&self) -> u32 {
        self.page.saturating_add(1)
    }
}

#[derive(Clone)]
pub struct LiveFeedService {
    repo: Arc<dyn LiveEntriesRepo>,
    renderer: Arc<MarkdownRenderer>,
}

impl LiveFeedService {
    pub fn new(repo: Arc<dyn LiveEntriesRepo>, renderer: Arc<MarkdownRenderer>) -> Self {
        Self { repo, renderer }
    }

    pub fn render_body(&self, body: &str) -> String {
        self.renderer.render(body)
    }

    /// One page of the feed; pages below 1 are treated as page 1.
    pub async fn page(&self, page: i64) -> Result<LivePage, RepoError> {
        let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
        let offset = u64::from(page - 1) * u64::from(LIVE_PAGE_SIZE);

        let records = self.repo.list_entries(LIVE_PAGE_SIZE, offset).await?;
        let total = self.repo.count_entries().await?;

        Ok(LivePage {
            entries: records.into_iter().map(|record| self.view(record)).collect(),
            page,
            total_pages: total_pages(total, LIVE_PAGE_SIZE),
            total,
        })
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<LiveEntryView>, RepoError> {
        let records = self.repo.list_entries(limit, 0).await?;
        Ok(records.into_iter().map(|record| self.view(record)).collect())
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        self.repo.count_entries().await
    }

    pub async fn create(&self, body: &str, pinned: bool) -> Result<LiveEntryRecord, LiveError> {
        if body.trim().is_empty() {
            return Err(DomainError::validation("live entry body must not be empty").into());
        }

        let entry = self.repo.create_entry(body, pinned).await?;
        info!(
            target: "driftlog::live",
            entry_id = entry.id,
            pinned = entry.pinned,
            "Live entry created"
        );
        Ok(entry)
    }

    pub async fn delete(&self, id: i64) -> Result<(), LiveError> {
        if !self.repo.delete_entry(id).await? {
            return Err(LiveError::NotFound(id));
        }
        info!(target: "driftlog::live", entry_id = id, "Live entry deleted");
        Ok(())
    }

    pub async fn toggle_pin(&self, id: i64) -> Result<LiveEntryRecord, LiveError> {
        let entry = self
            .repo
            .toggle_pin(id)
            .await?
            .ok_or(LiveError::NotFound(id))?;
        info!(
            target: "driftlog::live",
            entry_id = id,
            pinned = entry.pinned,
            "Live entry pin toggled"
        );
        Ok(entry)
    }

    fn view(&self, record: LiveEntryRecord) -> LiveEntryView {
        let created_label = record
            .created_at
            .format(CREATED_AT_FORMAT)
            .unwrap_or_else(|_| record.created_at.to_string());
        LiveEntryView {
            id: record.id,
            body_html: self.render_body(&record.body),
            pinned: record.pinned,
            created_label,
        }
    }
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
