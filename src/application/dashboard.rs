//! Admin dashboard aggregates.

use std::sync::Arc;

use crate::{
    application::{
        live::{LiveEntryView, LiveFeedService},
        repos::{PostStatsRepo, RepoError},
    },
    domain::entities::PostStatRecord,
};

const RECENT_ENTRIES: u32 = 5;

#[derive(Debug, Clone)]
pub struct DashboardOverview {
    pub post_stats: Vec<PostStatRecord>,
    pub total_views: u64,
    pub recent_entries: Vec<LiveEntryView>,
    pub total_entries: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    stats: Arc<dyn PostStatsRepo>,
    live: LiveFeedService,
}

impl DashboardService {
    pub fn new(stats: Arc<dyn PostStatsRepo>, live: LiveFeedService) -> Self {
        Self { stats, live }
    }

    pub async fn overview(&self) -> Result<DashboardOverview, RepoError> {
        let post_stats = self.stats.list_all().await?;
        let total_views = post_stats.iter().map(|stat| stat.view_count).sum();
        let recent_entries = self.live.recent(RECENT_ENTRIES).await?;
        let total_entries = self.live.count().await?;

        Ok(DashboardOverview {
            post_stats,
            total_views,
            recent_entries,
            total_entries,
        })
    }
}
