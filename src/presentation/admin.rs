//! Admin panel views. The admin frame is separate from the public chrome.

use askama::Template;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::application::{dashboard::DashboardOverview, live::LivePage};
use crate::domain::entities::PostStatRecord;
use crate::presentation::views::{LiveEntryCard, NavigationLinkView, PaginationView};

const VIEWED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub site_title: String,
    pub heading: String,
    pub navigation: Vec<NavigationLinkView>,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(site_title: &str, heading: &str, content: T) -> Self {
        let link = |label: &str, href: &str| NavigationLinkView {
            label: label.to_string(),
            href: href.to_string(),
        };
        Self {
            site_title: site_title.to_string(),
            heading: heading.to_string(),
            navigation: vec![
                link("Dashboard", "/admin"),
                link("Live", "/admin/live"),
                link("View site", "/"),
                link("Log out", "/admin/logout"),
            ],
            content,
        }
    }
}

pub struct AdminLoginView {
    pub site_title: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub view: AdminLoginView,
}

pub struct AdminStatRow {
    pub slug: String,
    pub view_count: u64,
    pub first_viewed: String,
    pub last_viewed: String,
}

impl From<PostStatRecord> for AdminStatRow {
    fn from(record: PostStatRecord) -> Self {
        Self {
            first_viewed: format_timestamp(record.first_viewed_at),
            last_viewed: format_timestamp(record.last_viewed_at),
            slug: record.slug,
            view_count: record.view_count,
        }
    }
}

pub struct AdminDashboardView {
    pub stats: Vec<AdminStatRow>,
    pub total_views: u64,
    pub recent_entries: Vec<LiveEntryCard>,
    pub total_entries: u64,
}

impl From<DashboardOverview> for AdminDashboardView {
    fn from(overview: DashboardOverview) -> Self {
        Self {
            stats: overview
                .post_stats
                .into_iter()
                .map(AdminStatRow::from)
                .collect(),
            total_views: overview.total_views,
            recent_entries: overview
                .recent_entries
                .into_iter()
                .map(LiveEntryCard::from)
                .collect(),
            total_entries: overview.total_entries,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: AdminLayout<AdminDashboardView>,
}

pub struct AdminLiveView {
    pub entries: Vec<LiveEntryCard>,
    pub total: u64,
    pub pagination: PaginationView,
}

impl From<LivePage> for AdminLiveView {
    fn from(page: LivePage) -> Self {
        let pagination = PaginationView::from_live(&page, "/admin/live");
        Self {
            total: page.total,
            entries: page.entries.into_iter().map(LiveEntryCard::from).collect(),
            pagination,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/live.html")]
pub struct AdminLiveTemplate {
    pub view: AdminLayout<AdminLiveView>,
}

fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(VIEWED_AT_FORMAT)
        .unwrap_or_else(|_| value.to_string())
}
