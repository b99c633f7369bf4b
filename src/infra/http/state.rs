use std::sync::Arc;

use axum_extra::extract::CookieJar;

use crate::{
    application::{
        blog::BlogService,
        content::ContentService,
        dashboard::DashboardService,
        live::LiveFeedService,
        page::PageService,
        render::MarkdownRenderer,
        repos::{LiveEntriesRepo, PostStatsRepo},
        session::{AdminAuth, SESSION_COOKIE},
        syndication::SyndicationService,
    },
    config::{AppEnvironment, Settings},
    infra::{db::SqliteRepositories, files::FileRoot},
    presentation::views::LayoutChrome,
};

use super::middleware::TrustedHosts;

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub content: Arc<ContentService>,
    pub pages: Arc<PageService>,
    pub syndication: Arc<SyndicationService>,
    pub live: Arc<LiveFeedService>,
    pub dashboard: Arc<DashboardService>,
    pub auth: AdminAuth,
    pub chrome: Arc<LayoutChrome>,
    pub site_title: Arc<str>,
    pub images: Arc<FileRoot>,
    pub assets: Arc<FileRoot>,
    pub db: Arc<SqliteRepositories>,
    pub trusted_hosts: Arc<TrustedHosts>,
    pub secure_cookies: bool,
}

impl HttpState {
    /// Wire every service from settings. The renderer is shared by posts, pages and the live feed.
    pub fn new(settings: &Settings, db: SqliteRepositories, auth: AdminAuth) -> Self {
        let db = Arc::new(db);
        let stats: Arc<dyn PostStatsRepo> = db.clone();
        let live_repo: Arc<dyn LiveEntriesRepo> = db.clone();

        let renderer = Arc::new(MarkdownRenderer::new());
        let site = Arc::new(settings.site.clone());
        let content = Arc::new(ContentService::new(
            &settings.content.posts_dir,
            Arc::clone(&renderer),
            settings.content.cache_ttl,
        ));
        let live = LiveFeedService::new(live_repo, Arc::clone(&renderer));

        Self {
            blog: Arc::new(BlogService::new(Arc::clone(&content), Arc::clone(&stats))),
            pages: Arc::new(PageService::new(&settings.content.pages_dir, renderer)),
            syndication: Arc::new(SyndicationService::new(Arc::clone(&content), Arc::clone(&site))),
            dashboard: Arc::new(DashboardService::new(stats, live.clone())),
            live: Arc::new(live),
            content,
            auth,
            chrome: Arc::new(LayoutChrome::from_site(&site)),
            site_title: Arc::from(site.title.as_str()),
            images: Arc::new(FileRoot::new(&settings.content.images_dir)),
            assets: Arc::new(FileRoot::new(&settings.content.static_dir)),
            db,
            trusted_hosts: Arc::new(TrustedHosts::new(&settings.server.trusted_hosts)),
            secure_cookies: settings.environment == AppEnvironment::Production,
        }
    }

    /// Whether the request carries a valid admin session cookie.
    pub fn has_session(&self, jar: &CookieJar) -> bool {
        jar.get(SESSION_COOKIE)
            .is_some_and(|cookie| self.auth.verify_session(cookie.value()))
    }

    pub fn chrome(&self) -> LayoutChrome {
        self.chrome.as_ref().clone()
    }
}
