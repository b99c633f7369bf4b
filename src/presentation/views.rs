use crate::application::{
    blog::{PostDetail, PostIndex},
    error::{ErrorReport, HttpError},
    live::{LiveEntryView, LivePage},
};
use crate::config::SiteSettings;
use crate::domain::posts::{Page, Post};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use url::form_urlencoded;

const POST_DATE_LABEL: &str = "%B %-d, %Y";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let mut response = render_error_response(chrome, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Themed error page for `status`. Carries no [`ErrorReport`]; callers attach their own.
pub fn render_error_response(chrome: LayoutChrome, status: StatusCode) -> Response {
    let content = ErrorPageView::for_status(status);
    let view = LayoutContext::new(chrome, content);
    render_template_response(ErrorTemplate { view }, status)
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
}

/// Site-wide frame shared by every public page.
#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn from_site(site: &SiteSettings) -> Self {
        let link = |label: &str, href: &str| NavigationLinkView {
            label: label.to_string(),
            href: href.to_string(),
        };

        Self {
            brand: BrandView {
                title: site.title.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView {
                entries: vec![
                    link("Home", "/"),
                    link("Live", "/live"),
                    link("About", "/about"),
                    link("RSS", "/feed.xml"),
                ],
            },
            footer: FooterView {
                copy: format!("© {}", site.author),
            },
            meta: PageMetaView {
                title: site.title.clone(),
                description: site.description.clone(),
            },
        }
    }

    /// Prefix the document title with `title`, keeping the site name.
    pub fn with_title(self, title: &str) -> Self {
        let meta = PageMetaView {
            title: format!("{title} | {}", self.meta.title),
            ..self.meta
        };
        Self { meta, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct TagBadge {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

impl TagBadge {
    fn new(tag: &str, active: Option<&str>) -> Self {
        let encoded: String = form_urlencoded::byte_serialize(tag.as_bytes()).collect();
        Self {
            label: tag.to_string(),
            href: format!("/?tag={encoded}"),
            is_active: active == Some(tag),
        }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub iso_date: String,
    pub published: String,
    pub badges: Vec<TagBadge>,
}

impl PostCard {
    fn from_post(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            summary: post.summary.clone(),
            iso_date: post.date.format("%Y-%m-%d").to_string(),
            published: post.date.format(POST_DATE_LABEL).to_string(),
            badges: post.tags.iter().map(|tag| TagBadge::new(tag, None)).collect(),
        }
    }
}

pub struct IndexView {
    pub posts: Vec<PostCard>,
    pub tags: Vec<TagBadge>,
    pub active_tag: Option<String>,
    pub has_results: bool,
}

impl From<PostIndex> for IndexView {
    fn from(index: PostIndex) -> Self {
        let active = index.active_tag.as_deref();
        Self {
            has_results: !index.posts.is_empty(),
            posts: index.posts.iter().map(|post| PostCard::from_post(post)).collect(),
            tags: index.tags.iter().map(|tag| TagBadge::new(tag, active)).collect(),
            active_tag: index.active_tag,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexView>,
}

pub struct PostDetailView {
    pub title: String,
    pub published: String,
    pub iso_date: String,
    pub badges: Vec<TagBadge>,
    pub content_html: String,
    pub view_count: u64,
}

impl From<PostDetail> for PostDetailView {
    fn from(detail: PostDetail) -> Self {
        let card = PostCard::from_post(&detail.post);
        Self {
            title: card.title,
            published: card.published,
            iso_date: card.iso_date,
            badges: card.badges,
            content_html: detail.post.content_html.clone(),
            view_count: detail.view_count,
        }
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailView>,
}

pub struct PageView {
    pub title: String,
    pub content_html: String,
}

impl From<Page> for PageView {
    fn from(page: Page) -> Self {
        Self {
            title: page.title,
            content_html: page.content_html,
        }
    }
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: LayoutContext<PageView>,
}

#[derive(Clone)]
pub struct LiveEntryCard {
    pub id: i64,
    pub body_html: String,
    pub pinned: bool,
    pub created_label: String,
}

impl From<LiveEntryView> for LiveEntryCard {
    fn from(entry: LiveEntryView) -> Self {
        Self {
            id: entry.id,
            body_html: entry.body_html,
            pinned: entry.pinned,
            created_label: entry.created_label,
        }
    }
}

/// Previous/next links for a paginated listing rooted at `base`.
pub struct PaginationView {
    pub page: u32,
    pub total_pages: u32,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl PaginationView {
    pub(crate) fn from_live(page: &LivePage, base: &str) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages.max(1),
            previous_href: page
                .has_previous()
                .then(|| format!("{base}?page={}", page.previous_page())),
            next_href: page
                .has_next()
                .then(|| format!("{base}?page={}", page.next_page())),
        }
    }
}

pub struct LiveView {
    pub entries: Vec<LiveEntryCard>,
    pub total: u64,
    pub pagination: PaginationView,
    pub can_manage: bool,
}

impl LiveView {
    pub fn new(page: LivePage, can_manage: bool) -> Self {
        let pagination = PaginationView::from_live(&page, "/live");
        Self {
            total: page.total,
            entries: page.entries.into_iter().map(LiveEntryCard::from).collect(),
            pagination,
            can_manage,
        }
    }
}

#[derive(Template)]
#[template(path = "live.html")]
pub struct LiveTemplate {
    pub view: LayoutContext<LiveView>,
}

pub struct ErrorPageView {
    pub code: u16,
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn for_status(status: StatusCode) -> Self {
        let (title, message) = match status {
            StatusCode::NOT_FOUND => ("Not Found", "This page doesn't exist or was moved."),
            StatusCode::FORBIDDEN => ("Forbidden", "You don't have access to this resource."),
            StatusCode::INTERNAL_SERVER_ERROR => {
                ("Internal Server Error", "Something went wrong on our end.")
            }
            other => ("Error", other.canonical_reason().unwrap_or("Unexpected error")),
        };
        Self {
            code: status.as_u16(),
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;

    fn chrome() -> LayoutChrome {
        LayoutChrome::from_site(&SiteSettings {
            title: "MyBlog".to_string(),
            url: "https://blog.example.com".to_string(),
            description: "Notes".to_string(),
            author: "Jo".to_string(),
        })
    }

    fn post(slug: &str, tags: &[&str]) -> Arc<Post> {
        Arc::new(Post {
            title: format!("Title {slug}"),
            date: NaiveDate::from_ymd_opt(2026, 1, 2).expect("date"),
            slug: slug.to_string(),
            summary: "<b>summary</b>".to_string(),
            content_html: "<h2>Hello</h2>".to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        })
    }

    #[test]
    fn error_page_messages() {
        let not_found = ErrorPageView::for_status(StatusCode::NOT_FOUND);
        assert_eq!(not_found.code, 404);
        assert_eq!(not_found.title, "Not Found");

        let teapot = ErrorPageView::for_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(teapot.title, "Error");
        assert_eq!(teapot.message, "I'm a teapot");
    }

    #[test]
    fn index_marks_active_tag_and_escapes_summaries() {
        let index = PostIndex {
            posts: vec![post("a", &["rust", "web"])],
            tags: ["rust".to_string(), "web".to_string()].into_iter().collect(),
            active_tag: Some("web".to_string()),
        };
        let view = IndexView::from(index);
        assert!(view.tags.iter().any(|tag| tag.label == "web" && tag.is_active));
        assert!(view.tags.iter().any(|tag| tag.label == "rust" && !tag.is_active));

        let html = IndexTemplate {
            view: LayoutContext::new(chrome(), view),
        }
        .render()
        .expect("render");
        assert!(html.contains("MyBlog"));
        assert!(html.contains(r#"href="/post/a""#));
        assert!(html.contains("&lt;b&gt;summary&lt;/b&gt;"));
        assert!(html.contains("January 2, 2026"));
    }

    #[test]
    fn post_page_embeds_rendered_html_and_views() {
        let view = PostDetailView::from(PostDetail {
            post: post("a", &[]),
            view_count: 7,
        });
        let html = PostTemplate {
            view: LayoutContext::new(chrome().with_title("Title a"), view),
        }
        .render()
        .expect("render");
        assert!(html.contains("<h2>Hello</h2>"));
        assert!(html.contains("7 views"));
        assert!(html.contains("<title>Title a | MyBlog</title>"));
    }

    #[test]
    fn live_pagination_links() {
        let page = LivePage {
            entries: Vec::new(),
            page: 2,
            total_pages: 3,
            total: 45,
        };
        let view = LiveView::new(page, false);
        assert_eq!(view.pagination.previous_href.as_deref(), Some("/live?page=1"));
        assert_eq!(view.pagination.next_href.as_deref(), Some("/live?page=3"));

        let empty = LiveView::new(
            LivePage {
                entries: Vec::new(),
                page: 1,
                total_pages: 0,
                total: 0,
            },
            false,
        );
        assert_eq!(empty.pagination.total_pages, 1);
        assert!(empty.pagination.previous_href.is_none());
        assert!(empty.pagination.next_href.is_none());
    }
}
