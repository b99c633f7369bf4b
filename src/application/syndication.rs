//! RSS 2.0 feed generation.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveTime;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc2822};

use crate::application::content::{ContentError, ContentService};
use crate::config::SiteSettings;
use crate::domain::posts::Post;

#[derive(Debug, Error)]
pub enum SyndicationError {
    #[error("failed to list posts")]
    Content(#[from] ContentError),
    #[error("failed to format build date: {0}")]
    Timestamp(#[from] time::error::Format),
}

#[derive(Clone)]
pub struct SyndicationService {
    content: Arc<ContentService>,
    site: Arc<SiteSettings>,
}

impl SyndicationService {
    pub fn new(content: Arc<ContentService>, site: Arc<SiteSettings>) -> Self {
        Self { content, site }
    }

    pub async fn rss_feed(&self) -> Result<String, SyndicationError> {
        let posts = self.content.get_all_posts(None).await?;
        build_rss(&self.site, &posts, OffsetDateTime::now_utc())
    }
}

/// Serialize `posts` as an RSS 2.0 document. Post dates become midnight UTC.
pub fn build_rss(
    site: &SiteSettings,
    posts: &[Arc<Post>],
    built_at: OffsetDateTime,
) -> Result<String, SyndicationError> {
    let base = site.url.trim_end_matches('/');
    let last_build = built_at.format(&Rfc2822)?;

    let mut items = String::new();
    for post in posts {
        let link = format!("{base}/post/{}", post.slug);
        let pub_date = post.date.and_time(NaiveTime::MIN).and_utc().to_rfc2822();
        let _ = write!(
            items,
            "    <item>\n      <title>{}</title>\n      <link>{link}</link>\n      <guid isPermaLink=\"true\">{link}</guid>\n      <pubDate>{pub_date}</pubDate>\n      <description>{}</description>\n    </item>\n",
            xml_escape(&post.title),
            xml_escape(&post.summary),
            link = xml_escape(&link),
        );
    }

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n    <language>en-us</language>\n    <managingEditor>{}</managingEditor>\n    <lastBuildDate>{last_build}</lastBuildDate>\n{items}  </channel>\n</rss>\n",
        xml_escape(&site.title),
        xml_escape(base),
        xml_escape(&site.description),
        xml_escape(&site.author),
    ))
}

fn xml_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
