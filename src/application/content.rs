//! Markdown posts read from disk and served from a TTL snapshot.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    application::render::{MarkdownRenderer, RenderError},
    cache::SnapshotStore,
    domain::{
        error::DomainError,
        posts::{Post, parse_post_date, parse_post_front_matter, split_front_matter},
    },
};

const POST_EXTENSION: &str = "md";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid content file `{path}`")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
    #[error("failed to render `{path}`")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

type PostList = Vec<Arc<Post>>;

/// Post catalogue backed by a directory of markdown files.
///
/// The parsed listing is cached as one snapshot; a single malformed file
/// fails the whole rebuild and nothing is cached until it is fixed.
pub struct ContentService {
    posts_dir: PathBuf,
    renderer: Arc<MarkdownRenderer>,
    snapshot: SnapshotStore<PostList>,
}

impl ContentService {
    pub fn new(posts_dir: impl Into<PathBuf>, renderer: Arc<MarkdownRenderer>, ttl: Duration) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            renderer,
            snapshot: SnapshotStore::new(ttl),
        }
    }

    /// Every post, newest first, optionally restricted to those carrying `tag`.
    pub async fn get_all_posts(&self, tag: Option<&str>) -> Result<PostList, ContentError> {
        let posts = self.posts().await?;
        Ok(match tag {
            Some(tag) => posts.iter().filter(|post| post.has_tag(tag)).cloned().collect(),
            None => posts.as_ref().clone(),
        })
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Arc<Post>>, ContentError> {
        let posts = self.posts().await?;
        Ok(posts.iter().find(|post| post.slug == slug).cloned())
    }

    /// Distinct tags across all posts, sorted.
    pub async fn get_all_tags(&self) -> Result<BTreeSet<String>, ContentError> {
        let posts = self.posts().await?;
        Ok(posts
            .iter()
            .flat_map(|post| post.tags.iter().cloned())
            .collect())
    }

    pub fn invalidate_cache(&self) {
        self.snapshot.invalidate();
        info!(target: "driftlog::content", "Post cache invalidated");
    }

    async fn posts(&self) -> Result<Arc<PostList>, ContentError> {
        // An empty listing is never trusted; the next read rescans.
        if let Some(posts) = self.snapshot.get_fresh().filter(|posts| !posts.is_empty()) {
            return Ok(posts);
        }

        let started = Instant::now();
        let posts = load_posts(&self.posts_dir, &self.renderer).await?;
        let count = posts.len();
        let posts = self.snapshot.store_at(posts, Instant::now());

        info!(
            target: "driftlog::content",
            posts = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ttl_secs = self.snapshot.ttl().as_secs(),
            "Post cache rebuilt"
        );

        Ok(posts)
    }
}

async fn load_posts(dir: &Path, renderer: &MarkdownRenderer) -> Result<PostList, ContentError> {
    let mut paths = match markdown_files(dir).await {
        Ok(paths) => paths,
        Err(source) if source.kind() == ErrorKind::NotFound => {
            warn!(
                target: "driftlog::content",
                path = %dir.display(),
                "Posts directory does not exist; serving an empty listing"
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ContentError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    paths.sort();

    let mut posts = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|source| ContentError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(target: "driftlog::content", path = %path.display(), "Parsing post");
        posts.push(Arc::new(parse_post(&path, &raw, renderer)?));
    }

    // Stable sort keeps file-name order among posts sharing a date.
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(posts)
}

async fn markdown_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_markdown = path
            .extension()
            .is_some_and(|ext| ext == POST_EXTENSION);
        if is_markdown && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Parse one post file: front-matter, date, then rendered body.
pub fn parse_post(path: &Path, raw: &str, renderer: &MarkdownRenderer) -> Result<Post, ContentError> {
    let invalid = |source: DomainError| ContentError::Invalid {
        path: path.to_path_buf(),
        source,
    };

    let document = split_front_matter(raw).map_err(invalid)?;
    let meta = parse_post_front_matter(document.front_matter).map_err(invalid)?;
    let date = parse_post_date(&meta.date).map_err(invalid)?;
    let content_html = renderer
        .render_document(document.body)
        .map_err(|source| ContentError::Render {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Post {
        title: meta.title,
        date,
        slug: meta.slug,
        summary: meta.summary.unwrap_or_default(),
        content_html,
        tags: meta.tags,
    })
}
