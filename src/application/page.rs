//! Standalone pages (`about`, ...) read straight from disk on each request.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use crate::{
    application::{content::ContentError, render::MarkdownRenderer},
    domain::{
        error::DomainError,
        posts::{Page, parse_page_front_matter, split_front_matter},
    },
};

pub struct PageService {
    pages_dir: PathBuf,
    renderer: Arc<MarkdownRenderer>,
}

impl PageService {
    pub fn new(pages_dir: impl Into<PathBuf>, renderer: Arc<MarkdownRenderer>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            renderer,
        }
    }

    /// Load `<slug>.md`. Unsafe slugs and absent files both yield `None`.
    pub async fn get_page(&self, slug: &str) -> Result<Option<Page>, ContentError> {
        if !is_safe_slug(slug) {
            return Ok(None);
        }

        let path = self.pages_dir.join(format!("{slug}.md"));
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ContentError::Io { path, source }),
        };

        parse_page(&path, &raw, &self.renderer).map(Some)
    }
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.starts_with('.') && !slug.contains(['/', '\\'])
}

fn parse_page(path: &Path, raw: &str, renderer: &MarkdownRenderer) -> Result<Page, ContentError> {
    let invalid = |source: DomainError| ContentError::Invalid {
        path: path.to_path_buf(),
        source,
    };

    let document = split_front_matter(raw).map_err(invalid)?;
    let meta = parse_page_front_matter(document.front_matter).map_err(invalid)?;
    let content_html = renderer
        .render_document(document.body)
        .map_err(|source| ContentError::Render {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Page {
        title: meta.title,
        content_html,
    })
}
