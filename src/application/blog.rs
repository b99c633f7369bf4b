//! Public blog reads: the post index and post detail with view counting.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    application::{
        content::{ContentError, ContentService},
        repos::{PostStatsRepo, RepoError},
    },
    domain::posts::Post,
};

#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct PostIndex {
    pub posts: Vec<Arc<Post>>,
    pub tags: BTreeSet<String>,
    pub active_tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Arc<Post>,
    pub view_count: u64,
}

#[derive(Clone)]
pub struct BlogService {
    content: Arc<ContentService>,
    stats: Arc<dyn PostStatsRepo>,
}

impl BlogService {
    pub fn new(content: Arc<ContentService>, stats: Arc<dyn PostStatsRepo>) -> Self {
        Self { content, stats }
    }

    /// Post listing, filtered by `tag` when given. An unknown tag is an empty list.
    pub async fn index(&self, tag: Option<&str>) -> Result<PostIndex, BlogError> {
        let tag = tag.map(str::trim).filter(|tag| !tag.is_empty());
        let posts = self.content.get_all_posts(tag).await?;
        let tags = self.content.get_all_tags().await?;

        Ok(PostIndex {
            posts,
            tags,
            active_tag: tag.map(str::to_string),
        })
    }

    /// Look up a post and record the view. `None` when the slug is unknown,
    /// in which case nothing is counted.
    pub async fn view_post(&self, slug: &str) -> Result<Option<PostDetail>, BlogError> {
        let Some(post) = self.content.get_post_by_slug(slug).await? else {
            return Ok(None);
        };

        let stat = self.stats.increment_view(&post.slug).await?;
        debug!(
            target: "driftlog::blog",
            slug = %post.slug,
            view_count = stat.view_count,
            "Post viewed"
        );

        Ok(Some(PostDetail {
            post,
            view_count: stat.view_count,
        }))
    }
}
