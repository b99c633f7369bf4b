//! Read-only file roots for post images and static assets.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum FileRootError {
    #[error("invalid asset path")]
    InvalidPath,
    #[error("asset not found")]
    NotFound,
    #[error(transparent)]
    Io(std::io::Error),
}

impl From<std::io::Error> for FileRootError {
    fn from(err: std::io::Error) -> Self {
        // Directories and dangling names are both "nothing to serve".
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::IsADirectory => Self::NotFound,
            _ => Self::Io(err),
        }
    }
}

/// A directory whose files are served verbatim under a URL prefix.
#[derive(Debug, Clone)]
pub struct FileRoot {
    root: PathBuf,
}

impl FileRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn read(&self, relative: &str) -> Result<Bytes, FileRootError> {
        let absolute = self.resolve(relative)?;
        if fs::metadata(&absolute).await?.is_dir() {
            return Err(FileRootError::NotFound);
        }
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Join `relative` onto the root, refusing anything that could escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, FileRootError> {
        let path = Path::new(relative);
        if relative.is_empty()
            || path.is_absolute()
            || path.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(FileRootError::InvalidPath);
        }

        Ok(self.root.join(path))
    }
}
