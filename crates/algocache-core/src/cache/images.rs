use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::models::ImageRef;
use crate::repository::ImageStore;

/// Finds downloaded images under a directory, one file per remote URL.
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the image for `url` is expected to be saved.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(file_name_for(url))
    }
}

/// Flatten a URL into a safe file name.
fn file_name_for(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn resolve(&self, image: &ImageRef) -> Option<PathBuf> {
        let path = match image {
            ImageRef::Remote { url } => self.path_for(url),
            ImageRef::Local { path } => path.clone(),
            ImageRef::Placeholder => return None,
        };
        if exists(&path).await {
            Some(path)
        } else {
            debug!(path = %path.display(), "Cached image file missing");
            None
        }
    }
}
