use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::error::SyncResult;
use crate::models::{Article, ArticleId, ImageRef, TagId};
use crate::repository::ImageStore;
use crate::sync::{Fetched, ReadOrigin, ReadThroughService};

/// Article reads. Offline reads get their thumbnails pointed at local files.
#[derive(Clone)]
pub struct ArticleService {
    inner: ReadThroughService<Article>,
    images: Arc<dyn ImageStore>,
}

impl ArticleService {
    pub fn new(inner: ReadThroughService<Article>, images: Arc<dyn ImageStore>) -> Self {
        Self { inner, images }
    }

    pub fn inner(&self) -> &ReadThroughService<Article> {
        &self.inner
    }

    pub async fn get_all(&self) -> SyncResult<Fetched<Vec<Article>>> {
        let fetched = self.inner.get_all().await?;
        Ok(self.hydrate_many(fetched).await)
    }

    pub async fn get_by_id(&self, id: &ArticleId) -> SyncResult<Fetched<Article>> {
        let mut fetched = self.inner.get_by_id(id).await?;
        if fetched.origin == ReadOrigin::Offline {
            fetched.value = self.hydrate(fetched.value).await;
        }
        Ok(fetched)
    }

    pub async fn get_by_tag(&self, tag: TagId) -> SyncResult<Fetched<Vec<Article>>> {
        let fetched = self.inner.get_by_filter(tag).await?;
        Ok(self.hydrate_many(fetched).await)
    }

    async fn hydrate_many(&self, mut fetched: Fetched<Vec<Article>>) -> Fetched<Vec<Article>> {
        if fetched.origin == ReadOrigin::Offline {
            let articles = std::mem::take(&mut fetched.value);
            fetched.value = join_all(articles.into_iter().map(|a| self.hydrate(a))).await;
        }
        fetched
    }

    /// Swap a cached thumbnail for its local file, or the placeholder when
    /// the file is gone.
    async fn hydrate(&self, article: Article) -> Article {
        let Some(ref thumbnail) = article.thumbnail else {
            return article;
        };
        let hydrated = match self.images.resolve(thumbnail).await {
            Some(path) => ImageRef::Local { path },
            None => {
                debug!(id = %article.id, "Thumbnail missing, using placeholder");
                ImageRef::Placeholder
            }
        };
        article.with_thumbnail(Some(hydrated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FsImageStore, MemoryCache};
    use crate::repository::CachedRepository;
    use crate::sync::RetryPolicy;
    use crate::testing::{article, t, FakeSource};

    fn with_thumbnail(id: &str, url: &str) -> Article {
        article(id, &["graphs"], t(1)).with_thumbnail(Some(ImageRef::remote(url)))
    }

    #[tokio::test]
    async fn test_offline_read_hydrates_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(FsImageStore::new(dir.path()));
        std::fs::write(images.path_for("https://cdn.example.com/bfs.png"), b"png").unwrap();

        let source = Arc::new(FakeSource::<Article>::new(vec![]));
        source.set_available(false);
        let cache = Arc::new(MemoryCache::<Article>::new());
        cache
            .save_all(&[
                with_thumbnail("bfs", "https://cdn.example.com/bfs.png"),
                with_thumbnail("dfs", "https://cdn.example.com/dfs.png"),
                article("no-image", &["graphs"], t(1)),
            ])
            .await
            .unwrap();

        let service = ArticleService::new(
            ReadThroughService::new(source, cache, RetryPolicy::default()),
            images.clone(),
        );

        let fetched = service.get_by_tag(TagId::new("graphs")).await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Offline);
        let by_id = |id: &str| fetched.value.iter().find(|a| a.id.as_str() == id).unwrap().clone();

        assert_eq!(
            by_id("bfs").thumbnail,
            Some(ImageRef::Local {
                path: images.path_for("https://cdn.example.com/bfs.png")
            })
        );
        assert_eq!(by_id("dfs").thumbnail, Some(ImageRef::Placeholder));
        assert_eq!(by_id("no-image").thumbnail, None);

        let single = service.get_by_id(&ArticleId::new("dfs")).await.unwrap();
        assert_eq!(single.value.thumbnail, Some(ImageRef::Placeholder));
    }

    #[tokio::test]
    async fn test_online_read_keeps_remote_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(FsImageStore::new(dir.path()));
        let remote = with_thumbnail("bfs", "https://cdn.example.com/bfs.png");

        let source = Arc::new(FakeSource::new(vec![remote.clone()]));
        let cache = Arc::new(MemoryCache::<Article>::new());

        let service = ArticleService::new(
            ReadThroughService::new(source, cache, RetryPolicy::default()),
            images,
        );
        let fetched = service.get_all().await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Source);
        assert_eq!(fetched.value, vec![remote]);
    }
}
