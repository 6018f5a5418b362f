//! Process-wide handle on every entity kind's sync service.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{AlgorithmService, ArticleService, IntroSequenceService, TagService};
use crate::api::ApiClient;
use crate::cache::{FsImageStore, JsonFileCache};
use crate::config::Config;
use crate::error::SyncResult;
use crate::models::{Algorithm, Article, EntityKind, IntroStep, Tag};
use crate::repository::ClearableCache;
use crate::sync::{ClearCacheCoordinator, Fetched, ReadThroughService};

/// Directory below the cache directory holding downloaded images.
const IMAGES_DIR: &str = "images";

/// Built once per process and passed to whatever needs data.
pub struct SyncContext {
    pub articles: ArticleService,
    pub tags: TagService,
    pub algorithms: AlgorithmService,
    pub intro: IntroSequenceService,
    coordinator: ClearCacheCoordinator,
}

/// Per-kind outcome of [`SyncContext::warm_all`].
#[derive(Debug)]
pub struct WarmOutcome {
    pub kind: EntityKind,
    /// Number of records now known for the kind.
    pub result: SyncResult<usize>,
}

impl SyncContext {
    pub fn new(
        articles: ArticleService,
        tags: TagService,
        algorithms: AlgorithmService,
        intro: IntroSequenceService,
    ) -> Self {
        let coordinator = ClearCacheCoordinator::new(vec![
            Arc::new(articles.inner().clone()) as Arc<dyn ClearableCache>,
            Arc::new(tags.inner().clone()) as Arc<dyn ClearableCache>,
            Arc::new(algorithms.inner().clone()) as Arc<dyn ClearableCache>,
            Arc::new(intro.inner().clone()) as Arc<dyn ClearableCache>,
        ]);
        Self {
            articles,
            tags,
            algorithms,
            intro,
            coordinator,
        }
    }

    /// HTTP source, JSON file caches and on-disk images, as configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let api = Arc::new(ApiClient::from_config(config).context("Failed to create API client")?);
        let retry = config.retry_policy();
        let images = Arc::new(FsImageStore::new(cache_dir.join(IMAGES_DIR)));

        let articles = ReadThroughService::<Article>::new(
            api.clone(),
            Arc::new(JsonFileCache::<Article>::new(&cache_dir).context("Failed to open article cache")?),
            retry,
        );
        let tags = ReadThroughService::<Tag>::new(
            api.clone(),
            Arc::new(JsonFileCache::<Tag>::new(&cache_dir).context("Failed to open tag cache")?),
            retry,
        );
        let algorithms = ReadThroughService::<Algorithm>::new(
            api.clone(),
            Arc::new(JsonFileCache::<Algorithm>::new(&cache_dir).context("Failed to open algorithm cache")?),
            retry,
        );
        let intro = ReadThroughService::<IntroStep>::new(
            api,
            Arc::new(JsonFileCache::<IntroStep>::new(&cache_dir).context("Failed to open intro cache")?),
            retry,
        );

        info!(offline_mode = config.offline_mode, "Sync context ready");
        Ok(Self::new(
            ArticleService::new(articles, images),
            TagService::new(tags),
            AlgorithmService::new(algorithms),
            IntroSequenceService::new(intro),
        ))
    }

    /// Clear every kind's cache concurrently. The first failure is returned.
    pub async fn clear_cache(&self) -> SyncResult<()> {
        self.coordinator.execute().await
    }

    /// Fetch every kind's full collection and wait for background refreshes
    /// to finish, so the cache is as current as the source allows.
    pub async fn warm_all(&self) -> Vec<WarmOutcome> {
        info!("Warming all caches");
        let (articles, tags, algorithms, intro) = tokio::join!(
            async { settle(self.articles.get_all().await).await },
            async { settle(self.tags.get_all().await).await },
            async { settle(self.algorithms.get_all().await).await },
            async { settle(self.intro.get_all().await).await },
        );
        vec![
            WarmOutcome {
                kind: EntityKind::Article,
                result: articles,
            },
            WarmOutcome {
                kind: EntityKind::Tag,
                result: tags,
            },
            WarmOutcome {
                kind: EntityKind::Algorithm,
                result: algorithms,
            },
            WarmOutcome {
                kind: EntityKind::IntroSequence,
                result: intro,
            },
        ]
    }

    /// Age of each kind's cached data, `None` when never cached.
    pub async fn cache_status(&self) -> Vec<(EntityKind, Option<String>)> {
        let (articles, tags, algorithms, intro) = tokio::join!(
            self.articles.inner().cache_age(),
            self.tags.inner().cache_age(),
            self.algorithms.inner().cache_age(),
            self.intro.inner().cache_age(),
        );
        vec![
            (EntityKind::Article, articles),
            (EntityKind::Tag, tags),
            (EntityKind::Algorithm, algorithms),
            (EntityKind::IntroSequence, intro),
        ]
    }
}

/// Record count once the read and any refresh it started are done.
async fn settle<T: Send + 'static>(fetched: SyncResult<Fetched<Vec<T>>>) -> SyncResult<usize> {
    let mut fetched = fetched?;
    let count = match fetched.revalidation.stale().await {
        Some(fresh) => fresh.len(),
        None => fetched.value.len(),
    };
    fetched.revalidation.settled().await;
    Ok(count)
}
