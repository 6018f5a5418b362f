//! Read-through, stale-while-revalidate cache service.
//!
//! One [`ReadThroughService`] exists per entity kind. Every read asks the
//! source whether it is reachable, then follows exactly one of four paths:
//!
//! - unreachable, cache never populated: [`SyncError::Offline`]
//! - unreachable, cache populated: cached value, unchanged
//! - reachable, cache never populated: fetch, save, return
//! - reachable, cache populated: cached value now, background refresh that
//!   reports a newer value through [`Revalidation`] and reconciles the cache
//!
//! Background failures are logged and never reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::availability::Availability;
use super::diff::diff;
use super::reconcile::CacheReconciler;
use super::retry::RetryPolicy;
use super::revalidation::{Revalidation, StaleNotifier};
use crate::api::SourceError;
use crate::error::{CacheError, SyncError, SyncResult};
use crate::models::{EntityKind, VersionedEntity};
use crate::repository::{CachedRepository, ClearableCache, SourceRepository};

/// Where the immediately returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOrigin {
    /// Fetched from the source because nothing was cached yet.
    Source,
    /// Served from cache while a background refresh runs.
    Cache,
    /// Served from cache because the source is unreachable.
    Offline,
}

/// Result of a read: the best value known right now, plus the pending refresh.
#[derive(Debug)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: ReadOrigin,
    pub revalidation: Revalidation<T>,
}

impl<T: Send + 'static> Fetched<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            origin: ReadOrigin::Source,
            revalidation: Revalidation::none(),
        }
    }

    fn offline(value: T) -> Self {
        Self {
            value,
            origin: ReadOrigin::Offline,
            revalidation: Revalidation::none(),
        }
    }

    fn cached(value: T, revalidation: Revalidation<T>) -> Self {
        Self {
            value,
            origin: ReadOrigin::Cache,
            revalidation,
        }
    }

    /// Apply `f` to the value and to any stale value delivered later.
    pub fn map<U, F>(self, f: F) -> Fetched<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Clone + Send + 'static,
    {
        Fetched {
            value: f.clone()(self.value),
            origin: self.origin,
            revalidation: self.revalidation.map(f),
        }
    }
}

/// Shape of a collection read.
#[derive(Debug, Clone)]
pub enum CollectionQuery<F> {
    All,
    Filtered(F),
}

pub struct ReadThroughService<E: VersionedEntity> {
    source: Arc<dyn SourceRepository<E>>,
    cache: Arc<dyn CachedRepository<E>>,
    retry: RetryPolicy,
}

impl<E: VersionedEntity> Clone for ReadThroughService<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
            retry: self.retry,
        }
    }
}

impl<E: VersionedEntity> ReadThroughService<E> {
    pub fn new(
        source: Arc<dyn SourceRepository<E>>,
        cache: Arc<dyn CachedRepository<E>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            cache,
            retry,
        }
    }

    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    /// How long ago the cache for this kind was written, if it tracks that.
    pub async fn cache_age(&self) -> Option<String> {
        self.cache.age_display().await
    }

    pub async fn get_all(&self) -> SyncResult<Fetched<Vec<E>>> {
        self.get_many(CollectionQuery::All).await
    }

    pub async fn get_by_filter(&self, filter: E::Filter) -> SyncResult<Fetched<Vec<E>>> {
        self.get_many(CollectionQuery::Filtered(filter)).await
    }

    /// Single-item read.
    pub async fn get_by_id(&self, id: &E::Id) -> SyncResult<Fetched<E>> {
        match Availability::check(&*self.source).await {
            Availability::Unavailable => {
                if self.cache.is_empty().await? {
                    return Err(SyncError::Offline { kind: E::KIND });
                }
                match self.cache.get_by_id(id).await? {
                    Some(cached) => Ok(Fetched::offline(cached)),
                    None => Err(SyncError::NotFound {
                        kind: E::KIND,
                        id: id.to_string(),
                    }),
                }
            }
            Availability::Available => {
                if !self.cache.is_empty().await? {
                    if let Some(cached) = self.cache.get_by_id(id).await? {
                        let revalidation = self.revalidate_one(id.clone(), cached.clone());
                        return Ok(Fetched::cached(cached, revalidation));
                    }
                    debug!(kind = %E::KIND, id = %id, "Record not cached yet, fetching from source");
                }

                let fresh = self
                    .retry
                    .run(|| self.source.get_by_id(id))
                    .await
                    .map_err(|e| SyncError::from_source(E::KIND, Some(id.to_string()), e))?;
                self.cache.save_all(std::slice::from_ref(&fresh)).await?;
                Ok(Fetched::fresh(fresh))
            }
        }
    }

    /// Collection read (all records, or those matching a filter).
    pub async fn get_many(&self, query: CollectionQuery<E::Filter>) -> SyncResult<Fetched<Vec<E>>> {
        match Availability::check(&*self.source).await {
            Availability::Unavailable => {
                if self.cache.is_empty().await? {
                    return Err(SyncError::Offline { kind: E::KIND });
                }
                let cached = self.cached_collection(&query).await?;
                Ok(Fetched::offline(cached))
            }
            Availability::Available => {
                if self.cache.is_empty().await? {
                    let fresh = self
                        .fetch_collection(&query)
                        .await
                        .map_err(|e| SyncError::from_source(E::KIND, None, e))?;
                    self.cache.save_all(&fresh).await?;
                    info!(kind = %E::KIND, count = fresh.len(), "Populated empty cache from source");
                    return Ok(Fetched::fresh(fresh));
                }

                let cached = self.cached_collection(&query).await?;
                let revalidation = self.revalidate_many(query, cached.clone());
                Ok(Fetched::cached(cached, revalidation))
            }
        }
    }

    async fn cached_collection(&self, query: &CollectionQuery<E::Filter>) -> Result<Vec<E>, CacheError> {
        match query {
            CollectionQuery::All => self.cache.get_all().await,
            CollectionQuery::Filtered(filter) => self.cache.get_by_filter(filter).await,
        }
    }

    async fn fetch_collection(&self, query: &CollectionQuery<E::Filter>) -> Result<Vec<E>, SourceError> {
        match query {
            CollectionQuery::All => self.retry.run(|| self.source.get_all()).await,
            CollectionQuery::Filtered(filter) => {
                self.retry.run(|| self.source.get_by_filter(filter)).await
            }
        }
    }

    fn revalidate_one(&self, id: E::Id, cached: E) -> Revalidation<E> {
        let this = self.clone();
        Revalidation::spawn(move |notifier: StaleNotifier<E>| async move {
            let fresh = match this.retry.run(|| this.source.get_by_id(&id)).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    warn!(kind = %E::KIND, id = %id, error = %e, "Background refresh failed");
                    return;
                }
            };

            if !fresh.is_newer_than(&cached) {
                debug!(kind = %E::KIND, id = %id, "Cached record is current");
                return;
            }

            debug!(kind = %E::KIND, id = %id, "Cached record is stale");
            notifier.notify(fresh.clone());
            if let Err(e) = this.cache.update(&fresh).await {
                warn!(kind = %E::KIND, id = %id, error = %e, "Failed to update stale record");
            }
        })
    }

    fn revalidate_many(&self, query: CollectionQuery<E::Filter>, cached: Vec<E>) -> Revalidation<Vec<E>> {
        let this = self.clone();
        Revalidation::spawn(move |notifier: StaleNotifier<Vec<E>>| async move {
            let fresh = match this.fetch_collection(&query).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    warn!(kind = %E::KIND, error = %e, "Background refresh failed");
                    return;
                }
            };

            let changes = diff(&fresh, &cached);
            if changes.is_empty() {
                debug!(kind = %E::KIND, count = cached.len(), "Cached collection is current");
                return;
            }

            debug!(kind = %E::KIND, changes = changes.len(), "Cached collection is stale");
            notifier.notify(fresh);
            CacheReconciler::new(Arc::clone(&this.cache)).apply(&changes).await;
        })
    }
}

#[async_trait]
impl<E: VersionedEntity> ClearableCache for ReadThroughService<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    async fn clear_cache(&self) -> Result<(), CacheError> {
        info!(kind = %E::KIND, "Clearing cache");
        self.cache.clear_cache().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::models::{Tag, TagId};
    use crate::testing::{t, tag, FakeSource};

    fn service(source: &Arc<FakeSource<Tag>>, cache: &Arc<MemoryCache<Tag>>) -> ReadThroughService<Tag> {
        ReadThroughService::new(source.clone(), cache.clone(), RetryPolicy::default())
    }

    fn sorted(mut items: Vec<Tag>) -> Vec<Tag> {
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    #[tokio::test]
    async fn test_offline_with_empty_cache_fails() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(1))]));
        source.set_available(false);
        let cache = Arc::new(MemoryCache::<Tag>::new());

        let err = service(&source, &cache).get_all().await.unwrap_err();
        assert!(matches!(err, SyncError::Offline { kind: EntityKind::Tag }));

        let err = service(&source, &cache).get_by_id(&TagId::new("a")).await.unwrap_err();
        assert!(err.is_offline());
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_serves_cache_unchanged() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(9))]));
        source.set_available(false);
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("a", t(1))]).await.unwrap();

        let fetched = service(&source, &cache).get_all().await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Offline);
        assert_eq!(fetched.value, vec![tag("a", t(1))]);
        assert!(!fetched.revalidation.is_pending());
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_missing_record_is_not_found() {
        let source = Arc::new(FakeSource::new(vec![]));
        source.set_available(false);
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("a", t(1))]).await.unwrap();

        let err = service(&source, &cache).get_by_id(&TagId::new("zzz")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { ref id, .. } if id == "zzz"));
    }

    #[tokio::test]
    async fn test_empty_cache_fetches_and_populates() {
        let data = vec![tag("a", t(1)), tag("b", t(2))];
        let source = Arc::new(FakeSource::new(data.clone()));
        let cache = Arc::new(MemoryCache::<Tag>::new());

        let mut fetched = service(&source, &cache).get_all().await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Source);
        assert_eq!(sorted(fetched.value.clone()), data);
        assert_eq!(fetched.revalidation.stale().await, None);

        assert!(!cache.is_empty().await.unwrap());
        assert_eq!(sorted(cache.get_all().await.unwrap()), data);
    }

    #[tokio::test]
    async fn test_empty_cache_single_item_is_saved() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(1))]));
        let cache = Arc::new(MemoryCache::<Tag>::new());

        let fetched = service(&source, &cache).get_by_id(&TagId::new("a")).await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Source);
        assert_eq!(fetched.value, tag("a", t(1)));
        assert!(!cache.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_not_found_on_critical_path_fetched_once() {
        let source = Arc::new(FakeSource::<Tag>::new(vec![]));
        let cache = Arc::new(MemoryCache::<Tag>::new());

        let err = service(&source, &cache).get_by_id(&TagId::new("nope")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_on_critical_path_surfaces() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(1))]));
        source.fail_next(10);
        let cache = Arc::new(MemoryCache::<Tag>::new());

        let err = service(&source, &cache).get_all().await.unwrap_err();
        assert!(matches!(err, SyncError::Source(SourceError::ServerError(_))));
        // One attempt plus the default three retries
        assert_eq!(source.fetch_count(), 4);
        assert!(cache.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_hit_returns_while_source_hangs() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(5))]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("a", t(1))]).await.unwrap();
        source.hang();

        let fetched = tokio::time::timeout(Duration::from_secs(1), service(&source, &cache).get_all())
            .await
            .expect("cache hit must not wait for the source")
            .unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Cache);
        assert_eq!(fetched.value, vec![tag("a", t(1))]);
        assert!(fetched.revalidation.is_pending());
    }

    #[tokio::test]
    async fn test_stale_single_item_notifies_and_updates_cache() {
        let source = Arc::new(FakeSource::new(vec![tag("1", t(1))]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("1", t(0))]).await.unwrap();

        let mut fetched = service(&source, &cache).get_by_id(&TagId::new("1")).await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Cache);
        assert_eq!(fetched.value, tag("1", t(0)));

        assert_eq!(fetched.revalidation.stale().await, Some(tag("1", t(1))));
        fetched.revalidation.settled().await;

        let cached = cache.get_by_id(&TagId::new("1")).await.unwrap();
        assert_eq!(cached, Some(tag("1", t(1))));
    }

    #[tokio::test]
    async fn test_no_stale_notification_when_unchanged() {
        let data = vec![tag("a", t(3)), tag("b", t(4))];
        let source = Arc::new(FakeSource::new(data.clone()));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&data).await.unwrap();

        let mut fetched = service(&source, &cache).get_all().await.unwrap();
        assert_eq!(fetched.revalidation.stale().await, None);

        let mut one = service(&source, &cache).get_by_id(&TagId::new("a")).await.unwrap();
        assert_eq!(one.revalidation.stale().await, None);
    }

    #[tokio::test]
    async fn test_stale_collection_notifies_and_reconciles() {
        let source = Arc::new(FakeSource::new(vec![
            tag("keep", t(1)),
            tag("changed", t(5)),
            tag("added", t(2)),
        ]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache
            .save_all(&[tag("keep", t(1)), tag("changed", t(1)), tag("removed", t(1))])
            .await
            .unwrap();

        let mut fetched = service(&source, &cache).get_all().await.unwrap();
        assert_eq!(fetched.value.len(), 3);

        let fresh = fetched.revalidation.stale().await.expect("collection changed");
        assert_eq!(sorted(fresh), sorted(source.items()));
        fetched.revalidation.settled().await;

        assert_eq!(sorted(cache.get_all().await.unwrap()), sorted(source.items()));
    }

    #[tokio::test]
    async fn test_background_failure_is_swallowed() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(9))]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("a", t(1))]).await.unwrap();
        source.fail_next(10);

        let mut fetched = service(&source, &cache).get_all().await.unwrap();
        assert_eq!(fetched.value, vec![tag("a", t(1))]);
        assert_eq!(fetched.revalidation.stale().await, None);
        fetched.revalidation.settled().await;
        assert_eq!(cache.get_all().await.unwrap(), vec![tag("a", t(1))]);
    }

    #[tokio::test]
    async fn test_single_item_deleted_at_source_keeps_cached_copy() {
        let source = Arc::new(FakeSource::<Tag>::new(vec![]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("1", t(0))]).await.unwrap();

        let mut fetched = service(&source, &cache).get_by_id(&TagId::new("1")).await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Cache);
        assert_eq!(fetched.value, tag("1", t(0)));
        assert_eq!(fetched.revalidation.stale().await, None);
        fetched.revalidation.settled().await;

        // Not found is terminal: a single background fetch
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.get_by_id(&TagId::new("1")).await.unwrap(), Some(tag("1", t(0))));
    }

    #[tokio::test]
    async fn test_single_item_background_failure_is_swallowed() {
        let source = Arc::new(FakeSource::new(vec![tag("1", t(5))]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("1", t(0))]).await.unwrap();
        source.fail_next(10);

        let mut fetched = service(&source, &cache).get_by_id(&TagId::new("1")).await.unwrap();
        assert_eq!(fetched.origin, ReadOrigin::Cache);
        assert_eq!(fetched.value, tag("1", t(0)));
        assert_eq!(fetched.revalidation.stale().await, None);
        fetched.revalidation.settled().await;

        assert_eq!(source.fetch_count(), 4);
        assert_eq!(cache.get_by_id(&TagId::new("1")).await.unwrap(), Some(tag("1", t(0))));
    }

    #[tokio::test]
    async fn test_clear_cache_returns_to_empty() {
        let source = Arc::new(FakeSource::new(vec![tag("a", t(1))]));
        let cache = Arc::new(MemoryCache::<Tag>::new());
        cache.save_all(&[tag("a", t(1))]).await.unwrap();

        let svc = service(&source, &cache);
        ClearableCache::clear_cache(&svc).await.unwrap();
        assert!(cache.is_empty().await.unwrap());
        assert_eq!(ClearableCache::kind(&svc), EntityKind::Tag);
    }
}
