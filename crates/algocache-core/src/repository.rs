//! Ports the sync layer consumes.
//!
//! Each entity kind is reached through one [`SourceRepository`] (the remote,
//! possibly unreachable, authority) and one [`CachedRepository`] (the local
//! mirror). Implementations live in [`crate::api`] and [`crate::cache`].

use std::path::PathBuf;

use async_trait::async_trait;

use crate::api::SourceError;
use crate::error::CacheError;
use crate::models::{EntityKind, ImageRef, VersionedEntity};

#[async_trait]
pub trait SourceRepository<E: VersionedEntity>: Send + Sync {
    /// Whether the source can currently be reached. Asked once per operation,
    /// never cached across calls.
    async fn is_available(&self) -> bool;

    async fn get_all(&self) -> Result<Vec<E>, SourceError>;

    /// Fails with the terminal [`SourceError::NotFound`] when no such record exists.
    async fn get_by_id(&self, id: &E::Id) -> Result<E, SourceError>;

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, SourceError>;
}

#[async_trait]
pub trait CachedRepository<E: VersionedEntity>: Send + Sync {
    /// True until the cache has been populated at least once. An empty result
    /// for a query does not make the cache empty.
    async fn is_empty(&self) -> Result<bool, CacheError>;

    async fn get_all(&self) -> Result<Vec<E>, CacheError>;

    async fn get_by_id(&self, id: &E::Id) -> Result<Option<E>, CacheError>;

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, CacheError>;

    /// Insert or replace every item, keyed by identity.
    async fn save_all(&self, items: &[E]) -> Result<(), CacheError>;

    /// Replace the row for `item`'s identity.
    async fn update(&self, item: &E) -> Result<(), CacheError>;

    async fn delete(&self, id: &E::Id) -> Result<(), CacheError>;

    /// Drop every row and return to the never-populated state.
    async fn clear_cache(&self) -> Result<(), CacheError>;

    /// Human-readable age of the cached data ("5m ago"), when tracked.
    async fn age_display(&self) -> Option<String> {
        None
    }
}

/// Resolves image references to files that can be shown without a network.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// `None` when the referenced image is not available locally.
    async fn resolve(&self, image: &ImageRef) -> Option<PathBuf>;
}

/// Kind-erased handle used to clear heterogeneous caches together.
#[async_trait]
pub trait ClearableCache: Send + Sync {
    fn kind(&self) -> EntityKind;

    async fn clear_cache(&self) -> Result<(), CacheError>;
}
