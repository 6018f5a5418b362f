use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::models::{EntityKind, VersionedEntity};
use crate::repository::{CachedRepository, ClearableCache};

struct MemoryState<E: VersionedEntity> {
    rows: BTreeMap<E::Id, E>,
    populated: bool,
}

/// Process-local cache keyed by identity. Nothing survives a restart.
pub struct MemoryCache<E: VersionedEntity> {
    state: RwLock<MemoryState<E>>,
}

impl<E: VersionedEntity> MemoryCache<E> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                rows: BTreeMap::new(),
                populated: false,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }
}

impl<E: VersionedEntity> Default for MemoryCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: VersionedEntity> CachedRepository<E> for MemoryCache<E> {
    async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(!self.state.read().await.populated)
    }

    async fn get_all(&self) -> Result<Vec<E>, CacheError> {
        Ok(self.state.read().await.rows.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &E::Id) -> Result<Option<E>, CacheError> {
        Ok(self.state.read().await.rows.get(id).cloned())
    }

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, CacheError> {
        let state = self.state.read().await;
        Ok(state.rows.values().filter(|e| e.matches(filter)).cloned().collect())
    }

    async fn save_all(&self, items: &[E]) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        for item in items {
            state.rows.insert(item.id().clone(), item.clone());
        }
        state.populated = true;
        Ok(())
    }

    async fn update(&self, item: &E) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.rows.insert(item.id().clone(), item.clone());
        state.populated = true;
        Ok(())
    }

    async fn delete(&self, id: &E::Id) -> Result<(), CacheError> {
        self.state.write().await.rows.remove(id);
        Ok(())
    }

    async fn clear_cache(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.rows.clear();
        state.populated = false;
        Ok(())
    }
}

#[async_trait]
impl<E: VersionedEntity> ClearableCache for MemoryCache<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    async fn clear_cache(&self) -> Result<(), CacheError> {
        <Self as CachedRepository<E>>::clear_cache(self).await
    }
}
