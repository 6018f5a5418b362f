//! JSON-file cache, one file per entity kind.
//!
//! Each file holds every cached record of its kind together with the time it
//! was last written. A missing file means the kind has never been cached.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::CacheError;
use crate::models::{EntityKind, VersionedEntity};
use crate::repository::{CachedRepository, ClearableCache};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

pub struct JsonFileCache<E: VersionedEntity> {
    path: PathBuf,
    // Readers share, read-modify-write cycles and clears are exclusive.
    lock: RwLock<()>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: VersionedEntity> JsonFileCache<E> {
    pub fn new(cache_dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(cache_dir)?;
        Ok(Self {
            path: cache_dir.join(format!("{}.json", E::KIND.as_str())),
            lock: RwLock::new(()),
            _entity: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next contents are written to before being renamed
    /// over the cache file, so readers only ever see a complete file.
    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    /// Callers hold `lock`.
    async fn load(&self) -> Result<Option<CachedData<Vec<E>>>, CacheError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cached: CachedData<Vec<E>> = serde_json::from_str(&contents)?;
        Ok(Some(cached))
    }

    async fn rows(&self) -> Result<Vec<E>, CacheError> {
        Ok(self.load().await?.map(|c| c.data).unwrap_or_default())
    }

    async fn store(&self, rows: BTreeMap<E::Id, E>) -> Result<(), CacheError> {
        let cached = CachedData::new(rows.into_values().collect::<Vec<_>>());
        let contents = serde_json::to_string_pretty(&cached)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(kind = %E::KIND, count = cached.data.len(), "Wrote cache file");
        Ok(())
    }

    async fn modify<F>(&self, change: F) -> Result<(), CacheError>
    where
        F: FnOnce(&mut BTreeMap<E::Id, E>),
    {
        let _guard = self.lock.write().await;
        let mut rows: BTreeMap<E::Id, E> = self
            .rows()
            .await?
            .into_iter()
            .map(|e| (e.id().clone(), e))
            .collect();
        change(&mut rows);
        self.store(rows).await
    }
}

#[async_trait]
impl<E: VersionedEntity> CachedRepository<E> for JsonFileCache<E> {
    async fn is_empty(&self) -> Result<bool, CacheError> {
        let _guard = self.lock.read().await;
        Ok(!tokio::fs::try_exists(&self.path).await?)
    }

    async fn get_all(&self) -> Result<Vec<E>, CacheError> {
        let _guard = self.lock.read().await;
        self.rows().await
    }

    async fn get_by_id(&self, id: &E::Id) -> Result<Option<E>, CacheError> {
        let _guard = self.lock.read().await;
        Ok(self.rows().await?.into_iter().find(|e| e.id() == id))
    }

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, CacheError> {
        let _guard = self.lock.read().await;
        Ok(self
            .rows()
            .await?
            .into_iter()
            .filter(|e| e.matches(filter))
            .collect())
    }

    async fn save_all(&self, items: &[E]) -> Result<(), CacheError> {
        self.modify(|rows| {
            for item in items {
                rows.insert(item.id().clone(), item.clone());
            }
        })
        .await
    }

    async fn update(&self, item: &E) -> Result<(), CacheError> {
        self.modify(|rows| {
            rows.insert(item.id().clone(), item.clone());
        })
        .await
    }

    async fn delete(&self, id: &E::Id) -> Result<(), CacheError> {
        self.modify(|rows| {
            rows.remove(id);
        })
        .await
    }

    async fn clear_cache(&self) -> Result<(), CacheError> {
        let _guard = self.lock.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn age_display(&self) -> Option<String> {
        let _guard = self.lock.read().await;
        match self.load().await {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(kind = %E::KIND, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }
}

#[async_trait]
impl<E: VersionedEntity> ClearableCache for JsonFileCache<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    async fn clear_cache(&self) -> Result<(), CacheError> {
        <Self as CachedRepository<E>>::clear_cache(self).await
    }
}
