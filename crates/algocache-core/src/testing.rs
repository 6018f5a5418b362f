//! Fixtures and fake repositories shared by unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use crate::api::SourceError;
use crate::error::CacheError;
use crate::models::{
    Algorithm, AlgorithmCategory, AlgorithmId, Article, ArticleId, Designation, IntroStep,
    IntroStepId, Tag, TagId, Timestamp, VersionedEntity,
};
use crate::repository::{CachedRepository, SourceRepository};

/// Fixed base instant plus `minutes`.
pub fn t(minutes: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn tag(id: &str, at: Timestamp) -> Tag {
    Tag {
        id: TagId::new(id),
        name: id.to_string(),
        color: None,
        last_modified_at: at,
    }
}

pub fn article(id: &str, tags: &[&str], at: Timestamp) -> Article {
    Article {
        id: ArticleId::new(id),
        title: id.to_string(),
        summary: String::new(),
        body: String::new(),
        tags: tags.iter().map(|t| TagId::new(*t)).collect(),
        thumbnail: None,
        last_modified_at: at,
    }
}

pub fn algorithm(id: &str, category: &str, at: Timestamp) -> Algorithm {
    Algorithm {
        id: AlgorithmId::new(id),
        name: id.to_string(),
        category: AlgorithmCategory::new(category),
        complexity: None,
        description: String::new(),
        last_modified_at: at,
    }
}

pub fn intro_step(id: &str, designation: &str, position: u32, at: Timestamp) -> IntroStep {
    IntroStep {
        id: IntroStepId::new(id),
        designation: Designation::new(designation),
        position,
        title: id.to_string(),
        body: String::new(),
        image: None,
        last_modified_at: at,
    }
}

/// Scriptable source: reachability switch, injected failures, hanging fetches.
pub struct FakeSource<E> {
    items: Mutex<Vec<E>>,
    available: AtomicBool,
    hang: AtomicBool,
    failures_left: AtomicU32,
    fetches: AtomicU32,
}

impl<E: VersionedEntity> FakeSource<E> {
    pub fn new(items: Vec<E>) -> Self {
        Self {
            items: Mutex::new(items),
            available: AtomicBool::new(true),
            hang: AtomicBool::new(false),
            failures_left: AtomicU32::new(0),
            fetches: AtomicU32::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every later fetch never completes.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    /// The next `count` fetches fail with a transient server error.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn items(&self) -> Vec<E> {
        self.items.lock().unwrap().clone()
    }

    async fn begin_fetch(&self) -> Result<(), SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SourceError::ServerError("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: VersionedEntity> SourceRepository<E> for FakeSource<E> {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn get_all(&self) -> Result<Vec<E>, SourceError> {
        self.begin_fetch().await?;
        Ok(self.items())
    }

    async fn get_by_id(&self, id: &E::Id) -> Result<E, SourceError> {
        self.begin_fetch().await?;
        self.items()
            .into_iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, SourceError> {
        self.begin_fetch().await?;
        Ok(self.items().into_iter().filter(|e| e.matches(filter)).collect())
    }
}

/// Cache that counts writes and rejects writes touching chosen identities.
pub struct FlakyCache<E: VersionedEntity> {
    rows: Mutex<BTreeMap<E::Id, E>>,
    failing: Mutex<BTreeSet<E::Id>>,
    populated: AtomicBool,
    writes: AtomicU32,
}

impl<E: VersionedEntity> FlakyCache<E> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(BTreeSet::new()),
            populated: AtomicBool::new(false),
            writes: AtomicU32::new(0),
        }
    }

    pub fn fail_writes_for(&self, id: E::Id) {
        self.failing.lock().unwrap().insert(id);
    }

    /// Populate without counting as a write.
    pub fn seed(&self, items: &[E]) {
        let mut rows = self.rows.lock().unwrap();
        for item in items {
            rows.insert(item.id().clone(), item.clone());
        }
        self.populated.store(true, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn begin_write(&self, ids: &[&E::Id]) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.lock().unwrap();
        if ids.iter().any(|id| failing.contains(*id)) {
            return Err(CacheError::Corrupt("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl<E: VersionedEntity> Default for FlakyCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: VersionedEntity> CachedRepository<E> for FlakyCache<E> {
    async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(!self.populated.load(Ordering::SeqCst))
    }

    async fn get_all(&self) -> Result<Vec<E>, CacheError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: &E::Id) -> Result<Option<E>, CacheError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn get_by_filter(&self, filter: &E::Filter) -> Result<Vec<E>, CacheError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.matches(filter))
            .cloned()
            .collect())
    }

    async fn save_all(&self, items: &[E]) -> Result<(), CacheError> {
        let ids: Vec<_> = items.iter().map(|e| e.id()).collect();
        self.begin_write(&ids)?;
        self.seed(items);
        Ok(())
    }

    async fn update(&self, item: &E) -> Result<(), CacheError> {
        self.begin_write(&[item.id()])?;
        self.seed(std::slice::from_ref(item));
        Ok(())
    }

    async fn delete(&self, id: &E::Id) -> Result<(), CacheError> {
        self.begin_write(&[id])?;
        self.rows.lock().unwrap().remove(id);
        Ok(())
    }

    async fn clear_cache(&self) -> Result<(), CacheError> {
        self.rows.lock().unwrap().clear();
        self.populated.store(false, Ordering::SeqCst);
        Ok(())
    }
}
