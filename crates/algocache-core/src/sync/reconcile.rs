//! Applies a diff to a cache repository.
//!
//! Writes are best-effort: every write in a batch is issued and awaited, a
//! failed write is logged and counted but never rolls back or aborts its
//! siblings. Partial reconciliation is preferred over blocking the stale
//! notification.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, warn};

use super::diff::EntityDiff;
use crate::error::CacheError;
use crate::models::VersionedEntity;
use crate::repository::CachedRepository;

/// What a reconciliation pass managed to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl ReconcileReport {
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.deleted + self.failed
    }
}

enum Write {
    Create(usize),
    Update,
    Delete,
}

pub struct CacheReconciler<E: VersionedEntity> {
    cache: Arc<dyn CachedRepository<E>>,
}

impl<E: VersionedEntity> CacheReconciler<E> {
    pub fn new(cache: Arc<dyn CachedRepository<E>>) -> Self {
        Self { cache }
    }

    /// One bulk create, one update per changed record, one delete per removed
    /// identity, all awaited together. Never fails.
    pub async fn apply(&self, diff: &EntityDiff<E>) -> ReconcileReport {
        let mut writes: Vec<BoxFuture<'_, (Write, Result<(), CacheError>)>> = Vec::new();

        if !diff.to_create.is_empty() {
            let count = diff.to_create.len();
            writes.push(
                self.cache
                    .save_all(&diff.to_create)
                    .map(move |r| (Write::Create(count), r))
                    .boxed(),
            );
        }
        for item in &diff.to_update {
            writes.push(self.cache.update(item).map(|r| (Write::Update, r)).boxed());
        }
        for id in &diff.to_delete {
            writes.push(self.cache.delete(id).map(|r| (Write::Delete, r)).boxed());
        }

        let mut report = ReconcileReport::default();
        for (write, result) in join_all(writes).await {
            match (write, result) {
                (Write::Create(count), Ok(())) => report.created += count,
                (Write::Update, Ok(())) => report.updated += 1,
                (Write::Delete, Ok(())) => report.deleted += 1,
                (_, Err(e)) => {
                    warn!(kind = %E::KIND, error = %e, "Cache write failed during reconciliation");
                    report.failed += 1;
                }
            }
        }

        debug!(
            kind = %E::KIND,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            failed = report.failed,
            "Reconciled cache"
        );
        report
    }
}
