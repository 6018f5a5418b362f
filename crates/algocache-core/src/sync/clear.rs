use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use crate::error::SyncResult;
use crate::repository::ClearableCache;

/// Clears every entity kind's cache at once. The first failure is returned,
/// unlike reconciliation writes.
pub struct ClearCacheCoordinator {
    caches: Vec<Arc<dyn ClearableCache>>,
}

impl ClearCacheCoordinator {
    pub fn new(caches: Vec<Arc<dyn ClearableCache>>) -> Self {
        Self { caches }
    }

    pub async fn execute(&self) -> SyncResult<()> {
        info!(count = self.caches.len(), "Clearing all caches");
        try_join_all(self.caches.iter().map(|cache| cache.clear_cache())).await?;
        Ok(())
    }
}
