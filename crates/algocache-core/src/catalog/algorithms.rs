use crate::error::SyncResult;
use crate::models::{Algorithm, AlgorithmCategory, AlgorithmId};
use crate::sync::{Fetched, ReadThroughService};

#[derive(Clone)]
pub struct AlgorithmService {
    inner: ReadThroughService<Algorithm>,
}

impl AlgorithmService {
    pub fn new(inner: ReadThroughService<Algorithm>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &ReadThroughService<Algorithm> {
        &self.inner
    }

    pub async fn get_all(&self) -> SyncResult<Fetched<Vec<Algorithm>>> {
        self.inner.get_all().await
    }

    pub async fn get_by_id(&self, id: &AlgorithmId) -> SyncResult<Fetched<Algorithm>> {
        self.inner.get_by_id(id).await
    }

    pub async fn get_by_category(&self, category: AlgorithmCategory) -> SyncResult<Fetched<Vec<Algorithm>>> {
        self.inner.get_by_filter(category).await
    }
}
