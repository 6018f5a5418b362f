use crate::error::SyncResult;
use crate::models::{Tag, TagId};
use crate::sync::{Fetched, ReadThroughService};

#[derive(Clone)]
pub struct TagService {
    inner: ReadThroughService<Tag>,
}

impl TagService {
    pub fn new(inner: ReadThroughService<Tag>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &ReadThroughService<Tag> {
        &self.inner
    }

    pub async fn get_all(&self) -> SyncResult<Fetched<Vec<Tag>>> {
        self.inner.get_all().await
    }

    pub async fn get_by_id(&self, id: &TagId) -> SyncResult<Fetched<Tag>> {
        self.inner.get_by_id(id).await
    }
}
