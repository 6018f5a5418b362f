use crate::error::SyncResult;
use crate::models::{Designation, IntroStep};
use crate::sync::{Fetched, ReadThroughService};

/// Onboarding intro sequence. Steps always come back in presentation order,
/// including stale values delivered later.
#[derive(Clone)]
pub struct IntroSequenceService {
    inner: ReadThroughService<IntroStep>,
}

fn in_order(mut steps: Vec<IntroStep>) -> Vec<IntroStep> {
    IntroStep::sort_sequence(&mut steps);
    steps
}

impl IntroSequenceService {
    pub fn new(inner: ReadThroughService<IntroStep>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &ReadThroughService<IntroStep> {
        &self.inner
    }

    pub async fn get_all(&self) -> SyncResult<Fetched<Vec<IntroStep>>> {
        Ok(self.inner.get_all().await?.map(in_order))
    }

    pub async fn get_by_designation(&self, designation: Designation) -> SyncResult<Fetched<Vec<IntroStep>>> {
        Ok(self.inner.get_by_filter(designation).await?.map(in_order))
    }
}
