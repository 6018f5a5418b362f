use tracing::debug;

use crate::models::VersionedEntity;
use crate::repository::SourceRepository;

/// Outcome of asking the source whether it can be reached right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    /// Ask the source. Re-evaluated on every call.
    pub async fn check<E: VersionedEntity>(source: &dyn SourceRepository<E>) -> Self {
        if source.is_available().await {
            Availability::Available
        } else {
            debug!(kind = %E::KIND, "Source unavailable");
            Availability::Unavailable
        }
    }
}
