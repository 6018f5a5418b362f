use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Last-modified instant carried by every synced record.
pub type Timestamp = DateTime<Utc>;

/// The independent entity kinds kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Article,
    Tag,
    Algorithm,
    IntroSequence,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Article,
        EntityKind::Tag,
        EntityKind::Algorithm,
        EntityKind::IntroSequence,
    ];

    /// Stable name used for cache file names and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Article => "articles",
            EntityKind::Tag => "tags",
            EntityKind::Algorithm => "algorithms",
            EntityKind::IntroSequence => "intro_sequence",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain record with a stable identity and a last-modified timestamp.
///
/// Two values with equal [`id`](Self::id) are the same logical record; the
/// one with the strictly greater [`last_modified_at`](Self::last_modified_at)
/// is authoritative. Values are never mutated by the sync layer, cache rows
/// are replaced wholesale per identity.
pub trait VersionedEntity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: Clone
        + Ord
        + Hash
        + fmt::Debug
        + fmt::Display
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Filter accepted by the kind's filtered collection query.
    /// Kinds without one use [`std::convert::Infallible`].
    type Filter: Clone + fmt::Debug + Send + Sync + 'static;

    const KIND: EntityKind;

    fn id(&self) -> &Self::Id;

    fn last_modified_at(&self) -> Timestamp;

    /// Whether this record belongs to the result of a filtered query.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Strictly newer than `other`. Equal timestamps are not newer.
    fn is_newer_than(&self, other: &Self) -> bool {
        self.last_modified_at() > other.last_modified_at()
    }
}
