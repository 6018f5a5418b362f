use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use super::{EntityKind, TagId, Timestamp, VersionedEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: Option<String>,
    pub last_modified_at: Timestamp,
}

impl VersionedEntity for Tag {
    type Id = TagId;
    // Tags are only ever listed whole or looked up by id.
    type Filter = Infallible;

    const KIND: EntityKind = EntityKind::Tag;

    fn id(&self) -> &TagId {
        &self.id
    }

    fn last_modified_at(&self) -> Timestamp {
        self.last_modified_at
    }

    fn matches(&self, filter: &Infallible) -> bool {
        match *filter {}
    }
}
