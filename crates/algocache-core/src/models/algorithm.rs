use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AlgorithmId, EntityKind, Timestamp, VersionedEntity};

/// Category an algorithm is filed under ("sorting", "graphs", ...).
/// Compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgorithmCategory(String);

impl AlgorithmCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AlgorithmCategory {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for AlgorithmCategory {}

impl fmt::Display for AlgorithmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    pub id: AlgorithmId,
    pub name: String,
    pub category: AlgorithmCategory,
    /// Big-O summary, e.g. "O(n log n)".
    pub complexity: Option<String>,
    #[serde(default)]
    pub description: String,
    pub last_modified_at: Timestamp,
}

impl VersionedEntity for Algorithm {
    type Id = AlgorithmId;
    type Filter = AlgorithmCategory;

    const KIND: EntityKind = EntityKind::Algorithm;

    fn id(&self) -> &AlgorithmId {
        &self.id
    }

    fn last_modified_at(&self) -> Timestamp {
        self.last_modified_at
    }

    fn matches(&self, category: &AlgorithmCategory) -> bool {
        self.category == *category
    }
}
