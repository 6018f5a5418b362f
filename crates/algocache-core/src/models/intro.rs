use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EntityKind, ImageRef, IntroStepId, Timestamp, VersionedEntity};

/// Which onboarding sequence a step belongs to ("first-launch", "whats-new", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Designation(String);

impl Designation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One screen of the onboarding intro sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroStep {
    pub id: IntroStepId,
    pub designation: Designation,
    pub position: u32,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub image: Option<ImageRef>,
    pub last_modified_at: Timestamp,
}

impl IntroStep {
    /// Order steps the way they are presented.
    pub fn sort_sequence(steps: &mut [IntroStep]) {
        steps.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
    }
}

impl VersionedEntity for IntroStep {
    type Id = IntroStepId;
    type Filter = Designation;

    const KIND: EntityKind = EntityKind::IntroSequence;

    fn id(&self) -> &IntroStepId {
        &self.id
    }

    fn last_modified_at(&self) -> Timestamp {
        self.last_modified_at
    }

    fn matches(&self, designation: &Designation) -> bool {
        self.designation == *designation
    }
}
