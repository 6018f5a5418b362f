//! Identifier types for the synced entity kinds.
//!
//! Identities are opaque, string-backed tokens handed out by the remote
//! source. They compare by value and are totally ordered so they can key
//! ordered maps.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identity of an [`Article`](super::Article).
    ArticleId
);
string_id!(
    /// Identity of a [`Tag`](super::Tag).
    TagId
);
string_id!(
    /// Identity of an [`Algorithm`](super::Algorithm).
    AlgorithmId
);
string_id!(
    /// Identity of a single [`IntroStep`](super::IntroStep).
    IntroStepId
);
