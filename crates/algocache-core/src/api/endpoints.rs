use std::convert::Infallible;

use crate::models::{Algorithm, AlgorithmCategory, Article, Designation, IntroStep, Tag, TagId, VersionedEntity};

/// REST routes for an entity kind.
pub trait Endpoint: VersionedEntity {
    /// Collection path below the API base URL.
    const PATH: &'static str;

    /// Query parameter for the kind's filtered collection read.
    fn filter_query(filter: &Self::Filter) -> (&'static str, String);
}

impl Endpoint for Article {
    const PATH: &'static str = "articles";

    fn filter_query(tag: &TagId) -> (&'static str, String) {
        ("tag", tag.to_string())
    }
}

impl Endpoint for Tag {
    const PATH: &'static str = "tags";

    fn filter_query(filter: &Infallible) -> (&'static str, String) {
        match *filter {}
    }
}

impl Endpoint for Algorithm {
    const PATH: &'static str = "algorithms";

    fn filter_query(category: &AlgorithmCategory) -> (&'static str, String) {
        ("category", category.to_string())
    }
}

impl Endpoint for IntroStep {
    const PATH: &'static str = "intro-steps";

    fn filter_query(designation: &Designation) -> (&'static str, String) {
        ("designation", designation.to_string())
    }
}
