//! Identity-keyed diff between a freshly fetched collection and the cached one.

use std::collections::BTreeMap;

use crate::models::{Timestamp, VersionedEntity};

/// Create/update/delete partition produced by [`diff_by`].
///
/// The three sets are mutually exclusive. Records present on both sides
/// with no newer source timestamp appear in none of them.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult<T, K> {
    /// Present in source, absent from cache.
    pub to_create: Vec<T>,
    /// Present on both sides, source strictly newer.
    pub to_update: Vec<T>,
    /// Present in cache, absent from source.
    pub to_delete: Vec<K>,
}

/// Diff of a [`VersionedEntity`] collection.
pub type EntityDiff<E> = DiffResult<E, <E as VersionedEntity>::Id>;

impl<T, K> DiffResult<T, K> {
    pub fn empty() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of changes.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

impl<T, K> Default for DiffResult<T, K> {
    fn default() -> Self {
        Self::empty()
    }
}

struct Grouping<'a, T> {
    source: Option<&'a T>,
    cache: Option<&'a T>,
}

/// Compare `source` against `cache` using injected identity and timestamp
/// extractors. Pure and deterministic; output order is not significant.
pub fn diff_by<T, K, I, M>(source: &[T], cache: &[T], identity_of: I, modified_at: M) -> DiffResult<T, K>
where
    T: Clone,
    K: Ord + Clone,
    I: Fn(&T) -> K,
    M: Fn(&T) -> Timestamp,
{
    let mut groups: BTreeMap<K, Grouping<'_, T>> = BTreeMap::new();

    for item in source {
        groups
            .entry(identity_of(item))
            .or_insert(Grouping {
                source: None,
                cache: None,
            })
            .source = Some(item);
    }
    for item in cache {
        groups
            .entry(identity_of(item))
            .or_insert(Grouping {
                source: None,
                cache: None,
            })
            .cache = Some(item);
    }

    let mut result = DiffResult::empty();
    for (id, group) in groups {
        match (group.source, group.cache) {
            (Some(fresh), None) => result.to_create.push(fresh.clone()),
            (None, Some(_)) => result.to_delete.push(id),
            (Some(fresh), Some(cached)) => {
                if modified_at(fresh) > modified_at(cached) {
                    result.to_update.push(fresh.clone());
                }
            }
            (None, None) => {}
        }
    }
    result
}

/// [`diff_by`] keyed on the entity's own identity and timestamp.
pub fn diff<E: VersionedEntity>(source: &[E], cache: &[E]) -> EntityDiff<E> {
    diff_by(source, cache, |e| e.id().clone(), |e| e.last_modified_at())
}
