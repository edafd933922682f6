//! Per-collection in-memory lookup built from a full snapshot.
//!
//! The cache has no public mutation API: the reconciler in `crate::reconcile`
//! is the only writer once a snapshot has been loaded.

use crate::{Match, MatchStatus, School, Sport, Team, User};
use std::collections::HashMap;

/// Records addressable by their gateway id.
pub trait Keyed {
    fn key(&self) -> &str;

    /// Status of the record, for records that have one. Used by the
    /// reconciler to report status transitions.
    fn status(&self) -> Option<MatchStatus> {
        None
    }
}

impl Keyed for Match {
    fn key(&self) -> &str {
        &self.id
    }

    fn status(&self) -> Option<MatchStatus> {
        Some(self.status)
    }
}

impl Keyed for Team {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for School {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Sport {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionCache<T> {
    records: HashMap<String, T>,
}

impl<T> Default for CollectionCache<T> {
    fn default() -> Self {
        Self { records: HashMap::new() }
    }
}

impl<T: Keyed> CollectionCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an ordered snapshot. Later duplicates overwrite earlier ones;
    /// records without an id cannot be looked up and are skipped.
    pub fn from_snapshot(records: impl IntoIterator<Item = T>) -> Self {
        let mut cache = Self::new();
        for record in records {
            if !record.key().trim().is_empty() {
                cache.insert(record);
            }
        }
        cache
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unordered iteration; projections impose their own ordering.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, record: T) -> Option<T> {
        self.records.insert(record.key().to_owned(), record)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.records.get_mut(id)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<T> {
        self.records.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sport(id: &str, name: &str) -> Sport {
        Sport { id: id.into(), name: name.into() }
    }

    #[test]
    fn snapshot_is_keyed_by_id() {
        let cache = CollectionCache::from_snapshot(vec![sport("s1", "Futsal"), sport("s2", "Volleyball")]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("s2").map(|s| s.name.as_str()), Some("Volleyball"));
        assert!(cache.get("s3").is_none());
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let cache = CollectionCache::from_snapshot(vec![sport("s1", "Futsal"), sport("s1", "Football")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("s1").map(|s| s.name.as_str()), Some("Football"));
    }

    #[test]
    fn records_without_id_are_skipped() {
        let cache = CollectionCache::from_snapshot(vec![sport("", "Ghost"), sport("s1", "Chess")]);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(""));
    }

    #[test]
    fn empty_snapshot_gives_empty_cache() {
        let cache: CollectionCache<Sport> = CollectionCache::from_snapshot(Vec::new());
        assert!(cache.is_empty());
        assert_eq!(cache.values().count(), 0);
    }
}
