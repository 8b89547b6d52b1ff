//! The set of cache entries produced by one logical operation.

use std::collections::BTreeMap;

use bytes::Bytes;
use lp_core::{CacheKey, Result};

use crate::store::ContentStore;

/// Cache entries newly created by one operation.
///
/// A write set is owned by the call that produced it until the caller merges
/// it into its own. Keys are fingerprints of the computation that produced the
/// value, so a merge never sees one key with two different values; merging is
/// a plain key union and is commutative and associative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheWriteSet {
    entries: BTreeMap<CacheKey, Bytes>,
}

impl CacheWriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding exactly one entry.
    pub fn single(key: CacheKey, data: Bytes) -> Self {
        let mut set = Self::new();
        set.insert(key, data);
        set
    }

    pub fn insert(&mut self, key: CacheKey, data: Bytes) {
        debug_assert!(
            self.entries.get(&key).map_or(true, |existing| *existing == data),
            "conflicting cache values for {key}"
        );
        self.entries.insert(key, data);
    }

    /// Absorb every entry of `other`.
    pub fn merge(&mut self, other: CacheWriteSet) {
        for (key, data) in other.entries {
            self.insert(key, data);
        }
    }

    /// Consuming form of [`merge`](Self::merge).
    #[must_use]
    pub fn merged(mut self, other: CacheWriteSet) -> Self {
        self.merge(other);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|d| d.len() as u64).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }

    /// Drop the payloads, keeping only the keys.
    pub fn into_keys(self) -> impl Iterator<Item = CacheKey> {
        self.entries.into_keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Bytes)> {
        self.entries.iter()
    }

    /// Write every entry to `store`.
    pub async fn apply(&self, store: &dyn ContentStore) -> Result<()> {
        for (key, data) in &self.entries {
            store.write(key, data.clone()).await?;
        }
        Ok(())
    }
}

impl FromIterator<CacheWriteSet> for CacheWriteSet {
    fn from_iter<I: IntoIterator<Item = CacheWriteSet>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::merged)
    }
}
