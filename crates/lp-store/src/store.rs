//! The [`ContentStore`] trait and its backends.
//!
//! A store maps [`CacheKey`]s to immutable byte buffers. Every key is derived
//! from a fingerprint, so two writers of the same key always carry the same
//! bytes and no locking beyond atomic single-key writes is needed.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use lp_core::{CacheKey, Error, Result};
use parking_lot::RwLock;

/// Key/value store of immutable blobs.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
/// The store is passed by handle to every stage; there is no global instance.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Human-readable name identifying this backend.
    fn name(&self) -> &'static str;

    /// Whether an entry exists for `key`.
    async fn exists(&self, key: &CacheKey) -> Result<bool>;

    /// Read the entry for `key`.
    ///
    /// Returns [`Error::NotFound`] if there is no such entry.
    async fn read(&self, key: &CacheKey) -> Result<Bytes>;

    /// Store `data` under `key`.
    ///
    /// Writing a key that already exists succeeds without rewriting it. The
    /// store does not check that the bytes match the existing entry.
    async fn write(&self, key: &CacheKey, data: Bytes) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Filesystem backend
// ---------------------------------------------------------------------------

/// A store keeping one file per key inside a directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader never observes a partially written entry.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::configuration(format!(
                "failed to create cache directory {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// List the keys currently in the store, ignoring stray files.
    pub fn keys(&self) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(key) = CacheKey::parse(name) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl ContentStore for FsStore {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.entry_path(key)).await?)
    }

    async fn read(&self, key: &CacheKey) -> Result<Bytes> {
        match tokio::fs::read(self.entry_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("cache entry", key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &CacheKey, data: Bytes) -> Result<()> {
        let path = self.entry_path(key);
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(key = %key, "cache entry already present");
            return Ok(());
        }

        let root = self.root.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| Error::from(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Internal(format!("cache write task failed: {e}")))??;

        tracing::debug!(key = %key, "cache entry written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// A store held entirely in memory. Used for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// A sorted copy of every entry, for comparing store states.
    pub fn snapshot(&self) -> BTreeMap<CacheKey, Bytes> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    async fn read(&self, key: &CacheKey) -> Result<Bytes> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found("cache entry", key))
    }

    async fn write(&self, key: &CacheKey, data: Bytes) -> Result<()> {
        self.entries.write().entry(key.clone()).or_insert(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lp_core::hash_content;

    fn key(seed: &[u8]) -> CacheKey {
        hash_content(seed).cache_key()
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        let k = key(b"a");
        assert!(!store.exists(&k).await.unwrap());
        store.write(&k, Bytes::from_static(b"payload")).await.unwrap();
        assert!(store.exists(&k).await.unwrap());
        assert_eq!(store.read(&k).await.unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_store_missing_key() {
        let store = MemoryStore::new();
        assert_matches!(store.read(&key(b"x")).await, Err(Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn memory_store_write_is_idempotent() {
        let store = MemoryStore::new();
        let k = key(b"a");
        store.write(&k, Bytes::from_static(b"v")).await.unwrap();
        store.write(&k, Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(&k).await.unwrap(), Bytes::from_static(b"v"));
    }

    #[tokio::test]
    async fn fs_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path().join("cache")).unwrap();
        let k = key(b"a");

        assert!(!store.exists(&k).await.unwrap());
        store.write(&k, Bytes::from_static(b"payload")).await.unwrap();
        assert!(store.exists(&k).await.unwrap());
        assert_eq!(store.read(&k).await.unwrap(), Bytes::from_static(b"payload"));
        assert!(store.root().join(k.as_str()).is_file());
    }

    #[tokio::test]
    async fn fs_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        assert_matches!(store.read(&key(b"x")).await, Err(Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn fs_store_write_twice_keeps_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let k = key(b"a");
        store.write(&k, Bytes::from_static(b"v")).await.unwrap();
        store.write(&k, Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(store.keys().unwrap(), vec![k]);
    }

    #[tokio::test]
    async fn fs_store_keys_ignore_stray_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        let k = key(b"a");
        store.write(&k, Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(store.keys().unwrap(), vec![k]);
    }

    #[tokio::test]
    async fn fs_store_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let k = key(b"a");
        FsStore::open(dir.path())
            .unwrap()
            .write(&k, Bytes::from_static(b"kept"))
            .await
            .unwrap();
        let reopened = FsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read(&k).await.unwrap(), Bytes::from_static(b"kept"));
    }
}
