//! The sharded, content-addressed output tree.
//!
//! Every artifact lands at `<fp[0:2]>/<fp[2:]>` so that no directory holds
//! more than 256 shard subdirectories regardless of corpus size. Top-level
//! documents such as `all-courses.json` sit beside the shards under fixed
//! names.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use lp_core::{Blob, CacheKey, Error, Fingerprint, Result};

use crate::store::ContentStore;

/// Maximum number of distinct shard directories (two hex characters).
pub const MAX_SHARDS: usize = 256;

/// Where the bytes of a placed object come from at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ObjectSource {
    /// A content store entry; read only when the tree is written.
    Stored(CacheKey),
    Inline(Bytes),
}

/// The layout of a build's output, materialized with [`OutputTree::write_to`].
///
/// Artifacts that already sit in the content store are tracked by cache key,
/// so the tree stays small no matter how much audio a corpus holds.
#[derive(Debug, Clone, Default)]
pub struct OutputTree {
    objects: BTreeMap<Fingerprint, ObjectSource>,
    documents: BTreeMap<String, Bytes>,
}

impl OutputTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a blob's bytes under its content fingerprint and return the
    /// fingerprint.
    ///
    /// Placing identical content twice keeps a single object.
    pub fn place(&mut self, blob: &Blob) -> Fingerprint {
        let fp = blob.fingerprint();
        self.objects
            .entry(fp.clone())
            .or_insert_with(|| ObjectSource::Inline(blob.data().clone()));
        fp
    }

    /// Place an object whose bytes are stored under `key` in the content store.
    pub fn place_stored(&mut self, fp: Fingerprint, key: CacheKey) {
        self.objects
            .entry(fp)
            .or_insert(ObjectSource::Stored(key));
    }

    /// Add a top-level document under a fixed name.
    pub fn insert_document(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.documents.insert(name.into(), data.into());
    }

    /// Absorb all objects and documents of `other`.
    pub fn merge(&mut self, other: OutputTree) {
        for (fp, source) in other.objects {
            self.objects.entry(fp).or_insert(source);
        }
        self.documents.extend(other.documents);
    }

    /// Number of content-addressed objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.documents.is_empty()
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.objects.contains_key(fp)
    }

    pub fn document(&self, name: &str) -> Option<&Bytes> {
        self.documents.get(name)
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.objects.keys()
    }

    /// Bytes held in memory by inline objects and documents.
    pub fn resident_bytes(&self) -> u64 {
        let inline: usize = self
            .objects
            .values()
            .map(|source| match source {
                ObjectSource::Inline(data) => data.len(),
                ObjectSource::Stored(_) => 0,
            })
            .sum();
        let documents: usize = self.documents.values().map(Bytes::len).sum();
        (inline + documents) as u64
    }

    /// Bytes of the object `fp`, read from `store` when not held inline.
    pub async fn object(&self, fp: &Fingerprint, store: &dyn ContentStore) -> Result<Option<Bytes>> {
        match self.objects.get(fp) {
            Some(ObjectSource::Inline(data)) => Ok(Some(data.clone())),
            Some(ObjectSource::Stored(key)) => store.read(key).await.map(Some),
            None => Ok(None),
        }
    }

    /// Path of an object relative to the tree root.
    pub fn relative_path(fp: &Fingerprint) -> PathBuf {
        let (shard, rest) = fp.shard();
        Path::new(shard).join(rest)
    }

    /// Number of objects in each shard directory.
    pub fn shard_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for fp in self.objects.keys() {
            *counts.entry(fp.shard().0.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Write every object and document below `dir`.
    ///
    /// Stored objects are copied out of `store` one at a time.
    pub async fn write_to(&self, dir: &Path, store: &dyn ContentStore) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        for shard in self.shard_counts().keys() {
            tokio::fs::create_dir_all(dir.join(shard)).await?;
        }

        for fp in self.objects.keys() {
            let data = self
                .object(fp, store)
                .await?
                .ok_or_else(|| Error::not_found("output object", fp))?;
            tokio::fs::write(dir.join(Self::relative_path(fp)), data).await?;
        }

        for (name, data) in &self.documents {
            tokio::fs::write(dir.join(name), data).await?;
        }

        tracing::info!(
            dir = %dir.display(),
            objects = self.objects.len(),
            shards = self.shard_counts().len(),
            documents = self.documents.len(),
            "output tree written"
        );
        Ok(())
    }
}

/// Make sure `dir` exists and is empty before a build writes into it.
///
/// Output is always a full rebuild: a non-empty directory is removed when
/// `clean` is set and rejected otherwise.
pub async fn prepare_output_dir(dir: &Path, clean: bool) -> Result<()> {
    if tokio::fs::try_exists(dir).await? {
        let mut entries = tokio::fs::read_dir(dir).await?;
        if entries.next_entry().await?.is_some() {
            if !clean {
                return Err(Error::configuration(format!(
                    "output directory {} is not empty (use --clean to replace it)",
                    dir.display()
                )));
            }
            tracing::info!(dir = %dir.display(), "removing previous output");
            tokio::fs::remove_dir_all(dir).await?;
        }
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}
