//! The immutable byte buffer that flows between pipeline stages.

use std::sync::OnceLock;

use bytes::Bytes;

use crate::fingerprint::{hash_content, Fingerprint};

/// A named, immutable blob of bytes.
///
/// The name is a file name (e.g. `3.mp4`). It tells external tools which
/// container format to expect and drives MIME lookup, but it never takes part
/// in the blob's fingerprint: relabelling a blob leaves its identity unchanged.
///
/// The fingerprint is computed on first use and shared by clones and
/// relabelled copies.
#[derive(Debug, Clone)]
pub struct Blob {
    name: String,
    data: Bytes,
    fingerprint: OnceLock<Fingerprint>,
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data == other.data
    }
}

impl Eq for Blob {}

impl Blob {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            fingerprint: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The file extension of the name, if any.
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
    }

    /// The same bytes under a different name. The data is shared, not copied.
    #[must_use]
    pub fn relabel(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: self.data.clone(),
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Content fingerprint of the bytes, hashed at most once.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
            .get_or_init(|| hash_content(&self.data))
            .clone()
    }

    /// Whether the fingerprint has already been computed.
    pub fn is_hashed(&self) -> bool {
        self.fingerprint.get().is_some()
    }
}
