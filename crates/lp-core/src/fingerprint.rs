//! Content and call fingerprints.
//!
//! A [`Fingerprint`] is the lowercase hex SHA-256 digest of either a byte
//! buffer ([`hash_content`]) or a memoized call ([`hash_call`]). Cache keys and
//! output object names are both derived from fingerprints, so equal inputs must
//! always produce equal fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Error, Result};

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 64;

/// Number of leading hex characters used as the output shard directory.
pub const SHARD_PREFIX_LEN: usize = 2;

/// Prefix prepended to a fingerprint to form a cache key.
pub const CACHE_KEY_PREFIX: &str = "cache-";

/// A SHA-256 digest in lowercase hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse a fingerprint, accepting only 64 lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self> {
        let valid = s.len() == FINGERPRINT_LEN
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid {
            return Err(Error::Internal(format!("malformed fingerprint: {s:?}")));
        }
        Ok(Self(s.to_string()))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the shard directory name and the object name inside it.
    pub fn shard(&self) -> (&str, &str) {
        self.0.split_at(SHARD_PREFIX_LEN)
    }

    /// The Content Store key under which a memoized call result is cached.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey(format!("{CACHE_KEY_PREFIX}{}", self.0))
    }

    fn from_digest(digest: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(digest))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

/// Key of a cache entry in the Content Store: `"cache-" + fingerprint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Parse a key of the form `cache-<fingerprint>`.
    pub fn parse(s: &str) -> Result<Self> {
        let fp = s
            .strip_prefix(CACHE_KEY_PREFIX)
            .ok_or_else(|| Error::Internal(format!("not a cache key: {s:?}")))?;
        Ok(Fingerprint::parse(fp)?.cache_key())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest a whole byte buffer.
pub fn hash_content(data: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Fingerprint::from_digest(hasher.finalize())
}

/// Digest a memoized call: the stage name followed by the fingerprints of its
/// arguments, in declared parameter order.
///
/// Each field is written as a big-endian `u64` length followed by its bytes, so
/// no two distinct `(name, args)` lists share an encoding. Arguments are
/// fingerprints, never raw payloads; callers hash large inputs first.
pub fn hash_call(stage: &str, args: &[&Fingerprint]) -> Fingerprint {
    let mut hasher = Sha256::new();
    write_field(&mut hasher, stage.as_bytes());
    for arg in args {
        write_field(&mut hasher, arg.as_str().as_bytes());
    }
    Fingerprint::from_digest(hasher.finalize())
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(hash_content(b"same data"), hash_content(b"same data"));
    }

    #[test]
    fn content_hash_detects_single_byte_change() {
        assert_ne!(hash_content(b"track-0001"), hash_content(b"track-0002"));
    }

    #[test]
    fn content_hash_known_vector() {
        assert_eq!(
            hash_content(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn call_hash_depends_on_stage_name() {
        let input = hash_content(b"audio");
        assert_ne!(
            hash_call("remux", &[&input]),
            hash_call("lowQualityTrack", &[&input])
        );
    }

    #[test]
    fn call_hash_argument_order_matters() {
        let a = hash_content(b"a");
        let b = hash_content(b"b");
        assert_ne!(hash_call("join", &[&a, &b]), hash_call("join", &[&b, &a]));
        assert_eq!(hash_call("join", &[&a, &b]), hash_call("join", &[&a, &b]));
    }

    #[test]
    fn call_hash_fields_do_not_run_together() {
        let a = hash_content(b"a");
        assert_ne!(hash_call("remux", &[&a]), hash_call("remu", &[&a]));
        assert_ne!(hash_call("remux", &[]), hash_call("remux", &[&a]));
    }

    #[test]
    fn shard_split() {
        let fp = hash_content(b"x");
        let (prefix, rest) = fp.shard();
        assert_eq!(prefix.len(), 2);
        assert_eq!(rest.len(), FINGERPRINT_LEN - 2);
        assert_eq!(format!("{prefix}{rest}"), fp.as_str());
    }

    #[test]
    fn cache_key_roundtrip() {
        let fp = hash_content(b"x");
        let key = fp.cache_key();
        assert!(key.as_str().starts_with("cache-"));
        assert_eq!(CacheKey::parse(key.as_str()).unwrap(), key);
        assert!(CacheKey::parse(fp.as_str()).is_err());
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Fingerprint::parse("abc").is_err());
        assert!(Fingerprint::parse(&"G".repeat(64)).is_err());
        assert!(Fingerprint::parse(&"A".repeat(64)).is_err());
        assert!(Fingerprint::parse(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn serde_validates() {
        let fp = hash_content(b"x");
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
        assert!(serde_json::from_str::<Fingerprint>("\"nope\"").is_err());
    }
}
