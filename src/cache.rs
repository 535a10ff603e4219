//! Read cache for incremental builds.
//!
//! Parsing every source document on every run is the avoidable cost of a
//! rebuild loop. This module caches reader output keyed by source path, with
//! per-key staleness detection against the source file, so repeated runs only
//! re-read documents that actually changed.
//!
//! # Design
//!
//! Two layers:
//!
//! - [`CacheStore`] — a plain key→value map with policy-gated writes and a
//!   persist/load cycle to one JSON file per cache namespace.
//! - [`FileStampCacheStore`] — wraps each value in a [`Stamp`] of its source
//!   file (modification time or SHA-256 content digest). A lookup recomputes
//!   the stamp and misses when it differs from the stored one.
//!
//! ## Stamps
//!
//! The stamp method is configured by name (`cache.method` in `site.toml`):
//!
//! - `"mtime"` — modification time, cheap, reset by `git checkout`
//! - `"sha256"` — content digest, survives checkout, reads the whole file
//!
//! An unrecognized name logs one warning and reports every stamp as
//! [`Stamp::Invalid`], which compares unequal to everything including itself,
//! so every lookup misses. A stamp that cannot be computed (missing file,
//! permission denied) also degrades to `Invalid` — stamp failures never
//! propagate.
//!
//! ## Failure policy
//!
//! A caching layer must never fail a build. `persist()` logs a warning and
//! returns on any I/O error; `load()` treats a missing file as a first run
//! (debug log, empty cache) and corrupt or incompatible data as disposable
//! (warning, empty cache). There is no version field — unreadable files
//! degrade to an empty cache, never a crash.
//!
//! ## Storage
//!
//! One file per namespace under the configured cache directory, named by a
//! truncated SHA-256 of the namespace string so reader identities of any
//! shape map to safe filenames. Persisting writes to a `.tmp` sibling and
//! renames it into place, so a concurrent reader never observes a torn file.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::CacheConfig;

/// Resolve the cache file path for a namespace.
///
/// The namespace is a reader/generator identity string; its truncated
/// SHA-256 becomes the filename, keeping arbitrary identity strings out of
/// the filesystem.
pub fn cache_file(cache_dir: &Path, namespace: &str) -> PathBuf {
    let digest = Sha256::digest(namespace.as_bytes());
    let short: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    cache_dir.join(format!("{short}.json"))
}

/// Generic, optionally-persisted key→value cache.
///
/// Writes are gated by the `enabled` policy flag; loads by the `load` flag.
/// Keys are source paths relative to the content root.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, V>,
    path: PathBuf,
    store_enabled: bool,
}

impl<V> CacheStore<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open the cache for a namespace, loading the persisted file when the
    /// load policy allows it.
    pub fn open(cache_dir: &Path, namespace: &str, config: &CacheConfig) -> Self {
        let path = cache_file(cache_dir, namespace);
        let entries = if config.load {
            load_entries(&path)
        } else {
            HashMap::new()
        };
        Self {
            entries,
            path,
            store_enabled: config.enabled,
        }
    }

    /// Store a value. No-op when the caching policy is disabled.
    pub fn put(&mut self, key: &str, value: V) {
        if self.store_enabled {
            self.entries.insert(key.to_string(), value);
        }
    }

    /// Look up a stored value. Callers supply their own fallback via
    /// `Option` combinators.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Serialize the whole map to the namespace file.
    ///
    /// Any I/O failure logs a warning and returns; a caching failure must
    /// never abort a build. The write goes to a `.tmp` sibling first and is
    /// renamed into place.
    pub fn persist(&self) {
        if !self.store_enabled {
            return;
        }
        if let Err(err) = self.try_persist() {
            warn!(path = %self.path.display(), %err, "could not persist cache");
        }
    }

    fn try_persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deserialize a cache file, degrading to an empty map on any problem.
fn load_entries<V: DeserializeOwned>(path: &Path) -> HashMap<String, V> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // Expected on the first run
            debug!(path = %path.display(), "no cache file yet");
            return HashMap::new();
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read cache file");
            return HashMap::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %path.display(), %err, "discarding corrupt cache file");
            HashMap::new()
        }
    }
}

// ============================================================================
// Staleness stamps
// ============================================================================

/// A cheap fingerprint of a source file used to decide whether cached data
/// for it is still valid.
///
/// `Invalid` compares unequal to everything, itself included, so a stamp
/// that couldn't be computed (or a disabled stamp method) turns every lookup
/// into a miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stamp {
    Mtime { secs: u64, nanos: u32 },
    Digest(String),
    Invalid,
}

impl PartialEq for Stamp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Stamp::Mtime { secs: a, nanos: b },
                Stamp::Mtime { secs: c, nanos: d },
            ) => a == c && b == d,
            (Stamp::Digest(a), Stamp::Digest(b)) => a == b,
            _ => false,
        }
    }
}

/// How to compute staleness stamps for cached files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampMethod {
    Mtime,
    Sha256,
    /// Unrecognized method name: staleness checking disabled, every stamp
    /// is [`Stamp::Invalid`].
    Disabled,
}

impl StampMethod {
    /// Resolve a configured method name. Unrecognized names disable
    /// staleness checking with a warning rather than failing startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "mtime" => StampMethod::Mtime,
            "sha256" => StampMethod::Sha256,
            other => {
                warn!(
                    method = other,
                    "unknown cache method, staleness checking disabled"
                );
                StampMethod::Disabled
            }
        }
    }

    /// Compute the stamp for a file. I/O failures degrade to
    /// [`Stamp::Invalid`], never an error.
    pub fn stamp(&self, path: &Path) -> Stamp {
        match self.try_stamp(path) {
            Ok(stamp) => stamp,
            Err(err) => {
                debug!(path = %path.display(), %err, "could not stamp file");
                Stamp::Invalid
            }
        }
    }

    fn try_stamp(&self, path: &Path) -> io::Result<Stamp> {
        match self {
            StampMethod::Mtime => {
                let mtime = std::fs::metadata(path)?.modified()?;
                let since = mtime
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| io::Error::other(e.to_string()))?;
                Ok(Stamp::Mtime {
                    secs: since.as_secs(),
                    nanos: since.subsec_nanos(),
                })
            }
            StampMethod::Sha256 => {
                let bytes = std::fs::read(path)?;
                let digest = Sha256::digest(&bytes);
                Ok(Stamp::Digest(format!("{digest:x}")))
            }
            StampMethod::Disabled => Ok(Stamp::Invalid),
        }
    }
}

/// A cached payload plus the stamp of its source file at store time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stamped<V> {
    pub stamp: Stamp,
    pub payload: V,
}

/// [`CacheStore`] with per-key staleness detection.
///
/// Keys are source paths relative to `content_root`. `put` records the
/// file's current stamp alongside the payload; `get` recomputes the stamp
/// and misses when it differs.
#[derive(Debug)]
pub struct FileStampCacheStore<V> {
    inner: CacheStore<Stamped<V>>,
    method: StampMethod,
    content_root: PathBuf,
}

impl<V> FileStampCacheStore<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn open(
        cache_dir: &Path,
        namespace: &str,
        content_root: &Path,
        config: &CacheConfig,
    ) -> Self {
        Self {
            inner: CacheStore::open(cache_dir, namespace, config),
            method: StampMethod::from_name(&config.method),
            content_root: content_root.to_path_buf(),
        }
    }

    /// Store a payload stamped with the source file's current fingerprint.
    pub fn put(&mut self, key: &str, payload: V) {
        let stamp = self.method.stamp(&self.content_root.join(key));
        self.inner.put(key, Stamped { stamp, payload });
    }

    /// Look up a payload, recomputing the source file's stamp. A changed
    /// stamp, an unreadable file, or a disabled stamp method all miss.
    pub fn get(&self, key: &str) -> Option<&V> {
        let stored = self.inner.get(key)?;
        let current = self.method.stamp(&self.content_root.join(key));
        if current == stored.stamp {
            Some(&stored.payload)
        } else {
            None
        }
    }

    pub fn persist(&self) {
        self.inner.persist();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }

    pub fn merge(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} read ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} read", self.misses)
        }
    }
}
