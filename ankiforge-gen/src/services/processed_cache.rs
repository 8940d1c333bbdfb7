//! Persisted record of words that already have cards
//!
//! Stored as a JSON object keyed by normalized word (trimmed, lowercase).
//! The file is rewritten in full after every completed word.

use crate::utils::write_atomic;
use ankiforge_common::time::now_local_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Completion metadata for one word
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Local RFC 3339 time the word completed
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub card_ids: Vec<i64>,
}

#[derive(Debug)]
pub struct ProcessedCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl ProcessedCache {
    /// Load the cache at `path`
    ///
    /// A missing file is an empty cache. So is a file that cannot be read or
    /// is not a JSON object; it is overwritten on the next save. An entry of
    /// the wrong shape still marks its word as processed, with empty metadata.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, Value>>(&text) {
                Ok(raw) => Self::parse_entries(&path, raw),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Cache file is corrupt, starting with an empty cache"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cache file unreadable, starting with an empty cache"
                );
                BTreeMap::new()
            }
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Cache loaded");
        Self { path, entries }
    }

    fn parse_entries(path: &Path, raw: BTreeMap<String, Value>) -> BTreeMap<String, CacheEntry> {
        raw.into_iter()
            .map(|(word, value)| {
                let entry = serde_json::from_value::<CacheEntry>(value).unwrap_or_else(|e| {
                    tracing::warn!(
                        path = %path.display(),
                        word = %word,
                        error = %e,
                        "Malformed cache entry, keeping word with empty metadata"
                    );
                    CacheEntry::default()
                });
                (word, entry)
            })
            .collect()
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Discard every entry and persist the empty cache
    pub fn reset(path: impl Into<PathBuf>) -> ankiforge_common::Result<Self> {
        let cache = Self::empty(path);
        cache.save()?;
        tracing::info!(path = %cache.path.display(), "Cache reset");
        Ok(cache)
    }

    pub fn normalize(word: &str) -> String {
        word.trim().to_lowercase()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(&Self::normalize(word))
    }

    pub fn get(&self, word: &str) -> Option<&CacheEntry> {
        self.entries.get(&Self::normalize(word))
    }

    /// Mark `word` as done with the given note ids (in memory only)
    pub fn record(&mut self, word: &str, card_ids: Vec<i64>) {
        self.entries.insert(
            Self::normalize(word),
            CacheEntry {
                timestamp: now_local_rfc3339(),
                card_ids,
            },
        );
    }

    /// Drop the entry for `word`, returning it if present
    pub fn remove(&mut self, word: &str) -> Option<CacheEntry> {
        self.entries.remove(&Self::normalize(word))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the cache as pretty-printed JSON
    pub fn save(&self) -> ankiforge_common::Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}
