//! In-process cache of generated summaries keyed by document name.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::types::{SummaryVariant, is_error_sentinel};

/// Summary text remembered for a document, tied to the content it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSummary {
    /// Digest of the PDF bytes the summary describes.
    pub digest: String,
    /// Summary text.
    pub text: String,
}

/// Document → variant → summary map with explicit invalidation.
///
/// A lookup with a different digest drops every variant of the document, so re-uploaded
/// documents never serve a stale summary. Failed summaries are refused.
#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: Mutex<HashMap<String, HashMap<SummaryVariant, CachedSummary>>>,
}

impl SummaryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the summary cached for `variant` when it was built from `digest`.
    pub fn get(&self, name: &str, digest: &str, variant: SummaryVariant) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let variants = entries.get(name)?;
        if variants.values().any(|entry| entry.digest != digest) {
            tracing::debug!(document = name, "Dropping cached summaries for changed content");
            entries.remove(name);
            return None;
        }
        variants.get(&variant).map(|entry| entry.text.clone())
    }

    /// Remember a summary. Returns `false` (and stores nothing) for error sentinels.
    pub fn insert(&self, name: &str, digest: &str, variant: SummaryVariant, text: &str) -> bool {
        if is_error_sentinel(text) {
            return false;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let variants = entries.entry(name.to_string()).or_default();
        variants.retain(|_, entry| entry.digest == digest);
        variants.insert(
            variant,
            CachedSummary {
                digest: digest.to_string(),
                text: text.to_string(),
            },
        );
        true
    }

    /// Forget every summary for `name`. Returns whether an entry existed.
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached summaries across all documents and variants.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(HashMap::len)
            .sum()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkMode;
    use crate::processing::types::ERROR_SENTINEL;

    fn variant(mode: ChunkMode, sentences: usize) -> SummaryVariant {
        SummaryVariant { mode, sentences }
    }

    const FULL: SummaryVariant = SummaryVariant {
        mode: ChunkMode::Full,
        sentences: 5,
    };

    #[test]
    fn returns_entry_for_matching_digest() {
        let cache = SummaryCache::new();
        assert!(cache.insert("a.pdf", "d1", FULL, "Summary"));
        assert_eq!(cache.get("a.pdf", "d1", FULL).as_deref(), Some("Summary"));
    }

    #[test]
    fn variants_are_cached_separately() {
        let cache = SummaryCache::new();
        cache.insert("a.pdf", "d1", FULL, "Whole");
        assert!(cache.get("a.pdf", "d1", variant(ChunkMode::PerPage, 5)).is_none());
        assert!(cache.get("a.pdf", "d1", variant(ChunkMode::Full, 2)).is_none());

        cache.insert("a.pdf", "d1", variant(ChunkMode::PerPage, 5), "Page 1:\nA");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a.pdf", "d1", FULL).as_deref(), Some("Whole"));
    }

    #[test]
    fn changed_digest_evicts_every_variant() {
        let cache = SummaryCache::new();
        cache.insert("a.pdf", "d1", FULL, "Summary");
        cache.insert("a.pdf", "d1", variant(ChunkMode::Semantic, 3), "Part 1:\nS");
        assert!(cache.get("a.pdf", "d2", FULL).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn refuses_error_sentinels() {
        let cache = SummaryCache::new();
        let failed = format!("{ERROR_SENTINEL} Summary failed: boom");
        assert!(!cache.insert("a.pdf", "d1", FULL, &failed));
        assert!(cache.get("a.pdf", "d1", FULL).is_none());
    }

    #[test]
    fn invalidate_and_clear_remove_entries() {
        let cache = SummaryCache::new();
        cache.insert("a.pdf", "d1", FULL, "A");
        cache.insert("b.pdf", "d2", FULL, "B");
        assert!(cache.invalidate("a.pdf"));
        assert!(!cache.invalidate("a.pdf"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
