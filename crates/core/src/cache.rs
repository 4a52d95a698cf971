use crate::extractor::ExtractOptions;
use crate::models::ExtractedText;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Content-addressed key: a change to either the document bytes or any
/// extraction limit yields a different key.
pub fn cache_key(data: &[u8], options: &ExtractOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    update_limit(&mut hasher, options.max_pages);
    update_limit(&mut hasher, options.max_chars);
    update_limit(&mut hasher, options.fallback_max_pages);
    update_limit(&mut hasher, options.fallback_max_chars);
    format!("{:x}", hasher.finalize())
}

fn update_limit(hasher: &mut Sha256, limit: Option<usize>) {
    match limit {
        Some(value) => {
            hasher.update([1u8]);
            hasher.update((value as u64).to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
}

struct CacheEntry {
    extracted: ExtractedText,
    stored_at: DateTime<Utc>,
}

/// Memoizes extraction results across analysis kinds for the same document
/// and limits. Entries are immutable once written; `put` replaces, never
/// updates in place. Expired entries are dropped on insert and treated as
/// absent on lookup.
pub struct ExtractionCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ExtractionCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or(Duration::MAX);
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<ExtractedText> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.extracted.clone())
    }

    pub fn put(&self, key: String, extracted: ExtractedText) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Utc::now();
        entries.retain(|_, entry| now.signed_duration_since(entry.stored_at) < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                extracted,
                stored_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        Utc::now().signed_duration_since(entry.stored_at) < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReaderKind;
    use std::time::Duration as StdDuration;

    fn extracted(text: &str) -> ExtractedText {
        ExtractedText {
            text: text.to_string(),
            reader: ReaderKind::Primary,
            pages_consulted: 1,
            truncated: false,
        }
    }

    #[test]
    fn hit_returns_the_stored_extraction() {
        let cache = ExtractionCache::new(StdDuration::from_secs(60));
        let key = cache_key(b"report bytes", &ExtractOptions::default());

        cache.put(key.clone(), extracted("full text"));

        let hit = cache.get(&key).expect("entry should be fresh");
        assert_eq!(hit.text, "full text");
    }

    #[test]
    fn different_limits_produce_different_keys() {
        let unbounded = ExtractOptions::default();
        let capped = ExtractOptions {
            max_pages: Some(10),
            ..ExtractOptions::default()
        };

        assert_ne!(cache_key(b"same bytes", &unbounded), cache_key(b"same bytes", &capped));
    }

    #[test]
    fn different_documents_produce_different_keys() {
        let options = ExtractOptions::default();
        assert_ne!(cache_key(b"report a", &options), cache_key(b"report b", &options));
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = ExtractionCache::new(StdDuration::ZERO);
        let key = cache_key(b"bytes", &ExtractOptions::default());

        cache.put(key.clone(), extracted("stale"));

        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn put_replaces_an_existing_entry() {
        let cache = ExtractionCache::new(StdDuration::from_secs(60));
        let key = cache_key(b"bytes", &ExtractOptions::default());

        cache.put(key.clone(), extracted("first"));
        cache.put(key.clone(), extracted("second"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap().text, "second");
    }

    #[test]
    fn insert_purges_expired_entries() {
        let cache = ExtractionCache::new(StdDuration::ZERO);

        cache.put("a".to_string(), extracted("one"));
        cache.put("b".to_string(), extracted("two"));

        // The first entry expired immediately and is dropped by the second
        // insert; only the newest entry remains stored.
        assert_eq!(cache.len(), 1);
    }
}
