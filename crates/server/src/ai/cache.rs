use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use petmate_core::{AnalysisResult, Species, normalize};

/// In-memory cache of validated AI results, keyed by species and
/// normalized symptom text. Entries expire after `ttl`.
pub struct InsightCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, (Instant, AnalysisResult)>>,
}

impl InsightCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn key(species: Species, symptoms: &str) -> String {
        format!("{species}:{}", normalize(symptoms))
    }

    pub fn get(&self, key: &str) -> Option<AnalysisResult> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((stored_at, result)) if stored_at.elapsed() < self.ttl => {
                return Some(result.clone());
            }
            Some(_) => {}
            None => return None,
        }
        entries.pop(key);
        None
    }

    pub fn insert(&self, key: String, result: AnalysisResult) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(key, (Instant::now(), result));
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
