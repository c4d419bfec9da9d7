//! Cache-aside knowledge lookup
//!
//! Lookups are keyed by a canonical serialization of the ordered query parts.
//! On a hit the stored snippet list is decoded and returned; on a miss each
//! part is run through a top-k similarity search, the concatenated results
//! are written back under the key, and returned.
//!
//! Concurrent misses for the same key may both search and both write; the
//! last writer wins. The cache is advisory, so the stale window is accepted
//! rather than paying for a single-flight lock.

use super::store::{CacheStore, KnowledgeError, KnowledgeStore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default snippets fetched per query part
pub const DEFAULT_TOP_K: usize = 2;

/// Cache-aside lookup over a similarity-search store
pub struct KnowledgeCache {
    store: Arc<dyn CacheStore>,
    knowledge: Arc<dyn KnowledgeStore>,
    top_k: usize,
}

impl KnowledgeCache {
    pub fn new(store: Arc<dyn CacheStore>, knowledge: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            store,
            knowledge,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Looks up knowledge snippets for the ordered query parts
    ///
    /// An empty result is a valid outcome and is cached like any other.
    pub async fn lookup(&self, query_parts: &[String]) -> Result<Vec<String>, KnowledgeError> {
        let key = cache_key(query_parts);

        if let Some(cached) = self.store.get(&key).await {
            match serde_json::from_str::<Vec<String>>(&cached) {
                Ok(snippets) => {
                    debug!(key = %key, snippets = snippets.len(), "knowledge cache hit");
                    return Ok(snippets);
                }
                Err(e) => {
                    // Treat a corrupt entry as a miss and overwrite it below.
                    warn!(key = %key, error = %e, "discarding corrupt cache entry");
                }
            }
        }

        let mut snippets = Vec::new();
        for part in query_parts {
            let results = self.knowledge.similarity_search(part, self.top_k).await?;
            snippets.extend(results);
        }

        let encoded = serde_json::to_string(&snippets)
            .map_err(|e| KnowledgeError::Search(format!("failed to encode snippets: {}", e)))?;
        self.store.set(key.clone(), encoded).await;

        debug!(
            key = %key,
            parts = query_parts.len(),
            snippets = snippets.len(),
            "knowledge cache populated"
        );
        Ok(snippets)
    }
}

/// Canonical cache key for an ordered sequence of query parts
///
/// The parts are serialized as a JSON array (stable for a given order) and
/// fingerprinted so the key stays bounded regardless of query length.
pub fn cache_key(query_parts: &[String]) -> String {
    let canonical = serde_json::to_string(query_parts).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("knowledge:{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::store::{MemoryCacheStore, MockKnowledgeStore};
    use std::time::Duration;

    fn parts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn cache_with(knowledge: Arc<MockKnowledgeStore>) -> KnowledgeCache {
        let store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
        KnowledgeCache::new(store, knowledge)
    }

    #[test]
    fn test_cache_key_deterministic() {
        let a = cache_key(&parts(&["q1", "q2"]));
        let b = cache_key(&parts(&["q1", "q2"]));
        assert_eq!(a, b);
        assert!(a.starts_with("knowledge:"));
    }

    #[test]
    fn test_cache_key_order_sensitive() {
        let a = cache_key(&parts(&["q1", "q2"]));
        let b = cache_key(&parts(&["q2", "q1"]));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_miss_searches_each_part_then_hits() {
        let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["s1", "s2"]));
        let cache = cache_with(knowledge.clone());
        let query = parts(&["q1", "q2"]);

        let cold = cache.lookup(&query).await.unwrap();
        assert_eq!(cold, vec!["s1", "s2", "s1", "s2"]);
        assert_eq!(knowledge.search_count(), 2);

        let warm = cache.lookup(&query).await.unwrap();
        assert_eq!(warm, cold);
        assert_eq!(knowledge.search_count(), 2, "hit must not search again");
    }

    #[tokio::test]
    async fn test_empty_result_is_cached() {
        let knowledge = Arc::new(MockKnowledgeStore::returning(vec![]));
        let cache = cache_with(knowledge.clone());
        let query = parts(&["nothing here"]);

        let first = cache.lookup(&query).await.unwrap();
        assert!(first.is_empty());
        assert_eq!(knowledge.search_count(), 1);

        let second = cache.lookup(&query).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(knowledge.search_count(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let knowledge = Arc::new(MockKnowledgeStore::failing());
        let cache = cache_with(knowledge);

        let result = cache.lookup(&parts(&["q1"])).await;
        assert!(matches!(result, Err(KnowledgeError::Search(_))));
    }

    #[tokio::test]
    async fn test_corrupt_entry_treated_as_miss() {
        let store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
        let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["fresh"]));
        let cache = KnowledgeCache::new(store.clone(), knowledge.clone());
        let query = parts(&["q1"]);

        store
            .set(cache_key(&query), "not json".to_string())
            .await;

        let result = cache.lookup(&query).await.unwrap();
        assert_eq!(result, vec!["fresh"]);
        assert_eq!(knowledge.search_count(), 1);
    }
}
