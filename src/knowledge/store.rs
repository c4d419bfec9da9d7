//! Cache and knowledge store collaborators
//!
//! The knowledge cache talks to two external capabilities: a key-value cache
//! store and a similarity-search store. Both are traits so deployments can
//! swap in Redis / a real vector database without touching the lookup logic.

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Errors from the knowledge store
#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("similarity search failed: {0}")]
    Search(String),
}

/// Key-value cache store (get / set / delete)
///
/// TTL is a property of the store, configured at construction.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: String, value: String);

    async fn delete(&self, key: &str);
}

/// In-process cache store backed by `moka` with TTL and capacity bounds
pub struct MemoryCacheStore {
    cache: Cache<String, String>,
}

impl MemoryCacheStore {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await
    }

    async fn set(&self, key: String, value: String) {
        self.cache.insert(key, value).await;
    }

    async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
    }
}

/// Similarity search over an opaque knowledge corpus
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Returns up to `k` snippets most similar to the query, best first
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<String>, KnowledgeError>;
}

/// Lexical similarity search over an in-memory document list
///
/// Documents are scored with Sørensen–Dice bigram similarity against the
/// query. This stands in for a vector store in tests and small deployments;
/// it implements the same contract without an embedding model.
pub struct LexicalKnowledgeStore {
    documents: Vec<String>,
}

impl LexicalKnowledgeStore {
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }

    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for LexicalKnowledgeStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<String>, KnowledgeError> {
        let mut scored: Vec<(f64, &String)> = self
            .documents
            .iter()
            .map(|doc| (strsim::sorensen_dice(query, doc), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(k).map(|(_, doc)| doc.clone()).collect())
    }
}

/// Scripted knowledge store that counts searches, for tests
pub struct MockKnowledgeStore {
    results: Mutex<Vec<String>>,
    searches: AtomicUsize,
    fail: bool,
}

impl MockKnowledgeStore {
    /// Store returning the given snippets (truncated to `k`) for every query
    pub fn returning(results: Vec<&str>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().map(String::from).collect()),
            searches: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Store that fails every search
    pub fn failing() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            searches: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeStore for MockKnowledgeStore {
    async fn similarity_search(&self, _query: &str, k: usize) -> Result<Vec<String>, KnowledgeError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(KnowledgeError::Search("mock store failure".into()));
        }
        let results = self.results.lock().unwrap();
        Ok(results.iter().take(k).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let store = MemoryCacheStore::new(Duration::from_secs(60), 100);
        assert_eq!(store.get("k").await, None);

        store.set("k".into(), "v".into()).await;
        assert_eq!(store.get("k").await, Some("v".to_string()));

        store.delete("k").await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_lexical_search_ranks_by_similarity() {
        let store = LexicalKnowledgeStore::new(vec![
            "sodium intake raises blood pressure".to_string(),
            "vitamin c supports immunity".to_string(),
            "sodium rich foods include cured meat".to_string(),
        ]);

        let results = store
            .similarity_search("sodium intake and blood pressure", 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].contains("sodium"));
    }

    #[tokio::test]
    async fn test_lexical_search_empty_corpus() {
        let store = LexicalKnowledgeStore::empty();
        let results = store.similarity_search("anything", 2).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_mock_store_counts_searches() {
        let store = MockKnowledgeStore::returning(vec!["a", "b", "c"]);
        let results = store.similarity_search("q", 2).await.unwrap();
        assert_eq!(results, vec!["a", "b"]);
        assert_eq!(store.search_count(), 1);
    }
}
