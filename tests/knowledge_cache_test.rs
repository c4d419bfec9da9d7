//! Integration tests for the cache-aside knowledge lookup

use mealscope::knowledge::{
    CacheStore, KnowledgeCache, LexicalKnowledgeStore, MemoryCacheStore, MockKnowledgeStore,
};
use std::sync::Arc;
use std::time::Duration;

fn parts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_cold_lookup_searches_each_part_and_caches() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["snippet a", "snippet b"]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = KnowledgeCache::new(cache_store, knowledge.clone());

    let query = parts(&["q1", "q2"]);

    // Cold: one similarity search per part.
    let cold = cache.lookup(&query).await.unwrap();
    assert_eq!(knowledge.search_count(), 2);
    assert_eq!(cold.len(), 4, "top-2 per part, concatenated, no dedup");

    // Warm: same bytes back, zero additional searches.
    let warm = cache.lookup(&query).await.unwrap();
    assert_eq!(warm, cold);
    assert_eq!(knowledge.search_count(), 2);
}

#[tokio::test]
async fn test_repeated_hits_are_byte_identical() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["only snippet"]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = KnowledgeCache::new(cache_store, knowledge);

    let query = parts(&["protein intake"]);
    let first = cache.lookup(&query).await.unwrap();
    for _ in 0..5 {
        assert_eq!(cache.lookup(&query).await.unwrap(), first);
    }
}

#[tokio::test]
async fn test_distinct_queries_use_distinct_entries() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["snippet"]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = KnowledgeCache::new(cache_store, knowledge.clone());

    cache.lookup(&parts(&["q1"])).await.unwrap();
    cache.lookup(&parts(&["q2"])).await.unwrap();

    // Both were misses: distinct keys never share an entry.
    assert_eq!(knowledge.search_count(), 2);
}

#[tokio::test]
async fn test_zero_results_cached_as_valid_outcome() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec![]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = KnowledgeCache::new(cache_store, knowledge.clone());

    let query = parts(&["unknown food"]);
    assert!(cache.lookup(&query).await.unwrap().is_empty());
    assert!(cache.lookup(&query).await.unwrap().is_empty());
    assert_eq!(knowledge.search_count(), 1);
}

#[tokio::test]
async fn test_ttl_expiry_triggers_fresh_search() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["snippet"]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_millis(100), 100));
    let cache = KnowledgeCache::new(cache_store, knowledge.clone());

    let query = parts(&["q1"]);
    cache.lookup(&query).await.unwrap();
    assert_eq!(knowledge.search_count(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;

    cache.lookup(&query).await.unwrap();
    assert_eq!(knowledge.search_count(), 2, "expired entry must re-search");
}

#[tokio::test]
async fn test_concurrent_same_key_misses_settle_last_write_wins() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["snippet"]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = Arc::new(KnowledgeCache::new(cache_store.clone(), knowledge));

    let query = parts(&["q1"]);
    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = cache.clone();
        let query = query.clone();
        handles.push(tokio::spawn(async move { cache.lookup(&query).await }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result, vec!["snippet"]);
    }

    // Whatever interleaving happened, the settled entry serves hits.
    let settled = cache.lookup(&query).await.unwrap();
    assert_eq!(settled, vec!["snippet"]);
}

#[tokio::test]
async fn test_lookup_over_lexical_store_end_to_end() {
    let store = Arc::new(LexicalKnowledgeStore::new(vec![
        "sodium intake raises blood pressure in hypertensive patients".to_string(),
        "dietary fiber supports digestion and satiety".to_string(),
        "vitamin c is abundant in citrus fruit".to_string(),
    ]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = KnowledgeCache::new(cache_store, store).with_top_k(1);

    let results = cache
        .lookup(&parts(&["sodium and blood pressure"]))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].contains("sodium"));
}

#[tokio::test]
async fn test_delete_forces_repopulation() {
    let knowledge = Arc::new(MockKnowledgeStore::returning(vec!["snippet"]));
    let cache_store = Arc::new(MemoryCacheStore::new(Duration::from_secs(60), 100));
    let cache = KnowledgeCache::new(cache_store.clone(), knowledge.clone());

    let query = parts(&["q1"]);
    cache.lookup(&query).await.unwrap();

    cache_store
        .delete(&mealscope::knowledge::cache_key(&query))
        .await;

    cache.lookup(&query).await.unwrap();
    assert_eq!(knowledge.search_count(), 2);
}
