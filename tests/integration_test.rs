//! Integration tests for vercache

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use vercache::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: u64,
    owner: String,
}

impl FieldSource for Widget {
    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.to_string()),
            "owner" => Some(self.owner.clone()),
            _ => None,
        }
    }
}

fn widgets_manager() -> (CacheManager<InMemoryStore>, VersionedCache<InMemoryStore>) {
    let cache = VersionedCache::new(InMemoryStore::new());
    let manager = CacheManager::new(
        cache.clone(),
        EntityKeys::new("widgets")
            .with_key_fields(["id"])
            .with_partition("owner"),
    )
    .unwrap();
    (manager, cache)
}

#[tokio::test]
async fn test_save_invalidates_item_partition_and_all() {
    let (manager, _cache) = widgets_manager();
    let widget = Widget {
        id: 1,
        owner: "a".to_string(),
    };

    let lookups = AtomicUsize::new(0);
    let fetch = |w: Widget| {
        let lookups = &lookups;
        move || {
            lookups.fetch_add(1, Ordering::SeqCst);
            async move { Ok(w) }
        }
    };

    // first lookup populates the cache
    let item: Widget = manager
        .get(&[("id", "1")], fetch(widget.clone()))
        .await
        .unwrap();
    assert_eq!(item, widget);
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    // second lookup is served from the cache
    let _: Widget = manager
        .get(&[("id", "1")], fetch(widget.clone()))
        .await
        .unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    // the instance was saved: the host invalidates with its current values
    manager.invalidate(&widget).await.unwrap();

    // same key string, new version suffix: the producer runs again
    let (item, refreshed): (Widget, bool) = manager
        .getf(&[("id", "1")], fetch(widget.clone()))
        .await
        .unwrap();
    assert_eq!(item, widget);
    assert!(refreshed);
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalidate_refreshes_partition_and_all_lists() {
    let (manager, _cache) = widgets_manager();
    let widget = Widget {
        id: 1,
        owner: "a".to_string(),
    };

    let (_, refreshed) = manager
        .partitionf("owner", "a", || async { Ok(vec![widget.clone()]) })
        .await
        .unwrap();
    assert!(refreshed);

    let (_, refreshed) = manager
        .allf(|| async { Ok(vec![widget.clone()]) })
        .await
        .unwrap();
    assert!(refreshed);

    manager.invalidate(&widget).await.unwrap();

    let (_, refreshed): (Vec<Widget>, bool) = manager
        .partitionf("owner", "a", || async { Ok(vec![]) })
        .await
        .unwrap();
    assert!(refreshed, "partition list should miss after invalidation");

    let (_, refreshed): (Vec<Widget>, bool) =
        manager.allf(|| async { Ok(vec![]) }).await.unwrap();
    assert!(refreshed, "all list should miss after invalidation");
}

#[tokio::test]
async fn test_bumping_one_slot_leaves_others_cached() {
    let (manager, cache) = widgets_manager();
    let widget = Widget {
        id: 1,
        owner: "a".to_string(),
    };

    let all: Vec<Widget> = manager
        .all(|| async { Ok(vec![widget.clone()]) })
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    // bump only the id-keyed slot, not the all slot
    cache.incr("widgets-id-1").await.unwrap();

    let (all, refreshed): (Vec<Widget>, bool) =
        manager.allf(|| async { Ok(vec![]) }).await.unwrap();
    assert_eq!(all.len(), 1, "all list must still be served from cache");
    assert!(!refreshed);
}

#[tokio::test]
async fn test_partitions_are_isolated_from_each_other() {
    let (manager, cache) = widgets_manager();

    let a: Vec<Widget> = manager
        .partition("owner", "a", || async {
            Ok(vec![Widget {
                id: 1,
                owner: "a".to_string(),
            }])
        })
        .await
        .unwrap();
    assert_eq!(a.len(), 1);

    cache.incr("widgets-owner-b").await.unwrap();

    let (a, refreshed): (Vec<Widget>, bool) = manager
        .partitionf("owner", "a", || async { Ok(vec![]) })
        .await
        .unwrap();
    assert_eq!(a.len(), 1);
    assert!(!refreshed, "bumping owner b must not touch owner a");
}

#[tokio::test]
async fn test_versioned_keys_survive_unsafe_names() {
    let cache = VersionedCache::new(InMemoryStore::new());

    let name = format!("report {}", "x".repeat(400));
    let key = cache.version(&name).await.unwrap();
    assert!(key.len() <= 230 + ":1".len());
    assert!(!key.contains(' '));

    let count: i64 = cache.get(&key, || async { Ok(7) }, None).await.unwrap();
    assert_eq!(count, 7);

    cache.incr(&name).await.unwrap();
    let bumped = cache.version(&name).await.unwrap();
    assert_ne!(key, bumped);
}

#[test]
fn test_cache_error_display() {
    let err = CacheError::Connection("Failed to connect".to_string());
    assert!(format!("{}", err).contains("Failed to connect"));

    let err = CacheError::Configuration("undeclared fields".to_string());
    assert!(format!("{}", err).contains("undeclared fields"));
}

// Note: These tests require a memcached server running.
// They are disabled by default but can be run with: cargo test --features memcached -- --ignored

#[cfg(feature = "memcached")]
mod memcached {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_memcached_versioned_roundtrip() {
        let store = MemcachedStore::connect("memcache://localhost:11211")
            .await
            .unwrap();
        let cache = VersionedCache::new(store);

        let key = cache.version("it-widgets").await.unwrap();
        let value: String = cache
            .get(&key, || async { Ok("cached".to_string()) }, None)
            .await
            .unwrap();
        assert_eq!(value, "cached");

        cache.incr("it-widgets").await.unwrap();
        let bumped = cache.version("it-widgets").await.unwrap();
        assert_ne!(key, bumped);
    }

    #[tokio::test]
    #[ignore]
    async fn test_memcached_add_and_increment_semantics() {
        let store = MemcachedStore::connect("memcache://localhost:11211")
            .await
            .unwrap();

        let key = format!("it-sem-{}", std::process::id());
        store.delete(&key).await.unwrap();

        assert!(matches!(
            store.increment(&key, 1).await.unwrap_err(),
            CacheError::NotFound(_)
        ));

        store.add(&key, "1".to_string()).await.unwrap();
        assert!(matches!(
            store.add(&key, "9".to_string()).await.unwrap_err(),
            CacheError::AlreadyExists(_)
        ));

        assert_eq!(store.increment(&key, 1).await.unwrap(), 2);
    }
}
