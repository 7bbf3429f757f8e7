//! Sharded in-memory hash table engine.

use dashmap::DashMap;

use crate::Engine;

/// In-memory engine backed by a sharded concurrent hash map.
///
/// `DashMap` partitions the key space across internally locked shards, so
/// concurrent request handlers contend only when they hit the same shard.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    table: DashMap<String, String>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Engine for MemoryEngine {
    fn set(&self, key: &str, value: &str) {
        self.table.insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.table.get(key).map(|entry| entry.value().clone())
    }

    fn del(&self, key: &str) {
        self.table.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_get_del() {
        let engine = MemoryEngine::new();
        assert_eq!(engine.get("missing"), None);

        engine.set("key", "value");
        assert_eq!(engine.get("key"), Some("value".to_string()));

        engine.set("key", "other");
        assert_eq!(engine.get("key"), Some("other".to_string()));

        engine.del("key");
        assert_eq!(engine.get("key"), None);
    }

    #[test]
    fn test_del_absent_key_is_noop() {
        let engine = MemoryEngine::new();
        engine.del("never-set");
        assert!(engine.is_empty());
    }

    #[test]
    fn test_concurrent_writers() {
        let engine = Arc::new(MemoryEngine::new());

        let handles: Vec<_> = (0..8)
            .map(|worker: usize| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        engine.set(&format!("k{worker}-{i}"), "v");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 800);
    }
}
