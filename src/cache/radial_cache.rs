use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::graph::GraphView;

/// Thread-safe LRU cache of radial query results
///
/// Keyed by `(root, depth)`. A radial view depends only on the loaded table,
/// so each loaded table owns its own cache.
pub struct RadialCache {
    cache: Option<Mutex<LruCache<(String, usize), Arc<GraphView>>>>,
}

impl RadialCache {
    /// Create a cache holding up to `capacity` views; 0 disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, root: &str, depth: usize) -> Option<Arc<GraphView>> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(&(root.to_string(), depth)).cloned()
    }

    pub fn put(&self, root: &str, depth: usize, view: Arc<GraphView>) {
        if let Some(cache) = &self.cache {
            let mut guard = cache.lock().unwrap_or_else(|e| e.into_inner());
            guard.put((root.to_string(), depth), view);
        }
    }

    pub fn len(&self) -> usize {
        self.cache
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RadialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadialCache")
            .field("enabled", &self.cache.is_some())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(marker: &str) -> Arc<GraphView> {
        Arc::new(GraphView {
            expandable_nodes: vec![marker.to_string()],
            ..GraphView::default()
        })
    }

    #[test]
    fn test_put_and_get() {
        let cache = RadialCache::new(10);
        cache.put("Alice", 2, view("v"));

        assert_eq!(cache.get("Alice", 2).unwrap().expandable_nodes, vec!["v"]);
        assert!(cache.get("Alice", 3).is_none());
        assert!(cache.get("Bob", 2).is_none());
    }

    #[test]
    fn test_eviction_respects_recent_use() {
        let cache = RadialCache::new(2);
        cache.put("a", 1, view("a"));
        cache.put("b", 1, view("b"));
        let _ = cache.get("a", 1);
        cache.put("c", 1, view("c"));

        assert!(cache.get("a", 1).is_some());
        assert!(cache.get("b", 1).is_none());
        assert!(cache.get("c", 1).is_some());
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = RadialCache::new(0);
        cache.put("a", 1, view("a"));
        assert!(cache.get("a", 1).is_none());
        assert!(cache.is_empty());
    }
}
