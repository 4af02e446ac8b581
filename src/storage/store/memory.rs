//! In-memory page store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use super::PageStore;
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Node;
use crate::storage::StoreStats;

/// Keeps every node in a hash map.
///
/// Ids come from a monotonically increasing counter and are never reused.
///
/// # Reclamation
/// By default `free` drops the node immediately. A store built with
/// [`MemoryStore::with_deferred_reclaim`] instead parks freed pages, so a
/// reader still walking an older root keeps seeing them until the host calls
/// [`MemoryStore::reclaim`].
pub struct MemoryStore {
    pages: RwLock<HashMap<PageId, Node>>,

    /// Freed but not yet dropped (deferred mode only).
    retired: Mutex<Vec<PageId>>,

    next_id: AtomicU64,

    defer_reclaim: bool,

    stats: StoreStats,
}

impl MemoryStore {
    /// Create an empty store that reclaims pages as soon as they are freed.
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            retired: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            defer_reclaim: false,
            stats: StoreStats::new(),
        }
    }

    /// Create an empty store that keeps freed pages readable until
    /// [`MemoryStore::reclaim`] is called.
    pub fn with_deferred_reclaim() -> Self {
        Self {
            defer_reclaim: true,
            ..Self::new()
        }
    }

    /// Drop every retired page. Returns how many were dropped.
    ///
    /// The caller guarantees no reader still holds a root that reaches them.
    pub fn reclaim(&self) -> usize {
        let retired = std::mem::take(&mut *self.retired.lock());
        let mut pages = self.pages.write();
        for id in &retired {
            pages.remove(id);
        }
        retired.len()
    }

    /// Number of pages currently held (including retired ones).
    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }

    /// Number of freed pages waiting for [`MemoryStore::reclaim`].
    pub fn retired_count(&self) -> usize {
        self.retired.lock().len()
    }

    /// Whether `id` is currently held.
    pub fn contains(&self, id: PageId) -> bool {
        self.pages.read().contains_key(&id)
    }

    /// Get store statistics.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore for MemoryStore {
    fn get(&self, id: PageId) -> Result<Node> {
        self.stats.record_get();
        self.pages
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::PageNotFound(id.0))
    }

    fn allocate(&self, node: &Node) -> Result<PageId> {
        if node.size() > PAGE_SIZE {
            return Err(Error::CorruptNode(format!(
                "node of {} bytes does not fit a {} byte page",
                node.size(),
                PAGE_SIZE
            )));
        }

        let id = PageId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.pages.write().insert(id, node.clone());
        self.stats.record_allocation();
        Ok(id)
    }

    fn free(&self, id: PageId) -> Result<()> {
        if self.defer_reclaim {
            if !self.contains(id) {
                return Err(Error::PageNotFound(id.0));
            }
            self.retired.lock().push(id);
        } else if self.pages.write().remove(&id).is_none() {
            return Err(Error::PageNotFound(id.0));
        }

        self.stats.record_free();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::{Cell, NodeKind};

    fn leaf(key: &[u8]) -> Node {
        Node::from_cells(NodeKind::Leaf, &[Cell::leaf(key, b"v")])
    }

    #[test]
    fn test_allocate_and_get() {
        let store = MemoryStore::new();
        let a = store.allocate(&leaf(b"a")).unwrap();
        let b = store.allocate(&leaf(b"b")).unwrap();
        assert_ne!(a, b);

        assert_eq!(store.get(a).unwrap().key(0).unwrap(), b"a");
        assert_eq!(store.get(b).unwrap().key(0).unwrap(), b"b");
        assert_eq!(store.page_count(), 2);
    }

    #[test]
    fn test_ids_never_reused() {
        let store = MemoryStore::new();
        let a = store.allocate(&leaf(b"a")).unwrap();
        store.free(a).unwrap();
        let b = store.allocate(&leaf(b"b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_free_unknown_page() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.free(PageId::new(3)),
            Err(Error::PageNotFound(3))
        ));
        assert!(matches!(
            store.get(PageId::new(3)),
            Err(Error::PageNotFound(3))
        ));
    }

    #[test]
    fn test_immediate_reclaim() {
        let store = MemoryStore::new();
        let a = store.allocate(&leaf(b"a")).unwrap();
        store.free(a).unwrap();
        assert!(!store.contains(a));
        assert!(store.get(a).is_err());
    }

    #[test]
    fn test_deferred_reclaim() {
        let store = MemoryStore::with_deferred_reclaim();
        let a = store.allocate(&leaf(b"a")).unwrap();
        store.free(a).unwrap();

        // Still readable until reclaimed.
        assert_eq!(store.get(a).unwrap().key(0).unwrap(), b"a");
        assert_eq!(store.retired_count(), 1);

        assert_eq!(store.reclaim(), 1);
        assert!(store.get(a).is_err());
        assert_eq!(store.retired_count(), 0);
    }

    #[test]
    fn test_rejects_oversize_node() {
        let store = MemoryStore::new();
        let value = vec![0u8; 3000];
        let node = Node::from_cells(
            NodeKind::Leaf,
            &[Cell::leaf(b"a", &value), Cell::leaf(b"b", &value)],
        );
        assert!(matches!(store.allocate(&node), Err(Error::CorruptNode(_))));
        assert_eq!(store.page_count(), 0);
    }

    #[test]
    fn test_stats() {
        let store = MemoryStore::new();
        let a = store.allocate(&leaf(b"a")).unwrap();
        store.get(a).unwrap();
        store.free(a).unwrap();

        let snapshot = store.stats().snapshot();
        assert_eq!(snapshot.allocations, 1);
        assert_eq!(snapshot.gets, 1);
        assert_eq!(snapshot.frees, 1);
        assert_eq!(snapshot.live_pages(), 0);
    }
}
