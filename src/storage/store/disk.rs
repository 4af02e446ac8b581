//! File-backed page store.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use super::PageStore;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Node;
use crate::storage::{DiskManager, StoreStats};

/// Freed slots, by stage.
#[derive(Default)]
struct FreeSlots {
    /// Stack of reusable slots (LIFO).
    reusable: Vec<PageId>,

    /// Freed but still readable (deferred mode only).
    retired: Vec<PageId>,

    /// Every slot in either list, so a slot is never handed out twice.
    freed: HashSet<PageId>,
}

/// Stores each node in a checksummed slot of a [`DiskManager`] file.
///
/// Freed slots go on an in-memory free list and are handed out again by
/// later allocations. The free list is not persisted, so slots freed before
/// a reopen are simply left unused.
///
/// # Reclamation
/// By default a freed slot can be overwritten by the very next `allocate`.
/// A store switched to [`DiskStore::with_deferred_reclaim`] parks freed
/// slots instead, so a reader walking an older root keeps seeing its pages
/// until the host calls [`DiskStore::reclaim`].
///
/// # Thread Safety
/// - `disk_manager`: `Mutex` — single-threaded I/O
/// - `free_slots`: `Mutex` — always modified
/// - `stats`: No lock — all atomic counters
pub struct DiskStore {
    disk_manager: Mutex<DiskManager>,

    free_slots: Mutex<FreeSlots>,

    defer_reclaim: bool,

    stats: StoreStats,
}

impl DiskStore {
    /// Wrap an opened disk manager.
    pub fn new(disk_manager: DiskManager) -> Self {
        Self {
            disk_manager: Mutex::new(disk_manager),
            free_slots: Mutex::new(FreeSlots::default()),
            defer_reclaim: false,
            stats: StoreStats::new(),
        }
    }

    /// Keep freed slots unreusable until [`DiskStore::reclaim`] is called.
    ///
    /// ```no_run
    /// use cowbtree::DiskStore;
    ///
    /// let store = DiskStore::create("tree.db")?.with_deferred_reclaim();
    /// # Ok::<(), cowbtree::Error>(())
    /// ```
    pub fn with_deferred_reclaim(mut self) -> Self {
        self.defer_reclaim = true;
        self
    }

    /// Make every retired slot reusable. Returns how many were released.
    ///
    /// The caller guarantees no reader still holds a root that reaches them.
    pub fn reclaim(&self) -> usize {
        let mut slots = self.free_slots.lock();
        let retired = std::mem::take(&mut slots.retired);
        let count = retired.len();
        slots.reusable.extend(retired);
        count
    }

    /// Create a new page file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DiskManager::create(path)?))
    }

    /// Open an existing page file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DiskManager::open(path)?))
    }

    /// Open the page file at `path`, creating it if needed.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DiskManager::open_or_create(path)?))
    }

    /// Flush all written pages to durable storage.
    pub fn sync(&self) -> Result<()> {
        self.disk_manager.lock().sync()
    }

    /// Number of slots in the backing file.
    pub fn page_count(&self) -> u64 {
        self.disk_manager.lock().page_count()
    }

    /// Number of slots waiting to be reused.
    pub fn free_count(&self) -> usize {
        self.free_slots.lock().reusable.len()
    }

    /// Number of freed slots waiting for [`DiskStore::reclaim`].
    pub fn retired_count(&self) -> usize {
        self.free_slots.lock().retired.len()
    }

    /// Get store statistics.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

impl PageStore for DiskStore {
    fn get(&self, id: PageId) -> Result<Node> {
        self.stats.record_get();
        let page = self.disk_manager.lock().read_page(id)?;
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);
        Node::decode(page.as_slice())
    }

    fn allocate(&self, node: &Node) -> Result<PageId> {
        let page = node.to_page()?;

        let mut dm = self.disk_manager.lock();
        let mut slots = self.free_slots.lock();
        let id = match slots.reusable.pop() {
            Some(id) => {
                if let Err(e) = dm.write_page(id, &page) {
                    // Keep the slot usable for the next allocation.
                    slots.reusable.push(id);
                    return Err(e);
                }
                slots.freed.remove(&id);
                id
            }
            None => dm.append_page(&page)?,
        };

        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        self.stats.record_allocation();
        Ok(id)
    }

    fn free(&self, id: PageId) -> Result<()> {
        if id.0 >= self.page_count() {
            return Err(Error::PageNotFound(id.0));
        }
        let mut slots = self.free_slots.lock();
        if !slots.freed.insert(id) {
            return Err(Error::PageNotFound(id.0));
        }
        if self.defer_reclaim {
            slots.retired.push(id);
        } else {
            slots.reusable.push(id);
        }
        self.stats.record_free();
        Ok(())
    }
}
