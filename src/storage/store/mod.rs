//! Page stores - where the tree's nodes live.
//!
//! The tree only ever talks to the [`PageStore`] trait. Two implementations
//! are bundled:
//! - [`MemoryStore`] - a hash map of nodes, optionally deferring reclamation
//! - [`DiskStore`] - checksummed slots in a single file via [`DiskManager`]
//!
//! [`DiskManager`]: crate::storage::DiskManager

mod disk;
mod memory;

use std::sync::Arc;

use crate::common::{PageId, Result};
use crate::storage::page::Node;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Page load / allocate / free operations the tree depends on.
///
/// # Contract
/// - `get` returns a snapshot that stays valid no matter what is allocated
///   or freed afterwards.
/// - `allocate` persists a copy of `node` and returns an id that is not
///   reachable from any live root.
/// - `free` marks a page reclaimable. When it is actually reused is the
///   store's policy; the tree only frees pages it has already replaced.
///
/// All methods take `&self`; stores use interior mutability.
pub trait PageStore {
    /// Load the node stored under `id`.
    fn get(&self, id: PageId) -> Result<Node>;

    /// Persist a new node and return its id.
    fn allocate(&self, node: &Node) -> Result<PageId>;

    /// Mark a page reclaimable.
    fn free(&self, id: PageId) -> Result<()>;
}

impl<S: PageStore + ?Sized> PageStore for &S {
    fn get(&self, id: PageId) -> Result<Node> {
        (**self).get(id)
    }

    fn allocate(&self, node: &Node) -> Result<PageId> {
        (**self).allocate(node)
    }

    fn free(&self, id: PageId) -> Result<()> {
        (**self).free(id)
    }
}

impl<S: PageStore + ?Sized> PageStore for Arc<S> {
    fn get(&self, id: PageId) -> Result<Node> {
        (**self).get(id)
    }

    fn allocate(&self, node: &Node) -> Result<PageId> {
        (**self).allocate(node)
    }

    fn free(&self, id: PageId) -> Result<()> {
        (**self).free(id)
    }
}
