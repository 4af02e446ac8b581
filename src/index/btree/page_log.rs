//! Page bookkeeping for one copy-on-write mutation.

use tracing::warn;

use crate::common::{PageId, Result};
use crate::storage::page::Node;
use crate::storage::PageStore;

/// Records the pages a single insert or delete allocates and replaces.
///
/// Replaced pages are only freed by [`PageLog::commit`], after the new root
/// exists. [`PageLog::abort`] instead frees what the failed operation
/// allocated, leaving the previous tree exactly as it was.
///
/// Both ends release pages best-effort: once the root has been swapped the
/// mutation has happened, so a failed `free` only leaks that page.
pub(crate) struct PageLog<'s, S: PageStore> {
    store: &'s S,
    allocated: Vec<PageId>,
    retired: Vec<PageId>,
}

impl<'s, S: PageStore> PageLog<'s, S> {
    pub(crate) fn new(store: &'s S) -> Self {
        Self {
            store,
            allocated: Vec::new(),
            retired: Vec::new(),
        }
    }

    /// Allocate a new page holding `node`.
    pub(crate) fn alloc(&mut self, node: &Node) -> Result<PageId> {
        let id = self.store.allocate(node)?;
        self.allocated.push(id);
        Ok(id)
    }

    /// Allocate every node in order.
    pub(crate) fn alloc_all(&mut self, nodes: &[Node]) -> Result<Vec<PageId>> {
        nodes.iter().map(|node| self.alloc(node)).collect()
    }

    /// Mark a page as replaced by this mutation.
    pub(crate) fn retire(&mut self, id: PageId) {
        self.retired.push(id);
    }

    /// Free every replaced page. Returns how many could not be freed.
    pub(crate) fn commit(self) -> usize {
        let mut leaked = 0;
        for id in self.retired {
            if let Err(e) = self.store.free(id) {
                warn!(page = id.0, error = %e, "failed to release replaced page");
                leaked += 1;
            }
        }
        leaked
    }

    /// Free every page this mutation allocated.
    pub(crate) fn abort(self) {
        for id in self.allocated {
            if let Err(e) = self.store.free(id) {
                warn!(page = id.0, error = %e, "failed to release page of aborted mutation");
            }
        }
    }
}
