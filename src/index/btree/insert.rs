//! Insert: recursive copy-on-write descent with overflow splits.

use tracing::{debug, trace, warn};

use super::balance::{replace_children, split_cells};
use super::page_log::PageLog;
use super::search::{search_child, search_leaf};
use super::BTree;
use crate::common::config::{MAX_KEY_SIZE, MAX_VALUE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Cell, Node, NodeKind};
use crate::storage::PageStore;

impl<S: PageStore> BTree<S> {
    /// Insert `key` with `value`, replacing any existing value.
    ///
    /// Returns `true` if the key was new and `false` if an existing value
    /// was replaced.
    ///
    /// # Errors
    /// - `Error::KeyTooLarge` / `Error::ValueTooLarge` before any page is
    ///   touched
    /// - any store error; the tree then still points at its previous root
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        if key.len() > MAX_KEY_SIZE {
            return Err(Error::KeyTooLarge {
                len: key.len(),
                max: MAX_KEY_SIZE,
            });
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(Error::ValueTooLarge {
                len: value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        trace!(key_len = key.len(), value_len = value.len(), "insert");

        let mut log = PageLog::new(&self.store);
        match self.insert_from_root(&mut log, key, value) {
            Ok((root, inserted)) => {
                self.root = root;
                log.commit();
                Ok(inserted)
            }
            Err(e) => {
                warn!(error = %e, "insert failed, keeping previous root");
                log.abort();
                Err(e)
            }
        }
    }

    fn insert_from_root(
        &self,
        log: &mut PageLog<'_, S>,
        key: &[u8],
        value: &[u8],
    ) -> Result<(PageId, bool)> {
        let root = self.store.get(self.root)?;
        let (nodes, inserted) = self.insert_into(log, &root, key, value)?;
        log.retire(self.root);
        let root = self.publish_root(log, nodes)?;
        Ok((root, inserted))
    }

    /// Return the replacement(s) for `node` with the entry applied.
    ///
    /// One node normally; two or three when the result overflowed a page.
    fn insert_into(
        &self,
        log: &mut PageLog<'_, S>,
        node: &Node,
        key: &[u8],
        value: &[u8],
    ) -> Result<(Vec<Node>, bool)> {
        match node.kind() {
            NodeKind::Leaf => {
                let (found, idx) = search_leaf(node, key)?;
                let mut cells = node.cells()?;
                let cell = Cell::leaf(key, value);
                if found {
                    cells[idx] = cell;
                } else {
                    cells.insert(idx, cell);
                }

                let nodes = split_cells(NodeKind::Leaf, &cells);
                if nodes.len() > 1 {
                    debug!(parts = nodes.len(), entries = cells.len(), "leaf split");
                }
                Ok((nodes, !found))
            }
            NodeKind::Internal => {
                let idx = search_child(node, key)?;
                let child_id = node.child_pointer(idx)?;
                let child = self.store.get(child_id)?;

                let (kids, inserted) = self.insert_into(log, &child, key, value)?;
                log.retire(child_id);
                let ids = log.alloc_all(&kids)?;

                let nodes = replace_children(node, idx..idx + 1, &kids, &ids)?;
                if nodes.len() > 1 {
                    debug!(parts = nodes.len(), "internal node split");
                }
                Ok((nodes, inserted))
            }
        }
    }
}
