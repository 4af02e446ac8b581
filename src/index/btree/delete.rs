//! Delete: copy-on-write descent with merge, redistribution and root
//! collapse.
//!
//! A child whose replacement underflows is first merged into its left
//! sibling, then into its right sibling, and otherwise topped up with
//! entries from the fuller sibling. Parents are rebuilt through
//! `replace_children`, so a parent can underflow in turn (handled one level
//! up) or, since separators may grow, even split.

use std::ops::Range;

use tracing::{debug, trace, warn};

use super::balance::{fits_merged, merge, redistribute, replace_children};
use super::page_log::PageLog;
use super::search::{search_child, search_leaf};
use super::BTree;
use crate::common::config::MAX_KEY_SIZE;
use crate::common::{PageId, Result};
use crate::storage::page::{Node, NodeKind};
use crate::storage::PageStore;

impl<S: PageStore> BTree<S> {
    /// Remove `key`. Returns whether it was present.
    ///
    /// Deleting an absent key touches no page.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        trace!(key_len = key.len(), "delete");
        if key.len() > MAX_KEY_SIZE {
            return Ok(false);
        }

        let mut log = PageLog::new(&self.store);
        match self.delete_from_root(&mut log, key) {
            Ok(None) => Ok(false),
            Ok(Some(root)) => {
                self.root = root;
                log.commit();
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "delete failed, keeping previous root");
                log.abort();
                Err(e)
            }
        }
    }

    fn delete_from_root(
        &self,
        log: &mut PageLog<'_, S>,
        key: &[u8],
    ) -> Result<Option<PageId>> {
        let root = self.store.get(self.root)?;
        let Some(nodes) = self.delete_from(log, &root, key)? else {
            return Ok(None);
        };
        log.retire(self.root);

        if let [node] = nodes.as_slice() {
            if !node.is_leaf() && node.key_count() <= 1 {
                return self.collapse_root(log, node).map(Some);
            }
        }
        self.publish_root(log, nodes).map(Some)
    }

    /// Replace an internal root with at most one child by its descendants
    /// until the root is a leaf or has two or more children.
    fn collapse_root(&self, log: &mut PageLog<'_, S>, node: &Node) -> Result<PageId> {
        if node.key_count() == 0 {
            debug!("tree emptied, root reset to an empty leaf");
            return log.alloc(&Node::empty_leaf());
        }

        let mut root = node.child_pointer(0)?;
        let mut levels = 1;
        loop {
            let next = self.store.get(root)?;
            if next.is_leaf() || next.key_count() != 1 {
                break;
            }
            log.retire(root);
            root = next.child_pointer(0)?;
            levels += 1;
        }
        debug!(root = root.0, levels, "root collapsed");
        Ok(root)
    }

    /// Return the replacement(s) for `node` with `key` removed, or `None`
    /// if `key` is not in this subtree.
    fn delete_from(
        &self,
        log: &mut PageLog<'_, S>,
        node: &Node,
        key: &[u8],
    ) -> Result<Option<Vec<Node>>> {
        match node.kind() {
            NodeKind::Leaf => {
                let (found, idx) = search_leaf(node, key)?;
                if !found {
                    return Ok(None);
                }
                let mut cells = node.cells()?;
                cells.remove(idx);
                Ok(Some(vec![Node::from_cells(NodeKind::Leaf, &cells)]))
            }
            NodeKind::Internal => {
                let idx = search_child(node, key)?;
                let child_id = node.child_pointer(idx)?;
                let child = self.store.get(child_id)?;

                let Some(mut kids) = self.delete_from(log, &child, key)? else {
                    return Ok(None);
                };
                log.retire(child_id);

                let mut range = idx..idx + 1;
                if kids.len() == 1 && self.underflows(&kids[0]) {
                    if node.key_count() > 1 {
                        let child = kids.remove(0);
                        (range, kids) = self.rebalance(log, node, idx, child)?;
                    } else if kids[0].key_count() == 0 {
                        // The only child emptied, and this node with it.
                        return Ok(Some(vec![Node::from_cells(NodeKind::Internal, &[])]));
                    }
                }

                let ids = log.alloc_all(&kids)?;
                let nodes = replace_children(node, range, &kids, &ids)?;
                if nodes.len() > 1 {
                    debug!(parts = nodes.len(), "internal node split during delete");
                }
                Ok(Some(nodes))
            }
        }
    }

    fn underflows(&self, node: &Node) -> bool {
        node.key_count() == 0 || node.size() < self.config.merge_threshold
    }

    /// Fix up the underflowing replacement `child` of `parent`'s child `idx`.
    ///
    /// Returns the range of `parent`'s children to replace and the nodes
    /// replacing them. Any sibling consumed here is retired.
    fn rebalance(
        &self,
        log: &mut PageLog<'_, S>,
        parent: &Node,
        idx: usize,
        child: Node,
    ) -> Result<(Range<usize>, Vec<Node>)> {
        let left = match idx {
            0 => None,
            _ => {
                let id = parent.child_pointer(idx - 1)?;
                Some((id, self.store.get(id)?))
            }
        };
        if let Some((id, left)) = &left {
            if fits_merged(left, &child) {
                log.retire(*id);
                debug!(left = id.0, "merged into left sibling");
                return Ok((idx - 1..idx + 1, vec![merge(left, &child)?]));
            }
        }

        let right = if idx + 1 < parent.key_count() {
            let id = parent.child_pointer(idx + 1)?;
            Some((id, self.store.get(id)?))
        } else {
            None
        };
        if let Some((id, right)) = &right {
            if fits_merged(&child, right) {
                log.retire(*id);
                debug!(right = id.0, "merged with right sibling");
                return Ok((idx..idx + 2, vec![merge(&child, right)?]));
            }
        }

        let threshold = self.config.merge_threshold;
        let from_left = match (&left, &right) {
            (Some((_, l)), Some((_, r))) => l.size() >= r.size(),
            (Some(_), None) => true,
            _ => false,
        };
        if from_left {
            if let Some((id, left)) = &left {
                if let Some((l, c)) = redistribute(left, &child, true, threshold)? {
                    log.retire(*id);
                    debug!(donor = id.0, "redistributed from left sibling");
                    return Ok((idx - 1..idx + 1, vec![l, c]));
                }
            }
        } else if let Some((id, right)) = &right {
            if let Some((c, r)) = redistribute(&child, right, false, threshold)? {
                log.retire(*id);
                debug!(donor = id.0, "redistributed from right sibling");
                return Ok((idx..idx + 2, vec![c, r]));
            }
        }

        Ok((idx..idx + 1, vec![child]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn key(i: usize) -> Vec<u8> {
        format!("k{:03}", i).into_bytes()
    }

    fn tree_with(n: usize, value_len: usize) -> BTree<MemoryStore> {
        let mut tree = BTree::create(MemoryStore::new()).unwrap();
        let value = vec![1u8; value_len];
        for i in 0..n {
            tree.insert(&key(i), &value).unwrap();
        }
        tree
    }

    #[test]
    fn test_delete_present_and_absent() {
        let mut tree = tree_with(3, 8);
        assert!(tree.delete(&key(1)).unwrap());
        assert!(!tree.delete(&key(1)).unwrap());
        assert_eq!(tree.get(&key(1)).unwrap(), None);
        assert!(tree.get(&key(0)).unwrap().is_some());
        assert!(tree.get(&key(2)).unwrap().is_some());
    }

    #[test]
    fn test_delete_absent_touches_nothing() {
        let mut tree = tree_with(20, 500);
        let root = tree.root();
        let before = tree.store().stats().snapshot();

        assert!(!tree.delete(b"missing").unwrap());
        let after = tree.store().stats().snapshot();
        assert_eq!(tree.root(), root);
        assert_eq!(after.allocations, before.allocations);
        assert_eq!(after.frees, before.frees);
    }

    #[test]
    fn test_delete_oversize_key() {
        let mut tree = tree_with(1, 1);
        let key = vec![0u8; MAX_KEY_SIZE + 1];
        assert!(!tree.delete(&key).unwrap());
    }

    #[test]
    fn test_merge_collapses_root() {
        // Leaves [k000 k001] [k002 k003 k004]
        let mut tree = tree_with(5, 1000);
        assert_eq!(tree.height().unwrap(), 2);

        assert!(tree.delete(&key(0)).unwrap());
        assert_eq!(tree.height().unwrap(), 1);
        let root = tree.store().get(tree.root()).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.key_count(), 4);
        // Nothing but the root page survives.
        assert_eq!(tree.store().page_count(), 1);
    }

    #[test]
    fn test_merge_into_left_sibling() {
        // Leaves [k000 k001] [k002 k003] [k004 .. k007]
        let mut tree = tree_with(8, 1000);
        assert!(tree.delete(&key(3)).unwrap());

        let root = tree.store().get(tree.root()).unwrap();
        assert_eq!(root.key_count(), 2);
        assert_eq!(root.key(0).unwrap(), key(0).as_slice());
        assert_eq!(root.key(1).unwrap(), key(4).as_slice());
        let left = tree.store().get(root.child_pointer(0).unwrap()).unwrap();
        assert_eq!(left.key_count(), 3);
    }

    #[test]
    fn test_redistribute_from_right_sibling() {
        let mut tree = tree_with(8, 1000);
        tree.delete(&key(3)).unwrap();
        // [k000 k001 k002] [k004 .. k007]; the pair no longer fits one page.
        tree.delete(&key(2)).unwrap();

        let root = tree.store().get(tree.root()).unwrap();
        assert_eq!(root.key_count(), 2);
        assert_eq!(root.key(1).unwrap(), key(5).as_slice());
        let left = tree.store().get(root.child_pointer(0).unwrap()).unwrap();
        assert_eq!(left.key(2).unwrap(), key(4).as_slice());
        for i in [0, 1, 4, 5, 6, 7] {
            assert!(tree.get(&key(i)).unwrap().is_some());
        }
    }

    #[test]
    fn test_delete_first_key_updates_separator() {
        let mut tree = tree_with(8, 1000);
        tree.delete(&key(4)).unwrap();

        let root = tree.store().get(tree.root()).unwrap();
        assert_eq!(root.key(root.key_count() - 1).unwrap(), key(5).as_slice());
    }

    #[test]
    fn test_delete_all_leaves_empty_leaf() {
        let mut tree = tree_with(60, 300);
        assert!(tree.height().unwrap() >= 2);

        for i in (0..60).rev() {
            assert!(tree.delete(&key(i)).unwrap());
        }
        assert_eq!(tree.height().unwrap(), 1);
        let root = tree.store().get(tree.root()).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.key_count(), 0);
        assert_eq!(tree.store().page_count(), 1);
    }

    #[test]
    fn test_custom_threshold_disables_rebalancing() {
        let mut tree = BTree::create_with_config(
            MemoryStore::new(),
            crate::common::BTreeConfig::new(1),
        )
        .unwrap();
        let value = vec![0u8; 1000];
        for i in 0..8 {
            tree.insert(&key(i), &value).unwrap();
        }
        tree.delete(&key(3)).unwrap();

        // [k002] is still above a one-byte threshold, so nothing merges.
        let root = tree.store().get(tree.root()).unwrap();
        assert_eq!(root.key_count(), 3);
    }
}
