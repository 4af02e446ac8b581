//! Structural validation of a whole tree.

use std::fmt;

use super::BTree;
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::NodeKind;
use crate::storage::PageStore;

/// Summary of a validated tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeShape {
    pub height: usize,
    pub leaves: usize,
    pub internal_nodes: usize,
    pub entries: usize,
}

impl fmt::Display for TreeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "height={} leaves={} internal={} entries={}",
            self.height, self.leaves, self.internal_nodes, self.entries
        )
    }
}

impl<S: PageStore> BTree<S> {
    /// Walk every reachable page and check the tree's structure.
    ///
    /// Verifies that every node fits a page, keys are strictly increasing,
    /// each separator equals the smallest key of its subtree, every key lies
    /// within its parent's separator bounds, only the root may be empty and
    /// all leaves sit at the same depth.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` describing the first violation found,
    /// or any store error hit while loading pages.
    pub fn check_invariants(&self) -> Result<TreeShape> {
        let mut shape = TreeShape::default();
        let mut leaf_depth = None;
        self.check_subtree(self.root, 1, None, None, &mut leaf_depth, &mut shape)?;
        shape.height = leaf_depth.unwrap_or(1);
        Ok(shape)
    }

    /// Returns the smallest key of the subtree, `None` if it is empty.
    fn check_subtree(
        &self,
        id: PageId,
        depth: usize,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
        leaf_depth: &mut Option<usize>,
        shape: &mut TreeShape,
    ) -> Result<Option<Vec<u8>>> {
        let node = self.store.get(id)?;
        let corrupt = |what: String| Error::CorruptNode(format!("page {}: {}", id, what));

        if node.size() > PAGE_SIZE {
            return Err(corrupt(format!("{} bytes exceeds a page", node.size())));
        }
        let n = node.key_count();
        if n == 0 && depth > 1 {
            return Err(corrupt("empty non-root node".to_string()));
        }

        for i in 0..n {
            let key = node.key(i)?;
            if i > 0 && node.key(i - 1)? >= key {
                return Err(corrupt(format!("keys out of order at {}", i)));
            }
            if lower.is_some_and(|lo| key < lo) || upper.is_some_and(|hi| key >= hi) {
                return Err(corrupt(format!("key {} outside parent bounds", i)));
            }
        }

        match node.kind() {
            NodeKind::Leaf => {
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(d) if d != depth => {
                        return Err(corrupt(format!(
                            "leaf at depth {}, expected {}",
                            depth, d
                        )));
                    }
                    Some(_) => {}
                }
                shape.leaves += 1;
                shape.entries += n;
            }
            NodeKind::Internal => {
                shape.internal_nodes += 1;
                for i in 0..n {
                    let lo = node.key(i)?;
                    let hi = if i + 1 < n { Some(node.key(i + 1)?) } else { upper };
                    let child = node.child_pointer(i)?;
                    let min =
                        self.check_subtree(child, depth + 1, Some(lo), hi, leaf_depth, shape)?;
                    if min.as_deref() != Some(lo) {
                        return Err(corrupt(format!(
                            "separator {} differs from its subtree's smallest key",
                            i
                        )));
                    }
                }
            }
        }

        match n {
            0 => Ok(None),
            _ => Ok(Some(node.key(0)?.to_vec())),
        }
    }
}
