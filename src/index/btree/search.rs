//! Binary search within a single node.

use std::cmp::Ordering;

use crate::common::{Error, Result};
use crate::storage::page::Node;

/// Search a leaf for `key`.
///
/// Returns `(true, i)` if `key` is stored at position `i`, otherwise
/// `(false, i)` where `i` is the position it would be inserted at.
pub fn search_leaf(node: &Node, key: &[u8]) -> Result<(bool, usize)> {
    let (mut lo, mut hi) = (0, node.key_count());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match node.key(mid)?.cmp(key) {
            Ordering::Less => lo = mid + 1,
            Ordering::Equal => return Ok((true, mid)),
            Ordering::Greater => hi = mid,
        }
    }
    Ok((false, lo))
}

/// Pick the child of an internal node that may contain `key`.
///
/// Returns `i` such that `key[i] <= key < key[i + 1]`. Keys below the first
/// separator map to child 0.
///
/// # Errors
/// Returns `Error::CorruptNode` for an internal node without children.
pub fn search_child(node: &Node, key: &[u8]) -> Result<usize> {
    let n = node.key_count();
    if n == 0 {
        return Err(Error::CorruptNode(
            "internal node has no children".to_string(),
        ));
    }

    // First separator strictly greater than `key`.
    let (mut lo, mut hi) = (0, n);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if node.key(mid)? <= key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageId;
    use crate::storage::page::{Cell, NodeKind};

    fn leaf(keys: &[&[u8]]) -> Node {
        let cells: Vec<Cell<'_>> = keys.iter().map(|k| Cell::leaf(k, b"")).collect();
        Node::from_cells(NodeKind::Leaf, &cells)
    }

    fn internal(keys: &[&[u8]]) -> Node {
        let cells: Vec<Cell<'_>> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| Cell::internal(k, PageId::new(i as u64)))
            .collect();
        Node::from_cells(NodeKind::Internal, &cells)
    }

    #[test]
    fn test_search_leaf_found() {
        let node = leaf(&[b"b", b"d", b"f"]);
        assert_eq!(search_leaf(&node, b"b").unwrap(), (true, 0));
        assert_eq!(search_leaf(&node, b"d").unwrap(), (true, 1));
        assert_eq!(search_leaf(&node, b"f").unwrap(), (true, 2));
    }

    #[test]
    fn test_search_leaf_insertion_point() {
        let node = leaf(&[b"b", b"d", b"f"]);
        assert_eq!(search_leaf(&node, b"a").unwrap(), (false, 0));
        assert_eq!(search_leaf(&node, b"c").unwrap(), (false, 1));
        assert_eq!(search_leaf(&node, b"e").unwrap(), (false, 2));
        assert_eq!(search_leaf(&node, b"z").unwrap(), (false, 3));
        // Prefix ordering
        assert_eq!(search_leaf(&node, b"bb").unwrap(), (false, 1));
    }

    #[test]
    fn test_search_empty_leaf() {
        assert_eq!(search_leaf(&Node::empty_leaf(), b"x").unwrap(), (false, 0));
    }

    #[test]
    fn test_search_child() {
        let node = internal(&[b"a", b"g", b"p"]);
        assert_eq!(search_child(&node, b"a").unwrap(), 0);
        assert_eq!(search_child(&node, b"f").unwrap(), 0);
        assert_eq!(search_child(&node, b"g").unwrap(), 1);
        assert_eq!(search_child(&node, b"o").unwrap(), 1);
        assert_eq!(search_child(&node, b"p").unwrap(), 2);
        assert_eq!(search_child(&node, b"zzz").unwrap(), 2);
    }

    #[test]
    fn test_search_child_below_first_separator() {
        let node = internal(&[b"m", b"t"]);
        assert_eq!(search_child(&node, b"").unwrap(), 0);
        assert_eq!(search_child(&node, b"a").unwrap(), 0);
    }

    #[test]
    fn test_search_child_rejects_empty_internal() {
        let node = Node::from_cells(NodeKind::Internal, &[]);
        assert!(matches!(search_child(&node, b"a"), Err(Error::CorruptNode(_))));
    }
}
