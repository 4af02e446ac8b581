//! Node splitting, merging and child replacement.
//!
//! These helpers work on [`Cell`] runs and never touch the page store; the
//! insert and delete engines allocate whatever they return.

use std::ops::Range;

use crate::common::config::{HEADER_SIZE, PAGE_SIZE};
use crate::common::{PageId, Result};
use crate::storage::page::{Cell, Node, NodeKind};

/// Pack `cells` into page-sized nodes.
///
/// A run that fits one page becomes one node. Otherwise the two-way split
/// closest to the entry-count midpoint where both halves fit is used. When
/// no two-way split fits (a near-maximal entry between two large neighbours)
/// the cells are packed greedily, which yields three nodes at most because
/// every single entry fits a page.
pub(crate) fn split_cells(kind: NodeKind, cells: &[Cell<'_>]) -> Vec<Node> {
    // prefix[i] = encoded size of cells[..i]
    let mut prefix = Vec::with_capacity(cells.len() + 1);
    prefix.push(0usize);
    for cell in cells {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + cell.encoded_size(kind));
    }
    let fits = |from: usize, to: usize| HEADER_SIZE + prefix[to] - prefix[from] <= PAGE_SIZE;

    let n = cells.len();
    if fits(0, n) {
        return vec![Node::from_cells(kind, cells)];
    }

    let mid = n / 2;
    let two_way = (1..n)
        .filter(|&at| fits(0, at) && fits(at, n))
        .min_by_key(|&at| at.abs_diff(mid));
    if let Some(at) = two_way {
        return vec![
            Node::from_cells(kind, &cells[..at]),
            Node::from_cells(kind, &cells[at..]),
        ];
    }

    let mut nodes = Vec::with_capacity(3);
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && fits(start, end + 1) {
            end += 1;
        }
        nodes.push(Node::from_cells(kind, &cells[start..end]));
        start = end;
    }
    nodes
}

/// Whether two adjacent siblings fit one page together.
pub(crate) fn fits_merged(left: &Node, right: &Node) -> bool {
    left.size() + right.size() - HEADER_SIZE <= PAGE_SIZE
}

/// Concatenate two adjacent siblings of the same kind.
pub(crate) fn merge(left: &Node, right: &Node) -> Result<Node> {
    let mut cells = left.cells()?;
    cells.extend(right.cells()?);
    Ok(Node::from_cells(left.kind(), &cells))
}

/// Shift entries between adjacent siblings until the underflowing one
/// reaches `threshold`.
///
/// With `fill_right` the tail of `left` moves to the front of `right`,
/// otherwise the head of `right` moves to the end of `left`. The donor never
/// drops below `threshold` or loses its last entry, and the receiver never
/// exceeds a page. Returns `None` if not a single entry could move.
///
/// Moving up to the threshold rather than a single entry is the chosen
/// policy for tunable thresholds; see `BTreeConfig::merge_threshold`.
pub(crate) fn redistribute(
    left: &Node,
    right: &Node,
    fill_right: bool,
    threshold: usize,
) -> Result<Option<(Node, Node)>> {
    let kind = left.kind();
    let mut l = left.cells()?;
    let mut r = right.cells()?;
    let (mut l_size, mut r_size) = (left.size(), right.size());
    let mut moved = 0;

    if fill_right {
        while r_size < threshold && l.len() > 1 {
            let cs = l[l.len() - 1].encoded_size(kind);
            if l_size - cs < threshold || r_size + cs > PAGE_SIZE {
                break;
            }
            let cell = l.remove(l.len() - 1);
            r.insert(0, cell);
            l_size -= cs;
            r_size += cs;
            moved += 1;
        }
    } else {
        while l_size < threshold && r.len() > 1 {
            let cs = r[0].encoded_size(kind);
            if r_size - cs < threshold || l_size + cs > PAGE_SIZE {
                break;
            }
            let cell = r.remove(0);
            l.push(cell);
            r_size -= cs;
            l_size += cs;
            moved += 1;
        }
    }

    if moved == 0 {
        return Ok(None);
    }
    Ok(Some((
        Node::from_cells(kind, &l),
        Node::from_cells(kind, &r),
    )))
}

/// Rebuild an internal node with the children in `range` replaced by
/// `kids` (already allocated as `ids`), splitting it if it overflows.
///
/// Each new separator is the kid's first key. An empty kid keeps the
/// separator of the first replaced child.
pub(crate) fn replace_children(
    node: &Node,
    range: Range<usize>,
    kids: &[Node],
    ids: &[PageId],
) -> Result<Vec<Node>> {
    let fallback = node.key(range.start)?;
    let mut cells = Vec::with_capacity(node.key_count() - range.len() + kids.len());

    for i in 0..range.start {
        cells.push(node.cell(i)?);
    }
    for (kid, &id) in kids.iter().zip(ids) {
        let key = if kid.key_count() == 0 {
            fallback
        } else {
            kid.key(0)?
        };
        cells.push(Cell::internal(key, id));
    }
    for i in range.end..node.key_count() {
        cells.push(node.cell(i)?);
    }

    Ok(split_cells(NodeKind::Internal, &cells))
}
