//! Page identifier type.

use std::fmt;

/// Identifies a node page in a [`PageStore`](crate::PageStore).
///
/// Internal nodes store one little-endian `u64` per child, so every id a
/// store hands out must survive that encoding. For [`DiskStore`] the id is
/// the slot index in the file; [`MemoryStore`] never reuses one.
///
/// [`DiskStore`]: crate::DiskStore
/// [`MemoryStore`]: crate::MemoryStore
///
/// # Example
/// ```
/// use cowbtree::storage::page::Cell;
/// use cowbtree::{Node, NodeKind, PageId};
///
/// let child = PageId::new(42);
/// let node = Node::from_cells(NodeKind::Internal, &[Cell::internal(b"k", child)]);
/// assert_eq!(node.child_pointer(0)?, child);
/// # Ok::<(), cowbtree::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl PageId {
    /// Sentinel for "no page". No store hands it out.
    pub const INVALID: PageId = PageId(u64::MAX);

    /// Wrap a raw page number.
    #[inline]
    pub fn new(id: u64) -> Self {
        PageId(id)
    }

    /// Whether this is a real page rather than [`PageId::INVALID`].
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
