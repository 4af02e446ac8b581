//! Node - a B+tree node encoded in the on-disk page format.
//!
//! # Layout
//! ```text
//! | type | nkeys | pointers   | offsets    | entries ...
//! | 2B   | 2B    | nkeys * 8B | nkeys * 2B |
//! ```
//! Pointers are present only in internal nodes. `offsets[i]` is the end of
//! entry `i` relative to the start of the entry region. Each entry is
//! `| klen 2B | vlen 2B | key | value |`. All integers are little-endian.
//!
//! A [`Node`] holds exactly the encoded bytes of one node (no page padding),
//! so [`Node::encode`] and [`Node::decode`] are inverses.

use crate::common::{Error, PageId, Result};
use crate::storage::page::layout::{
    entry_size, slot_size, NodeHeader, NodeKind, ENTRY_PREFIX_SIZE, OFFSET_SIZE, POINTER_SIZE,
};
use crate::storage::page::Page;

/// A borrowed view of one node entry.
///
/// For internal nodes `child` is set and `value` is empty; for leaves
/// `child` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
    pub child: Option<PageId>,
}

impl<'a> Cell<'a> {
    /// A leaf entry.
    pub fn leaf(key: &'a [u8], value: &'a [u8]) -> Self {
        Self {
            key,
            value,
            child: None,
        }
    }

    /// An internal entry pointing at `child`.
    pub fn internal(key: &'a [u8], child: PageId) -> Self {
        Self {
            key,
            value: &[],
            child: Some(child),
        }
    }

    /// Bytes this cell adds to a node of `kind`.
    #[inline]
    pub fn encoded_size(&self, kind: NodeKind) -> usize {
        slot_size(kind) + entry_size(self.key.len(), self.value.len())
    }
}

/// An immutable-by-convention node buffer.
///
/// Nodes handed to a page store are never modified again; mutation builds a
/// new node through [`NodeBuilder`].
#[derive(Clone, PartialEq, Eq)]
pub struct Node {
    data: Vec<u8>,
}

impl Node {
    /// Create an empty leaf (the root of an empty tree).
    pub fn empty_leaf() -> Self {
        NodeBuilder::new(NodeKind::Leaf).build()
    }

    /// Build a node of `kind` from a run of cells.
    pub fn from_cells(kind: NodeKind, cells: &[Cell<'_>]) -> Self {
        let mut builder = NodeBuilder::with_capacity(kind, cells.len());
        for cell in cells {
            builder.push(*cell);
        }
        builder.build()
    }

    /// Parse a node from `bytes`, validating the whole structure.
    ///
    /// `bytes` may be longer than the node (for example a full page); only
    /// the used prefix is kept.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` if the type is unknown, or if the declared
    /// key count, offsets or entry lengths would read past the end of
    /// `bytes` or disagree with each other.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = NodeHeader::from_bytes(bytes)?;
        let nkeys = header.nkeys as usize;
        let entries_start = header.entries_start();

        if entries_start > bytes.len() {
            return Err(Error::CorruptNode(format!(
                "{} keys need {} bytes of slots, buffer has {}",
                nkeys,
                entries_start,
                bytes.len()
            )));
        }

        let offsets_start = header.offsets_start();
        let mut prev_end = 0usize;
        for i in 0..nkeys {
            let end = read_u16(bytes, offsets_start + OFFSET_SIZE * i) as usize;
            let pos = entries_start + prev_end;

            if pos + ENTRY_PREFIX_SIZE > bytes.len() {
                return Err(Error::CorruptNode(format!(
                    "entry {} header at byte {} is past the buffer end",
                    i, pos
                )));
            }
            let klen = read_u16(bytes, pos) as usize;
            let vlen = read_u16(bytes, pos + 2) as usize;

            let expected = prev_end + entry_size(klen, vlen);
            if end != expected {
                return Err(Error::CorruptNode(format!(
                    "offset {} of entry {} disagrees with entry lengths (expected {})",
                    end, i, expected
                )));
            }
            if entries_start + end > bytes.len() {
                return Err(Error::CorruptNode(format!(
                    "entry {} ends at byte {}, buffer has {}",
                    i,
                    entries_start + end,
                    bytes.len()
                )));
            }
            prev_end = end;
        }

        Ok(Self {
            data: bytes[..entries_start + prev_end].to_vec(),
        })
    }

    /// The encoded bytes of this node.
    #[inline]
    pub fn encode(&self) -> &[u8] {
        &self.data
    }

    /// Copy the node into a zero-padded page.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` if the node does not fit a page.
    pub fn to_page(&self) -> Result<Page> {
        Page::from_prefix(&self.data)
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn header(&self) -> NodeHeader {
        // Every constructor validates the header, so the type is known.
        let raw = read_u16(&self.data, NodeHeader::OFFSET_TYPE);
        let kind = if raw == NodeKind::Internal as u16 {
            NodeKind::Internal
        } else {
            NodeKind::Leaf
        };
        NodeHeader::new(kind, read_u16(&self.data, NodeHeader::OFFSET_NKEYS))
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.header().kind
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.kind() == NodeKind::Leaf
    }

    /// Number of entries.
    #[inline]
    pub fn key_count(&self) -> usize {
        read_u16(&self.data, NodeHeader::OFFSET_NKEYS) as usize
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.key_count();
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        Ok(())
    }

    fn check_pointer(&self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if !self.kind().has_pointers() {
            // Leaves have no pointer slots at all.
            return Err(Error::OutOfBounds { index, len: 0 });
        }
        Ok(())
    }

    /// Child page id at `index` (internal nodes only).
    ///
    /// # Errors
    /// Returns `Error::OutOfBounds` if `index >= key_count()` or the node is
    /// a leaf.
    pub fn child_pointer(&self, index: usize) -> Result<PageId> {
        self.check_pointer(index)?;
        Ok(PageId::new(read_u64(&self.data, NodeHeader::pointer_pos(index))))
    }

    /// Overwrite the child page id at `index`.
    ///
    /// Only valid on a node that has not been handed to a page store yet.
    ///
    /// # Errors
    /// Returns `Error::OutOfBounds` if `index >= key_count()` or the node is
    /// a leaf.
    pub fn set_child_pointer(&mut self, index: usize, id: PageId) -> Result<()> {
        self.check_pointer(index)?;
        let pos = NodeHeader::pointer_pos(index);
        self.data[pos..pos + POINTER_SIZE].copy_from_slice(&id.0.to_le_bytes());
        Ok(())
    }

    /// Start of entry `index` relative to the entry region.
    ///
    /// `index == key_count()` is accepted and yields the end of the last
    /// entry.
    ///
    /// # Errors
    /// Returns `Error::OutOfBounds` if `index > key_count()`.
    pub fn entry_offset(&self, index: usize) -> Result<usize> {
        let len = self.key_count();
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        if index == 0 {
            return Ok(0);
        }
        let pos = self.header().offsets_start() + OFFSET_SIZE * (index - 1);
        Ok(read_u16(&self.data, pos) as usize)
    }

    /// Absolute position of entry `index` and its key/value lengths.
    fn entry_bounds(&self, index: usize) -> Result<(usize, usize, usize)> {
        self.check_index(index)?;
        let pos = self.header().entries_start() + self.entry_offset(index)?;
        let klen = read_u16(&self.data, pos) as usize;
        let vlen = read_u16(&self.data, pos + 2) as usize;
        Ok((pos + ENTRY_PREFIX_SIZE, klen, vlen))
    }

    /// Key of entry `index`.
    ///
    /// # Errors
    /// Returns `Error::OutOfBounds` if `index >= key_count()`.
    pub fn key(&self, index: usize) -> Result<&[u8]> {
        let (start, klen, _) = self.entry_bounds(index)?;
        Ok(&self.data[start..start + klen])
    }

    /// Value of entry `index`. Always empty for internal nodes.
    ///
    /// # Errors
    /// Returns `Error::OutOfBounds` if `index >= key_count()`.
    pub fn value(&self, index: usize) -> Result<&[u8]> {
        let (start, klen, vlen) = self.entry_bounds(index)?;
        Ok(&self.data[start + klen..start + klen + vlen])
    }

    /// Borrow entry `index` as a [`Cell`].
    pub fn cell(&self, index: usize) -> Result<Cell<'_>> {
        let (start, klen, vlen) = self.entry_bounds(index)?;
        let child = if self.kind().has_pointers() {
            Some(self.child_pointer(index)?)
        } else {
            None
        };
        Ok(Cell {
            key: &self.data[start..start + klen],
            value: &self.data[start + klen..start + klen + vlen],
            child,
        })
    }

    /// All entries in order.
    pub fn cells(&self) -> Result<Vec<Cell<'_>>> {
        (0..self.key_count()).map(|i| self.cell(i)).collect()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("nkeys", &self.key_count())
            .field("size", &self.size())
            .finish()
    }
}

/// Incrementally assembles a node.
///
/// Pointer, offset and entry regions are accumulated separately and joined
/// by [`NodeBuilder::build`].
pub struct NodeBuilder {
    kind: NodeKind,
    pointers: Vec<u8>,
    offsets: Vec<u8>,
    entries: Vec<u8>,
    nkeys: u16,
}

impl NodeBuilder {
    pub fn new(kind: NodeKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: NodeKind, cells: usize) -> Self {
        let pointers = if kind.has_pointers() {
            Vec::with_capacity(POINTER_SIZE * cells)
        } else {
            Vec::new()
        };
        Self {
            kind,
            pointers,
            offsets: Vec::with_capacity(OFFSET_SIZE * cells),
            entries: Vec::new(),
            nkeys: 0,
        }
    }

    /// Append one entry. Keys must be pushed in increasing order.
    ///
    /// # Panics
    /// Panics if the node would exceed the addressable size of the format
    /// (u16 offsets), which the tree never approaches.
    pub fn push(&mut self, cell: Cell<'_>) -> &mut Self {
        if self.kind.has_pointers() {
            let child = cell.child.unwrap_or(PageId::INVALID);
            self.pointers.extend_from_slice(&child.0.to_le_bytes());
        }

        self.entries
            .extend_from_slice(&(cell.key.len() as u16).to_le_bytes());
        self.entries
            .extend_from_slice(&(cell.value.len() as u16).to_le_bytes());
        self.entries.extend_from_slice(cell.key);
        self.entries.extend_from_slice(cell.value);

        assert!(
            self.entries.len() <= u16::MAX as usize,
            "node entry region exceeds u16 range"
        );
        self.offsets
            .extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
        self.nkeys += 1;
        self
    }

    /// Encoded size of the node built so far.
    pub fn size(&self) -> usize {
        NodeHeader::SIZE + self.pointers.len() + self.offsets.len() + self.entries.len()
    }

    pub fn build(self) -> Node {
        let mut data = vec![0u8; NodeHeader::SIZE];
        NodeHeader::new(self.kind, self.nkeys).write_to(&mut data);
        data.reserve(self.pointers.len() + self.offsets.len() + self.entries.len());
        data.extend_from_slice(&self.pointers);
        data.extend_from_slice(&self.offsets);
        data.extend_from_slice(&self.entries);
        Node { data }
    }
}

#[inline]
fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

#[inline]
fn read_u64(data: &[u8], pos: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[pos..pos + 8]);
    u64::from_le_bytes(buf)
}

// ============================================================================
// TESTS
// ============================================================================
