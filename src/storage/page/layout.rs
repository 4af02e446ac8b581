//! Node header and type definitions.
//!
//! Every node starts with a 4-byte header:
//! - [`NodeKind`] discriminator
//! - number of keys
//!
//! followed by the pointer, offset and entry regions whose positions are
//! derived from the header by the helpers on [`NodeHeader`].

use crate::common::config::HEADER_SIZE;
use crate::common::{Error, Result};

/// Size of one child pointer slot.
pub const POINTER_SIZE: usize = 8;

/// Size of one offset slot.
pub const OFFSET_SIZE: usize = 2;

/// Size of the `keylen` + `vallen` prefix of every entry.
pub const ENTRY_PREFIX_SIZE: usize = 4;

/// Kind of node stored in a page.
///
/// Uses `#[repr(u16)]` to match the 2-byte on-disk discriminator.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Internal (non-leaf) node: entries are separator keys with child pointers.
    Internal = 1,
    /// Leaf node: entries are key-value pairs.
    Leaf = 2,
}

impl NodeKind {
    /// Convert from the on-disk discriminator.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` for unknown values.
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            1 => Ok(NodeKind::Internal),
            2 => Ok(NodeKind::Leaf),
            other => Err(Error::CorruptNode(format!("unknown node type {}", other))),
        }
    }

    /// Whether nodes of this kind carry a pointer region.
    #[inline]
    pub fn has_pointers(self) -> bool {
        self == NodeKind::Internal
    }
}

/// The fixed header at the start of every node.
///
/// # Layout (4 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       2     type (NodeKind as u16, little-endian)
/// 2       2     nkeys (little-endian)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub kind: NodeKind,
    pub nkeys: u16,
}

impl NodeHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = HEADER_SIZE;

    /// Offset of each field within the header.
    pub const OFFSET_TYPE: usize = 0;
    pub const OFFSET_NKEYS: usize = 2;

    pub fn new(kind: NodeKind, nkeys: u16) -> Self {
        Self { kind, nkeys }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` if the slice is shorter than the header
    /// or the type is unknown.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::CorruptNode(format!(
                "buffer of {} bytes is too small for a node header",
                data.len()
            )));
        }

        let raw_kind = u16::from_le_bytes([data[Self::OFFSET_TYPE], data[Self::OFFSET_TYPE + 1]]);
        let nkeys = u16::from_le_bytes([data[Self::OFFSET_NKEYS], data[Self::OFFSET_NKEYS + 1]]);

        Ok(Self {
            kind: NodeKind::from_u16(raw_kind)?,
            nkeys,
        })
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < NodeHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for NodeHeader");

        data[Self::OFFSET_TYPE..Self::OFFSET_TYPE + 2]
            .copy_from_slice(&(self.kind as u16).to_le_bytes());
        data[Self::OFFSET_NKEYS..Self::OFFSET_NKEYS + 2].copy_from_slice(&self.nkeys.to_le_bytes());
    }

    /// Byte position of pointer slot `i`.
    #[inline]
    pub fn pointer_pos(i: usize) -> usize {
        Self::SIZE + POINTER_SIZE * i
    }

    /// Byte position of the offset region.
    #[inline]
    pub fn offsets_start(&self) -> usize {
        let pointers = if self.kind.has_pointers() {
            POINTER_SIZE * self.nkeys as usize
        } else {
            0
        };
        Self::SIZE + pointers
    }

    /// Byte position of the first entry.
    #[inline]
    pub fn entries_start(&self) -> usize {
        self.offsets_start() + OFFSET_SIZE * self.nkeys as usize
    }
}

/// Encoded size of a single entry (prefix, key and value).
#[inline]
pub fn entry_size(key_len: usize, val_len: usize) -> usize {
    ENTRY_PREFIX_SIZE + key_len + val_len
}

/// Per-entry overhead outside of the entry region (pointer and offset slots).
#[inline]
pub fn slot_size(kind: NodeKind) -> usize {
    if kind.has_pointers() {
        POINTER_SIZE + OFFSET_SIZE
    } else {
        OFFSET_SIZE
    }
}

// ============================================================================
// TESTS
// ============================================================================
