//! Page - the fixed 4KB unit a node is stored in.
//!
//! A [`Page`] is a raw, zero-padded 4KB byte array. Disk-backed stores move
//! whole pages; a [`Node`](super::Node) occupies its used prefix and the
//! tail stays zero.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};

/// A page of data (4KB, 4KB-aligned).
///
/// # Memory Layout
/// - Size: 4096 bytes (4KB)
/// - Alignment: 4096 bytes (for efficient Direct I/O with O_DIRECT)
///
/// `Page` is deliberately not `Clone`; it only exists on the way between a
/// node and the file.
///
/// # Example
/// ```
/// use cowbtree::storage::page::Page;
///
/// let page = Page::from_prefix(b"\x02\x00\x00\x00").unwrap();
/// assert_eq!(&page.as_slice()[..4], b"\x02\x00\x00\x00");
/// assert!(page.as_slice()[4..].iter().all(|&b| b == 0));
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Copy `bytes` to the start of a zeroed page.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` if `bytes` is longer than a page.
    pub fn from_prefix(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > PAGE_SIZE {
            return Err(Error::CorruptNode(format!(
                "node of {} bytes does not fit a {} byte page",
                bytes.len(),
                PAGE_SIZE
            )));
        }
        let mut page = Self::new();
        page.data[..bytes.len()].copy_from_slice(bytes);
        Ok(page)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// CRC32 of the full page contents.
    ///
    /// The node format has no spare header bytes, so stores keep the
    /// checksum next to the page rather than inside it.
    pub fn checksum(&self) -> u32 {
        crc32fast::hash(&self.data)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_from_prefix_zero_pads() {
        let page = Page::from_prefix(&[7u8; 100]).unwrap();
        assert!(page.as_slice()[..100].iter().all(|&b| b == 7));
        assert!(page.as_slice()[100..].iter().all(|&b| b == 0));

        let full = Page::from_prefix(&[1u8; PAGE_SIZE]).unwrap();
        assert_eq!(full.as_slice()[PAGE_SIZE - 1], 1);
    }

    #[test]
    fn test_from_prefix_rejects_oversize() {
        assert!(matches!(
            Page::from_prefix(&[0u8; PAGE_SIZE + 1]),
            Err(Error::CorruptNode(_))
        ));
    }

    #[test]
    fn test_checksum_changes_with_data() {
        let mut page = Page::new();
        let before = page.checksum();
        assert_eq!(before, Page::new().checksum());

        page.as_mut_slice()[500] = 0xFE;
        assert_ne!(before, page.checksum());
    }
}
