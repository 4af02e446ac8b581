//! Disk Manager - low-level file I/O for node pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing checksummed page slots
//! - Appending new slots
//! - Flushing the file to durable storage

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Bytes of CRC32 trailer stored after every page.
const CHECKSUM_SIZE: usize = 4;

/// On-disk size of one page slot.
pub const SLOT_SIZE: usize = PAGE_SIZE + CHECKSUM_SIZE;

/// Manages disk I/O for a single page file.
///
/// # File Layout
/// Pages are laid out sequentially, each followed by its checksum:
/// ```text
/// ┌──────────────┬──────────────┬─────────┬──────────────┐
/// │ Page 0 | crc │ Page 1 | crc │  ...    │ Page N | crc │
/// └──────────────┴──────────────┴─────────┴──────────────┘
/// Offset:  0       4100           ...      N×4100
/// ```
///
/// A trailing partial slot (a torn append) is ignored on open.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. [`DiskStore`](super::DiskStore)
/// serializes access to it.
///
/// # Durability
/// Writes go to the OS page cache; [`DiskManager::sync`] flushes them.
pub struct DiskManager {
    file: File,
    /// Number of complete slots in the file.
    page_count: u64,
}

impl DiskManager {
    /// Create a new page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
        })
    }

    /// Open an existing page file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let page_count = file.metadata()?.len() / SLOT_SIZE as u64;
        Ok(Self { file, page_count })
    }

    /// Open the page file at `path`, creating it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    #[inline]
    fn slot_offset(page_id: PageId) -> u64 {
        page_id.0 * SLOT_SIZE as u64
    }

    fn check_slot(&self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }
        Ok(())
    }

    fn write_slot(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::slot_offset(page_id)))?;
        self.file.write_all(page.as_slice())?;
        self.file.write_all(&page.checksum().to_le_bytes())?;
        Ok(())
    }

    /// Read a page from disk and verify its checksum.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the slot doesn't exist
    /// - `Error::ChecksumMismatch` if the stored checksum is wrong
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        self.check_slot(page_id)?;
        self.file.seek(SeekFrom::Start(Self::slot_offset(page_id)))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;
        let mut trailer = [0u8; CHECKSUM_SIZE];
        self.file.read_exact(&mut trailer)?;

        let stored = u32::from_le_bytes(trailer);
        let computed = page.checksum();
        if stored != computed {
            return Err(Error::ChecksumMismatch {
                page: page_id.0,
                stored,
                computed,
            });
        }
        Ok(page)
    }

    /// Overwrite an existing slot.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the slot hasn't been appended yet.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_slot(page_id)?;
        self.write_slot(page_id, page)
    }

    /// Append `page` as a new slot at the end of the file.
    ///
    /// Returns the `PageId` of the new slot.
    pub fn append_page(&mut self, page: &Page) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);
        self.write_slot(page_id, page)?;
        self.page_count += 1;
        Ok(page_id)
    }

    /// Flush file contents to durable storage (fsync).
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Number of slots in the file.
    #[inline]
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Total size of the used slots in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.page_count * SLOT_SIZE as u64
    }
}
