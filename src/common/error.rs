//! Error types for cowbtree.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the tree, its node format and the bundled
/// page stores.
///
/// Nothing here is retried or absorbed internally. `CorruptNode` and
/// `OutOfBounds` indicate a broken page or a broken tree invariant and are
/// surfaced as-is.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a disk-backed page store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key exceeds `MAX_KEY_SIZE`. Rejected before any page is touched.
    #[error("key of {len} bytes exceeds maximum of {max}")]
    KeyTooLarge { len: usize, max: usize },

    /// Value exceeds `MAX_VALUE_SIZE`. Rejected before any page is touched.
    #[error("value of {len} bytes exceeds maximum of {max}")]
    ValueTooLarge { len: usize, max: usize },

    /// A buffer does not hold a structurally valid node.
    #[error("corrupt node: {0}")]
    CorruptNode(String),

    /// A node accessor was called with an index outside its valid range.
    #[error("index {index} out of bounds for node with {len} keys")]
    OutOfBounds { index: usize, len: usize },

    /// Requested page does not exist in the store.
    #[error("Page {0} not found")]
    PageNotFound(u64),

    /// Stored page checksum does not match its contents.
    #[error("checksum mismatch on page {page}: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        page: u64,
        stored: u32,
        computed: u32,
    },

    /// Tree configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
