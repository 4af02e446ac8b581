//! Configuration constants and tree tuning knobs.

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every node must encode into at most this many bytes.
pub const PAGE_SIZE: usize = 4096;

/// Size of the fixed node header (`type` + `nkeys`).
pub const HEADER_SIZE: usize = 4;

/// Maximum key length accepted by the tree.
pub const MAX_KEY_SIZE: usize = 1000;

/// Maximum value length accepted by the tree.
pub const MAX_VALUE_SIZE: usize = 3000;

/// Encoded size of a node holding one maximal entry plus one pointer slot.
///
/// ```text
/// header | pointer | offset | klen + vlen | key  | value
///   4    |    8    |   2    |      4      | 1000 | 3000
/// ```
pub const NODE1_MAX: usize = HEADER_SIZE + 8 + 2 + 4 + MAX_KEY_SIZE + MAX_VALUE_SIZE;

// A single maximal entry must always fit, otherwise a split could never
// produce valid pages.
const _: () = assert!(NODE1_MAX <= PAGE_SIZE);

/// Tunable balancing parameters for a [`BTree`](crate::index::btree::BTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeConfig {
    /// A node whose encoded size falls below this many bytes after a delete
    /// is merged with or refilled from a sibling.
    pub merge_threshold: usize,
}

impl BTreeConfig {
    /// Half a page.
    pub const DEFAULT_MERGE_THRESHOLD: usize = PAGE_SIZE / 2;

    /// Create a config with an explicit merge threshold.
    pub fn new(merge_threshold: usize) -> Self {
        Self { merge_threshold }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the threshold is zero or larger than
    /// a page.
    pub fn validate(&self) -> Result<()> {
        if self.merge_threshold == 0 || self.merge_threshold > PAGE_SIZE {
            return Err(Error::InvalidConfig(format!(
                "merge_threshold must be in 1..={}, got {}",
                PAGE_SIZE, self.merge_threshold
            )));
        }
        Ok(())
    }
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MERGE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_single_entry_fits() {
        assert_eq!(NODE1_MAX, 4018);
        assert!(NODE1_MAX <= PAGE_SIZE);
    }

    #[test]
    fn test_default_config() {
        let config = BTreeConfig::default();
        assert_eq!(config.merge_threshold, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            BTreeConfig::new(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(BTreeConfig::new(PAGE_SIZE + 1).validate().is_err());
        assert!(BTreeConfig::new(PAGE_SIZE).validate().is_ok());
    }
}
