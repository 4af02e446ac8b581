//! cowbtree - a copy-on-write B+tree over fixed-size binary pages.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            cowbtree                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Index Layer (index/)                     │   │
//! │  │   BTree: get / insert / delete / scan / check_invariants │   │
//! │  │      search → split | merge | redistribute → PageLog     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │             PageStore trait (storage/store/)             │   │
//! │  │        MemoryStore  ←─OR─→  DiskStore (+ StoreStats)     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │     Node + NodeHeader (page/) + DiskManager (CRC32)      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config)
//! - [`storage`] - Node format, page stores and disk I/O
//! - [`index`] - The B+tree itself
//!
//! # Quick Start
//! ```
//! use cowbtree::{BTree, MemoryStore};
//!
//! let mut tree = BTree::create(MemoryStore::new()).unwrap();
//! tree.insert(b"apple", b"red").unwrap();
//! tree.insert(b"banana", b"yellow").unwrap();
//!
//! assert_eq!(tree.get(b"apple").unwrap(), Some(b"red".to_vec()));
//! let keys: Vec<Vec<u8>> = tree.iter().unwrap().map(|e| e.unwrap().0).collect();
//! assert_eq!(keys, vec![b"apple".to_vec(), b"banana".to_vec()]);
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_SIZE};
pub use common::{BTreeConfig, Error, PageId, Result};

pub use index::{BTree, RangeIter, TreeShape};
pub use storage::page::{Node, NodeKind, Page};
pub use storage::{DiskManager, DiskStore, MemoryStore, PageStore, StatsSnapshot, StoreStats};
