//! Storage layer - node pages and where they live.
//!
//! This module handles persistent storage:
//! - [`page`] - Page container and the node format
//! - [`store`] - The [`PageStore`] interface and bundled stores
//! - [`DiskManager`] - Low-level file I/O
//! - [`StoreStats`] - Store statistics

mod disk_manager;
pub mod page;
mod stats;
pub mod store;

pub use disk_manager::DiskManager;
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{DiskStore, MemoryStore, PageStore};
