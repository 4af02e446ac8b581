//! Copy-on-write B+tree.
//!
//! # Structure
//! - Leaves hold the `(key, value)` entries in key order.
//! - Internal nodes hold one `(separator, child)` pair per child, where the
//!   separator is the smallest key in that child's subtree. Keys below the
//!   first separator are routed to child 0.
//! - Every node is one page and is never modified once allocated.
//!
//! # Mutation
//! Insert and delete descend from the root, rebuild the touched path
//! bottom-up and return replacement nodes to the caller:
//! - an overflowing node splits into two (three at most),
//! - an underflowing node merges with, or borrows from, a sibling,
//! - the root grows a level on split and collapses while it has one child.
//!
//! Replaced pages are freed only once the new root is in place.

mod balance;
mod delete;
mod insert;
mod iter;
mod page_log;
mod search;
mod tree;
mod verify;

pub use iter::RangeIter;
pub use search::{search_child, search_leaf};
pub use tree::BTree;
pub use verify::TreeShape;
