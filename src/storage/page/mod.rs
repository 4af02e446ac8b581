//! Page types and the node format.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`layout`] - Header and region positions of the node format
//! - [`Node`] / [`NodeBuilder`] - Encoded B+tree nodes

pub mod layout;
mod node;
#[allow(clippy::module_inception)]
mod page;

pub use layout::{NodeHeader, NodeKind};
pub use node::{Cell, Node, NodeBuilder};
pub use page::Page;
