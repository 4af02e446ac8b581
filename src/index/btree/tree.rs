//! The [`BTree`] handle: root pointer, store and read paths.

use std::ops::Bound;

use tracing::{debug, trace};

use super::balance::split_cells;
use super::iter::RangeIter;
use super::page_log::PageLog;
use super::search::{search_child, search_leaf};
use crate::common::config::MAX_KEY_SIZE;
use crate::common::{BTreeConfig, Error, PageId, Result};
use crate::storage::page::{Cell, Node, NodeKind};
use crate::storage::PageStore;

/// A copy-on-write B+tree over a [`PageStore`].
///
/// The tree owns nothing but its current root id; every node lives in the
/// store. Mutations never edit an existing page. They build replacement
/// nodes bottom-up, allocate them, switch `root` in one assignment and only
/// then free the replaced pages.
///
/// # Readers
/// [`BTree::root`] is a consistent snapshot of the whole tree. Binding a
/// second handle to it with [`BTree::open`] (for example over `&store`)
/// keeps reading that version for as long as the store keeps its pages.
///
/// # Example
/// ```
/// use cowbtree::{BTree, MemoryStore};
///
/// let mut tree = BTree::create(MemoryStore::new()).unwrap();
/// assert!(tree.insert(b"hello", b"world").unwrap());
/// assert_eq!(tree.get(b"hello").unwrap().as_deref(), Some(&b"world"[..]));
/// assert!(tree.delete(b"hello").unwrap());
/// assert_eq!(tree.get(b"hello").unwrap(), None);
/// ```
pub struct BTree<S: PageStore> {
    pub(crate) root: PageId,
    pub(crate) store: S,
    pub(crate) config: BTreeConfig,
}

impl<S: PageStore> BTree<S> {
    /// Create an empty tree (a single empty leaf) in `store`.
    pub fn create(store: S) -> Result<Self> {
        Self::create_with_config(store, BTreeConfig::default())
    }

    /// Create an empty tree with explicit balancing parameters.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `config` is unusable, or the store's
    /// error if the root page cannot be allocated.
    pub fn create_with_config(store: S, config: BTreeConfig) -> Result<Self> {
        config.validate()?;
        let root = store.allocate(&Node::empty_leaf())?;
        debug!(root = root.0, "created empty tree");
        Ok(Self {
            root,
            store,
            config,
        })
    }

    /// Bind to an existing tree rooted at `root`.
    pub fn open(store: S, root: PageId) -> Self {
        Self {
            root,
            store,
            config: BTreeConfig::default(),
        }
    }

    /// Bind to an existing tree with explicit balancing parameters.
    pub fn open_with_config(store: S, root: PageId, config: BTreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root,
            store,
            config,
        })
    }

    /// Current root page id.
    #[inline]
    pub fn root(&self) -> PageId {
        self.root
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &BTreeConfig {
        &self.config
    }

    /// Give the store back.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Look up `key`.
    ///
    /// Keys longer than `MAX_KEY_SIZE` can never be stored and are reported
    /// as absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        trace!(key_len = key.len(), "get");
        if key.len() > MAX_KEY_SIZE {
            return Ok(None);
        }

        let mut node = self.store.get(self.root)?;
        loop {
            match node.kind() {
                NodeKind::Leaf => {
                    let (found, idx) = search_leaf(&node, key)?;
                    if !found {
                        return Ok(None);
                    }
                    return Ok(Some(node.value(idx)?.to_vec()));
                }
                NodeKind::Internal => {
                    let idx = search_child(&node, key)?;
                    node = self.store.get(node.child_pointer(idx)?)?;
                }
            }
        }
    }

    /// Number of levels (1 for a lone leaf).
    pub fn height(&self) -> Result<usize> {
        let mut height = 1;
        let mut node = self.store.get(self.root)?;
        while !node.is_leaf() {
            node = self.store.get(node.child_pointer(0)?)?;
            height += 1;
        }
        Ok(height)
    }

    /// Iterate over entries with keys between `start` and `end`, in order.
    pub fn scan(&self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> Result<RangeIter<'_, S>> {
        RangeIter::seek(&self.store, self.root, start, end)
    }

    /// Iterate over every entry in key order.
    pub fn iter(&self) -> Result<RangeIter<'_, S>> {
        self.scan(Bound::Unbounded, Bound::Unbounded)
    }

    /// Allocate the replacement(s) of the root, adding levels while there is
    /// more than one. Returns the new root id.
    pub(crate) fn publish_root(
        &self,
        log: &mut PageLog<'_, S>,
        mut nodes: Vec<Node>,
    ) -> Result<PageId> {
        while nodes.len() > 1 {
            let ids = log.alloc_all(&nodes)?;
            let next = {
                let cells = nodes
                    .iter()
                    .zip(&ids)
                    .map(|(node, &id)| Ok(Cell::internal(node.key(0)?, id)))
                    .collect::<Result<Vec<_>>>()?;
                split_cells(NodeKind::Internal, &cells)
            };
            debug!(children = nodes.len(), "root split, tree grows by one level");
            nodes = next;
        }

        match nodes.pop() {
            Some(root) => log.alloc(&root),
            None => Err(Error::CorruptNode("mutation produced no root".to_string())),
        }
    }
}
