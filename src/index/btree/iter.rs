//! Ordered range iteration.

use std::ops::Bound;

use super::search::{search_child, search_leaf};
use crate::common::{PageId, Result};
use crate::storage::page::Node;
use crate::storage::PageStore;

/// Iterator over `(key, value)` pairs of one tree version, in key order.
///
/// Holds the root-to-leaf path as a stack of `(node, next index)` pairs.
/// Pages are loaded lazily, one child at a time. After the first error the
/// iterator is exhausted.
pub struct RangeIter<'a, S: PageStore> {
    store: &'a S,
    stack: Vec<(Node, usize)>,
    end: Bound<Vec<u8>>,
}

impl<'a, S: PageStore> RangeIter<'a, S> {
    /// Position at the first entry of the tree rooted at `root` that
    /// satisfies `start`.
    pub(crate) fn seek(
        store: &'a S,
        root: PageId,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
    ) -> Result<Self> {
        let mut stack = Vec::new();
        let mut node = store.get(root)?;
        while !node.is_leaf() {
            let idx = match start {
                Bound::Included(key) | Bound::Excluded(key) => search_child(&node, key)?,
                Bound::Unbounded => 0,
            };
            let child = store.get(node.child_pointer(idx)?)?;
            stack.push((node, idx));
            node = child;
        }

        let idx = match start {
            Bound::Included(key) => search_leaf(&node, key)?.1,
            Bound::Excluded(key) => match search_leaf(&node, key)? {
                (true, i) => i + 1,
                (false, i) => i,
            },
            Bound::Unbounded => 0,
        };
        stack.push((node, idx));

        Ok(Self {
            store,
            stack,
            end: end.map(|k| k.to_vec()),
        })
    }

    fn step(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        loop {
            let Some((node, idx)) = self.stack.last_mut() else {
                return Ok(None);
            };

            if *idx >= node.key_count() {
                self.stack.pop();
                if let Some((_, parent_idx)) = self.stack.last_mut() {
                    *parent_idx += 1;
                }
                continue;
            }

            if node.is_leaf() {
                let key = node.key(*idx)?;
                if !before_end(&self.end, key) {
                    self.stack.clear();
                    return Ok(None);
                }
                let item = (key.to_vec(), node.value(*idx)?.to_vec());
                *idx += 1;
                return Ok(Some(item));
            }

            let child = self.store.get(node.child_pointer(*idx)?)?;
            self.stack.push((child, 0));
        }
    }
}

fn before_end(end: &Bound<Vec<u8>>, key: &[u8]) -> bool {
    match end {
        Bound::Included(end) => key <= end.as_slice(),
        Bound::Excluded(end) => key < end.as_slice(),
        Bound::Unbounded => true,
    }
}

impl<S: PageStore> Iterator for RangeIter<'_, S> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(item) => item.map(Ok),
            Err(e) => {
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}
