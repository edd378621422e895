//! Whole-tree consistency checking, used by tests rather than the mutating
//! hot path (which relies on `debug_assert!` at its call sites instead).

use crate::arena::{NodeId, NULL};
use crate::capability::BoundingVolume;
use crate::error::BvhError;
use crate::tree::Tree;

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: BoundingVolume,
{
    /// Walks the whole tree and the free list, checking every invariant:
    ///
    /// * every non-root node's parent actually lists it as a child
    ///   (`SiblingMismatch`) and has a valid parent pointer back
    ///   (`DanglingParent`);
    /// * every internal node's bounding volume contains the union of its
    ///   children's (`BvNotContaining`);
    /// * the number of leaves reachable from the root matches
    ///   `self.len()` (`LeafCountMismatch`);
    /// * the free list visits exactly `capacity - used` slots without
    ///   cycling (`FreeListCorrupt`);
    /// * the root's parent is `NULL`, and every node's leaf/internal
    ///   discriminator is self-consistent: a node with `children[0] == NULL`
    ///   also has `children[1] == NULL` (`SentinelMismatch`).
    ///
    /// Returns the first violation found; does not attempt to report more
    /// than one at a time.
    pub fn validate(&self) -> Result<(), BvhError> {
        if self.root != NULL && self.arena.get(self.root).parent != NULL {
            return Err(BvhError::SentinelMismatch(self.root));
        }

        let mut reachable = 0usize;
        self.validate_subtree(self.root, &mut reachable)?;
        if reachable != self.leaf_count {
            return Err(BvhError::LeafCountMismatch {
                reachable,
                recorded: self.leaf_count,
            });
        }

        let mut visited = 0usize;
        for _ in self.arena.free_list() {
            visited += 1;
            if visited > self.arena.capacity() {
                return Err(BvhError::FreeListCorrupt {
                    visited,
                    expected: self.arena.capacity() - self.arena.used(),
                });
            }
        }
        let expected_free = self.arena.capacity() - self.arena.used();
        if visited != expected_free {
            return Err(BvhError::FreeListCorrupt {
                visited,
                expected: expected_free,
            });
        }

        Ok(())
    }

    fn validate_subtree(&self, node: NodeId, leaves: &mut usize) -> Result<(), BvhError> {
        if node == NULL {
            return Ok(());
        }
        let record = self.arena.get(node);
        if record.is_leaf() {
            if record.children[1] != NULL {
                return Err(BvhError::SentinelMismatch(node));
            }
            *leaves += 1;
            return Ok(());
        }

        let children = record.children;
        for &child in &children {
            if self.arena.get(child).parent != node {
                return Err(BvhError::DanglingParent(child));
            }
        }
        let left = self.arena.get(children[0]);
        let right = self.arena.get(children[1]);
        let combined = left.bv.union(&right.bv);
        if !record.bv.contain(&combined) {
            return Err(BvhError::BvNotContaining(node));
        }

        if children[0] == children[1] {
            return Err(BvhError::SiblingMismatch(node));
        }

        self.validate_subtree(children[0], leaves)?;
        self.validate_subtree(children[1], leaves)
    }
}
