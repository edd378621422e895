//! Read-only structural queries: height, depth, and leaf enumeration.

use crate::arena::{NodeId, NULL};
use crate::capability::BoundingVolume;

use super::Tree;

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: BoundingVolume,
{
    /// Height of the tree: the number of edges on the longest root-to-leaf
    /// path. `0` for an empty tree or a single-leaf tree.
    pub fn max_height(&self) -> usize {
        self.height_of(self.root)
    }

    fn height_of(&self, node: NodeId) -> usize {
        if node == NULL || self.arena.get(node).is_leaf() {
            return 0;
        }
        let children = self.arena.get(node).children;
        1 + self.height_of(children[0]).max(self.height_of(children[1]))
    }

    /// Depth of the deepest leaf: identical to [`Self::max_height`] for a
    /// strictly binary tree (every internal node has exactly two children),
    /// kept as a distinct named operation because the original interface
    /// exposes depth and height separately.
    pub fn max_depth(&self) -> usize {
        self.max_height()
    }

    /// Appends every leaf reachable from `root` to `out`, in depth-first
    /// (in-order) traversal order. Does not clear `out` first, so callers
    /// can accumulate across multiple subtrees.
    pub fn extract_leaves(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if root == NULL {
            return;
        }
        if self.arena.get(root).is_leaf() {
            out.push(root);
            return;
        }
        let children = self.arena.get(root).children;
        self.extract_leaves(children[0], out);
        self.extract_leaves(children[1], out);
    }
}
