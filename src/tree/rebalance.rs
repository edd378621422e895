//! Whole-tree refit and the two rebalancing strategies: a full rebuild
//! (bottom-up or top-down) and a bounded incremental walk that nudges a
//! handful of leaves back toward their locally-optimal placement each call.

use std::mem;

use tracing::{debug, instrument};

use crate::arena::{NodeId, NULL};
use crate::capability::BoundingVolume;

use super::Tree;

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: BoundingVolume,
    Payload: Default,
{
    /// Recomputes every internal node's bounding volume as the union of its
    /// children's, unconditionally (no containment/equality cutoff) —
    /// unlike the incremental refit walks in `mutate.rs`, this always
    /// revisits the whole tree. Used after the Morton batch builders, which
    /// build topology without setting internal bounding volumes.
    #[instrument(skip(self))]
    pub fn refit(&mut self) {
        if self.root != NULL {
            self.refit_subtree(self.root);
        }
    }

    /// Only ever called with a valid node: the top-level call is guarded by
    /// [`Self::refit`], and an internal node's `children` are never `NULL`.
    fn refit_subtree(&mut self, node: NodeId) -> Bv {
        if self.arena.get(node).is_leaf() {
            return self.arena.get(node).bv;
        }
        let children = self.arena.get(node).children;
        let left = self.refit_subtree(children[0]);
        let right = self.refit_subtree(children[1]);
        let combined = left.union(&right);
        self.arena.get_mut(node).bv = combined;
        combined
    }

    /// Discards the current topology and rebuilds it from scratch with the
    /// bottom-up greedy builder, keeping every current leaf's bounding
    /// volume and payload.
    #[instrument(skip(self))]
    pub fn balance_bottomup(&mut self) {
        let leaves = self.drain_leaves();
        self.rebuild_from(leaves, |tree, ids| tree.bottomup(ids));
    }

    /// Discards the current topology and rebuilds it from scratch with the
    /// top-down builder (`topdown_0`/`topdown_1` per `topdown_level`,
    /// bottoming out at [`Self::bottomup`] below `bu_threshold`), keeping
    /// every current leaf's bounding volume and payload.
    #[instrument(skip(self))]
    pub fn balance_topdown(&mut self) {
        let leaves = self.drain_leaves();
        self.rebuild_from(leaves, |tree, ids| tree.topdown(ids));
    }

    /// Locally re-optimizes a bounded number of leaves without touching the
    /// rest of the tree: each call descends from the root, using
    /// successive bits of a rolling path counter (`opath`) to choose a
    /// child at each internal node, until it reaches a leaf, then
    /// re-inserts that leaf via [`Self::reinsert`]. Repeats `iterations`
    /// times (or `self.len()` times if `iterations < 0`), advancing `opath`
    /// by one between iterations so consecutive calls visit different
    /// leaves.
    #[instrument(skip(self))]
    pub fn balance_incremental(&mut self, iterations: i32) {
        if self.leaf_count == 0 {
            debug!("balance_incremental called on an empty tree, skipping");
            return;
        }
        let iterations = if iterations < 0 { self.leaf_count as i32 } else { iterations };
        for _ in 0..iterations {
            let leaf = self.walk_opath();
            self.reinsert(leaf, 0);
            self.opath = self.opath.wrapping_add(1);
        }
    }

    /// Descends from the root choosing `children[bit]` at each internal
    /// node, where `bit` is successive bits of `self.opath` (least
    /// significant first, wrapping once the node depth exceeds 32), until a
    /// leaf is reached.
    fn walk_opath(&self) -> NodeId {
        let mut current = self.root;
        let mut depth = 0u32;
        while !self.arena.get(current).is_leaf() {
            let bit = (self.opath >> (depth % 32)) & 1;
            current = self.arena.get(current).children[bit as usize];
            depth += 1;
        }
        current
    }

    /// Removes every leaf from the tree, returning its `(bv, payload)` pair
    /// in depth-first order, and resets the tree to empty. Used by the two
    /// full-rebuild strategies, which need to move `Payload` out (not
    /// assumed `Copy`) before discarding the old topology.
    fn drain_leaves(&mut self) -> Vec<(Bv, Payload)> {
        let mut out = Vec::with_capacity(self.leaf_count);
        self.drain_subtree(self.root, &mut out);
        out
    }

    fn drain_subtree(&mut self, node: NodeId, out: &mut Vec<(Bv, Payload)>) {
        if node == NULL {
            return;
        }
        if self.arena.get(node).is_leaf() {
            let record = self.arena.get_mut(node);
            out.push((record.bv, mem::take(&mut record.payload)));
            return;
        }
        let children = self.arena.get(node).children;
        self.drain_subtree(children[0], out);
        self.drain_subtree(children[1], out);
    }
}
