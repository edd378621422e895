//! Online insertion, removal, and bounding-volume updates.
//!
//! These are the operations the outer collision manager drives continuously
//! as objects move: a local sibling-selection heuristic picks where a new
//! leaf descends to, and an ancestor refit walk stops as soon as
//! containment (or, for removal, exact equality) is already satisfied —
//! this cutoff is what keeps incremental edits amortised `O(log n)` instead
//! of touching every ancestor on every call.

use nalgebra::Vector3;
use tracing::instrument;

use crate::arena::{NodeId, NULL};
use crate::capability::BoundingVolume;

use super::Tree;

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: BoundingVolume,
    Payload: Default,
{
    /// Inserts a new leaf carrying `bv` and `payload`, returning its index.
    #[instrument(skip(self, bv, payload))]
    pub fn insert(&mut self, bv: Bv, payload: Payload) -> NodeId {
        let leaf = self.arena.allocate();
        {
            let record = self.arena.get_mut(leaf);
            record.bv = bv;
            record.payload = payload;
        }
        self.leaf_count += 1;
        if self.root == NULL {
            self.root = leaf;
        } else {
            self.insert_leaf(self.root, leaf);
        }
        leaf
    }

    /// Removes `leaf` from the tree entirely, freeing its arena slot.
    ///
    /// `leaf` must currently be an allocated leaf node; this is a
    /// precondition enforced with `debug_assert!`, not a recoverable error
    /// (see `spec.md` §7).
    #[instrument(skip(self))]
    pub fn remove(&mut self, leaf: NodeId) {
        debug_assert!(self.arena.get(leaf).is_leaf());
        self.detach_leaf(leaf);
        self.arena.release(leaf);
        self.leaf_count -= 1;
    }

    /// Topology-only update: detaches `leaf` and reinserts it, optionally
    /// climbing `lookahead_level` ancestors from the removal anchor first to
    /// widen the region searched for a new sibling. `lookahead_level < 0` is
    /// treated as `0` (no climb, reinsert directly at the anchor).
    #[instrument(skip(self))]
    pub fn reinsert(&mut self, leaf: NodeId, lookahead_level: i32) {
        debug_assert!(self.arena.get(leaf).is_leaf());
        let anchor = self.detach_leaf(leaf);
        let start = self.climb(anchor, lookahead_level.max(0));
        self.insert_leaf_or_set_root(start, leaf);
    }

    /// Updates `leaf`'s bounding volume to `new_bv`. If the leaf's current
    /// bounding volume already contains `new_bv`, this is a no-op and
    /// returns `false`. Otherwise the leaf is detached, its bounding volume
    /// is overwritten, the removal anchor is climbed by
    /// `self.max_lookahead_level` ancestors, and the leaf is reinserted;
    /// returns `true`.
    #[instrument(skip(self, new_bv))]
    pub fn update_bv(&mut self, leaf: NodeId, new_bv: Bv) -> bool {
        debug_assert!(self.arena.get(leaf).is_leaf());
        if self.arena.get(leaf).bv.contain(&new_bv) {
            return false;
        }
        self.arena.get_mut(leaf).bv = new_bv;
        let anchor = self.detach_leaf(leaf);
        let start = self.climb(anchor, self.max_lookahead_level.max(0));
        self.insert_leaf_or_set_root(start, leaf);
        true
    }

    /// Behaviourally identical to [`Self::update_bv`]: `velocity` is a
    /// semantic hint for motion-predictive BV inflation that the original
    /// implementation accepts but never applies, and this crate
    /// intentionally replicates that rather than guessing at the intended
    /// expansion (see `spec.md` §9).
    #[allow(unused_variables)]
    pub fn update_bv_with_velocity(&mut self, leaf: NodeId, new_bv: Bv, velocity: Vector3<Bv::S>) -> bool {
        self.update_bv(leaf, new_bv)
    }

    /// Behaviourally identical to [`Self::update_bv`]: both `velocity` and
    /// `margin` are accepted and unused, matching the original
    /// implementation (see `spec.md` §9).
    #[allow(unused_variables)]
    pub fn update_bv_with_velocity_and_margin(
        &mut self,
        leaf: NodeId,
        new_bv: Bv,
        velocity: Vector3<Bv::S>,
        margin: Bv::S,
    ) -> bool {
        self.update_bv(leaf, new_bv)
    }

    /// Descends from `start` choosing, at each internal node, the child
    /// returned by [`BoundingVolume::select_child`], until a leaf (the
    /// target sibling) is reached. Splices a new internal node in place of
    /// that leaf, with the target leaf and `leaf` as its two children, then
    /// walks ancestors upward recomputing their bounding volume until one
    /// already contains the recomputed union.
    pub(super) fn insert_leaf(&mut self, start: NodeId, leaf: NodeId) {
        let mut current = start;
        while !self.arena.get(current).is_leaf() {
            let children = self.arena.get(current).children;
            let query = self.arena.get(leaf).bv;
            let bv0 = self.arena.get(children[0]).bv;
            let bv1 = self.arena.get(children[1]).bv;
            current = children[Bv::select_child(&query, &bv0, &bv1)];
        }
        let sibling = current;
        let old_parent = self.arena.get(sibling).parent;

        let new_internal = self.arena.allocate();
        let new_bv = self.arena.get(sibling).bv.union(&self.arena.get(leaf).bv);
        {
            let record = self.arena.get_mut(new_internal);
            record.bv = new_bv;
            record.parent = old_parent;
            record.children = [sibling, leaf];
        }
        self.arena.get_mut(sibling).parent = new_internal;
        self.arena.get_mut(leaf).parent = new_internal;

        if old_parent == NULL {
            self.root = new_internal;
        } else {
            let parent_children = &mut self.arena.get_mut(old_parent).children;
            if parent_children[0] == sibling {
                parent_children[0] = new_internal;
            } else {
                parent_children[1] = new_internal;
            }
        }

        self.refit_contain_cutoff(old_parent);
    }

    /// Inserts `leaf` starting the descent at `start`, or — if `start` is
    /// `NULL` (the tree became empty) — makes `leaf` the new root directly.
    pub(super) fn insert_leaf_or_set_root(&mut self, start: NodeId, leaf: NodeId) {
        if start == NULL {
            self.root = leaf;
            self.arena.get_mut(leaf).parent = NULL;
        } else {
            self.insert_leaf(start, leaf);
        }
    }

    /// Detaches `leaf` from the topology without freeing its arena slot
    /// (the leaf node itself is not deleted yet — only the now-unnecessary
    /// splice node is). Returns the anchor: the ancestor at or below which
    /// the refit walk stopped, suitable as a starting point for
    /// reinsertion.
    pub(super) fn detach_leaf(&mut self, leaf: NodeId) -> NodeId {
        if leaf == self.root {
            self.root = NULL;
            return NULL;
        }
        let parent = self.arena.get(leaf).parent;
        let grand = self.arena.get(parent).parent;
        let parent_children = self.arena.get(parent).children;
        let sibling = if parent_children[0] == leaf {
            parent_children[1]
        } else {
            parent_children[0]
        };

        if grand == NULL {
            self.root = sibling;
            self.arena.get_mut(sibling).parent = NULL;
            self.arena.release(parent);
            return sibling;
        }

        self.arena.get_mut(sibling).parent = grand;
        {
            let grand_children = &mut self.arena.get_mut(grand).children;
            if grand_children[0] == parent {
                grand_children[0] = sibling;
            } else {
                grand_children[1] = sibling;
            }
        }
        self.arena.release(parent);
        self.refit_equal_cutoff(grand)
    }

    /// Walks from `node` toward the root, recomputing each ancestor's BV as
    /// the union of its two children, stopping at the first ancestor whose
    /// BV already *contains* that union (used after insertion — a looser
    /// cutoff than [`Self::refit_equal_cutoff`], since insertion only needs
    /// containment to remain valid, not exact bounds).
    pub(super) fn refit_contain_cutoff(&mut self, start: NodeId) {
        let mut node = start;
        while node != NULL {
            let children = self.arena.get(node).children;
            let combined = self.arena.get(children[0]).bv.union(&self.arena.get(children[1]).bv);
            if self.arena.get(node).bv.contain(&combined) {
                return;
            }
            self.arena.get_mut(node).bv = combined;
            node = self.arena.get(node).parent;
        }
    }

    /// Walks from `node` toward the root, recomputing each ancestor's BV as
    /// the union of its two children, stopping at the first ancestor whose
    /// BV is already *equal* to that union. Returns the node at which the
    /// walk stopped (the root, if it never stopped early).
    pub(super) fn refit_equal_cutoff(&mut self, start: NodeId) -> NodeId {
        let mut node = start;
        loop {
            let children = self.arena.get(node).children;
            let combined = self.arena.get(children[0]).bv.union(&self.arena.get(children[1]).bv);
            if self.arena.get(node).bv.equal(&combined) {
                return node;
            }
            self.arena.get_mut(node).bv = combined;
            let parent = self.arena.get(node).parent;
            if parent == NULL {
                return node;
            }
            node = parent;
        }
    }

    /// Climbs up to `levels` parents from `node`, stopping early at the
    /// root. `node == NULL` passes through unchanged.
    pub(super) fn climb(&self, node: NodeId, levels: i32) -> NodeId {
        if node == NULL {
            return NULL;
        }
        let mut current = node;
        let mut remaining = levels;
        while remaining > 0 {
            let parent = self.arena.get(current).parent;
            if parent == NULL {
                break;
            }
            current = parent;
            remaining -= 1;
        }
        current
    }
}
