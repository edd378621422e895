//! Batch construction strategies: bottom-up greedy pairing, two top-down
//! variants, and three Morton-code partitioning variants. Each operates on
//! a scratch list of leaf indices `[begin, end)` (here, a Rust slice) and
//! returns the index of the constructed subtree root.

use itertools::{Either, Itertools};
use num_traits::{NumCast, Zero};
use tracing::instrument;

use crate::arena::NodeId;
use crate::capability::{BoundingVolume, MortonEncodable};

use super::Tree;

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: BoundingVolume,
    Payload: Default,
{
    /// Replaces the tree with one built top-down (`topdown_level` 0 or 1,
    /// falling back to bottom-up greedy pairing below `bu_threshold`) from
    /// `leaves`. Available for any `BoundingVolume`, unlike [`Self::init`]
    /// which additionally supports the Morton-code variants and therefore
    /// requires `Bv: MortonEncodable`.
    #[instrument(skip(self, leaves))]
    pub fn build_topdown(&mut self, leaves: Vec<(Bv, Payload)>) {
        self.rebuild_from(leaves, |tree, ids| tree.topdown(ids));
    }

    /// Greedy pairwise agglomeration: repeatedly merges the pair in
    /// `leaves` whose combined bounding volume has the smallest
    /// [`BoundingVolume::size`], until one subtree root remains.
    /// `O(n^3)` time, `O(1)` extra space beyond `leaves` itself; only used
    /// below `bu_threshold`.
    pub(super) fn bottomup(&mut self, leaves: &mut [NodeId]) -> NodeId {
        if leaves.len() == 1 {
            return leaves[0];
        }
        let mut end = leaves.len();
        while end > 1 {
            let mut best = (0usize, 1usize);
            let mut best_size = self
                .arena
                .get(leaves[0])
                .bv
                .union(&self.arena.get(leaves[1]).bv)
                .size();
            for i in 0..end {
                for j in (i + 1)..end {
                    let size = self.arena.get(leaves[i]).bv.union(&self.arena.get(leaves[j]).bv).size();
                    if size < best_size {
                        best_size = size;
                        best = (i, j);
                    }
                }
            }
            let (i, j) = best;
            let merged = self.create_internal(leaves[i], leaves[j]);
            leaves[i] = merged;
            leaves[j] = leaves[end - 1];
            end -= 1;
        }
        leaves[0]
    }

    /// Dispatches to [`Self::bottomup`] below `bu_threshold`, otherwise to
    /// `topdown_0`/`topdown_1` per `self.topdown_level`.
    pub(super) fn topdown(&mut self, leaves: &mut [NodeId]) -> NodeId {
        if leaves.len() <= self.bu_threshold {
            return self.bottomup(leaves);
        }
        match self.topdown_level {
            1 => self.topdown_1(leaves),
            _ => self.topdown_0(leaves),
        }
    }

    /// Splits `leaves` along the axis of largest extent of their union
    /// bounding volume, partial-sorting around the midpoint so the median
    /// element lands there, and recurses on both halves.
    fn topdown_0(&mut self, leaves: &mut [NodeId]) -> NodeId {
        let union = self.union_bv(leaves);
        let axis = largest_axis(&union);
        let mid = leaves.len() / 2;
        leaves.select_nth_unstable_by(mid, |&a, &b| {
            let ca = self.centre(a)[axis];
            let cb = self.centre(b)[axis];
            ca.partial_cmp(&cb).expect("bounding volume centre must be comparable")
        });
        let (left, right) = leaves.split_at_mut(mid);
        let left_root = self.topdown(left);
        let right_root = self.topdown(right);
        self.create_internal(left_root, right_root)
    }

    /// Splits `leaves` along whichever axis's mean-centre threshold gives
    /// the most balanced partition (fewest `|left - right|`, restricted to
    /// axes where both sides are non-empty, ties broken to axis 0), via a
    /// stable partition rather than a sort, and recurses on both halves.
    fn topdown_1(&mut self, leaves: &mut [NodeId]) -> NodeId {
        let n: Bv::S = NumCast::from(leaves.len()).expect("leaf count must fit in the BV scalar type");
        let mut sums = [Bv::S::zero(); 3];
        for &id in leaves.iter() {
            let c = self.centre(id);
            for axis in 0..3 {
                sums[axis] = sums[axis] + c[axis];
            }
        }
        let means: [Bv::S; 3] = [sums[0] / n, sums[1] / n, sums[2] / n];

        let mut best_axis = None;
        let mut best_balance = usize::MAX;
        for axis in 0..3 {
            let left = leaves.iter().filter(|&&id| self.centre(id)[axis] < means[axis]).count();
            let right = leaves.len() - left;
            if left == 0 || right == 0 {
                continue;
            }
            let balance = left.abs_diff(right);
            if balance < best_balance {
                best_balance = balance;
                best_axis = Some(axis);
            }
        }
        let axis = best_axis.unwrap_or(0);

        let mid = stable_partition_by(leaves, |&id| self.centre(id)[axis] < means[axis]);
        let (left, right) = leaves.split_at_mut(mid);
        let left_root = self.topdown(left);
        let right_root = self.topdown(right);
        self.create_internal(left_root, right_root)
    }

    /// Bounding volume of the union of every leaf's current `bv`.
    fn union_bv(&self, leaves: &[NodeId]) -> Bv {
        let mut iter = leaves.iter();
        let mut union = self.arena.get(*iter.next().expect("non-empty leaf list")).bv;
        for &id in iter {
            union = union.union(&self.arena.get(id).bv);
        }
        union
    }

    fn centre(&self, id: NodeId) -> nalgebra::Vector3<Bv::S> {
        self.arena.get(id).bv.center()
    }

    /// Allocates an internal node whose children are `a` and `b` and whose
    /// bounding volume is their union; links both children's `parent` back
    /// to it. `parent` is left `NULL` — the caller links it in.
    pub(super) fn create_internal(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let bv = self.arena.get(a).bv.union(&self.arena.get(b).bv);
        let node = self.arena.allocate();
        {
            let record = self.arena.get_mut(node);
            record.bv = bv;
            record.children = [a, b];
        }
        self.arena.get_mut(a).parent = node;
        self.arena.get_mut(b).parent = node;
        node
    }

    /// Common plumbing for the public rebuild entry points: clears the
    /// tree, allocates fresh leaf nodes for `leaves`, hands their indices to
    /// `build`, links the resulting root, and restores `leaf_count`.
    fn rebuild_from(&mut self, leaves: Vec<(Bv, Payload)>, build: impl FnOnce(&mut Self, &mut [NodeId]) -> NodeId) {
        self.clear();
        if leaves.is_empty() {
            return;
        }
        let mut ids: Vec<NodeId> = Vec::with_capacity(leaves.len());
        for (bv, payload) in leaves {
            ids.push(self.insert_detached(bv, payload));
        }
        self.leaf_count = ids.len();
        self.root = build(self, &mut ids);
        self.arena.get_mut(self.root).parent = crate::arena::NULL;
    }

    /// Allocates a leaf without linking it into any topology — used only by
    /// the batch builders, which build topology separately from leaf
    /// creation.
    pub(super) fn insert_detached(&mut self, bv: Bv, payload: Payload) -> NodeId {
        let leaf = self.arena.allocate();
        let record = self.arena.get_mut(leaf);
        record.bv = bv;
        record.payload = payload;
        leaf
    }
}

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: MortonEncodable,
    Payload: Default,
{
    /// Rebuilds the tree from `leaves` using construction strategy `level`:
    ///
    /// * `0` — pure top-down (`topdown_0`/`topdown_1` per `topdown_level`).
    /// * `1` — Morton radix split (`mortonRecurse_0`), bits-exhausted tail
    ///   finished with top-down (best quality), then a final [`Self::refit`].
    /// * `2` — Morton radix split (`mortonRecurse_1`), bits-exhausted tail
    ///   finished by index-midpoint split (cheaper), then refit.
    /// * `3` — no Morton splitting at all: every level splits by index
    ///   midpoint (`mortonRecurse_2`), then refit.
    /// * any other value — treated as `0`.
    ///
    /// Levels 1-3 need internal bounding volumes filled in afterward because
    /// the Morton builders create internal nodes without computing a BV;
    /// the top-down path sets them during construction and skips the refit.
    #[instrument(skip(self, leaves))]
    pub fn init(&mut self, leaves: Vec<(Bv, Payload)>, level: u8) {
        match level {
            1 => {
                self.rebuild_from(leaves, |tree, ids| {
                    let start_bit = tree.morton_start_bit(ids);
                    tree.morton_recurse_0(ids, start_bit)
                });
                self.refit();
            }
            2 => {
                self.rebuild_from(leaves, |tree, ids| {
                    let start_bit = tree.morton_start_bit(ids);
                    tree.morton_recurse_1(ids, start_bit)
                });
                self.refit();
            }
            3 => {
                self.rebuild_from(leaves, |tree, ids| tree.morton_recurse_2(ids));
                self.refit();
            }
            _ => self.build_topdown(leaves),
        }
    }

    /// Encodes every leaf's centroid as a Morton code (scoped to the union
    /// bounding volume of all leaves) and sorts `ids` ascending by code,
    /// then returns the index of the most-significant bit to start radix
    /// splitting from.
    fn morton_start_bit(&mut self, ids: &mut [NodeId]) -> i32 {
        let union = self.union_bv(ids);
        let encoder = Bv::morton_encoder(&union);
        let bits = encoder.bits().min(32);
        for &id in ids.iter() {
            let code = encoder.encode(self.centre(id));
            self.arena.get_mut(id).code = code;
        }
        ids.sort_unstable_by_key(|&id| self.arena.get(id).code);
        bits as i32 - 1
    }

    /// Finds the first index in `ids` (assumed sorted ascending by `code`)
    /// whose code has `bit` set.
    fn morton_split_point(&self, ids: &[NodeId], bit: i32) -> usize {
        ids.partition_point(|&id| (self.arena.get(id).code >> bit) & 1 == 0)
    }

    /// Radix split on `bit`, descending a bit without creating a node when
    /// every leaf falls on one side; bits-exhausted tail uses [`Self::topdown`].
    fn morton_recurse_0(&mut self, ids: &mut [NodeId], bit: i32) -> NodeId {
        if ids.len() == 1 {
            return ids[0];
        }
        if bit < 0 {
            return self.topdown(ids);
        }
        let split = self.morton_split_point(ids, bit);
        if split == 0 || split == ids.len() {
            return self.morton_recurse_0(ids, bit - 1);
        }
        let (left, right) = ids.split_at_mut(split);
        let l = self.morton_recurse_0(left, bit - 1);
        let r = self.morton_recurse_0(right, bit - 1);
        self.create_internal(l, r)
    }

    /// Same top behaviour as [`Self::morton_recurse_0`]; bits-exhausted tail
    /// uses the cheaper [`Self::index_median_build`] instead of `topdown`.
    fn morton_recurse_1(&mut self, ids: &mut [NodeId], bit: i32) -> NodeId {
        if ids.len() == 1 {
            return ids[0];
        }
        if bit < 0 {
            return self.index_median_build(ids);
        }
        let split = self.morton_split_point(ids, bit);
        if split == 0 || split == ids.len() {
            return self.morton_recurse_1(ids, bit - 1);
        }
        let (left, right) = ids.split_at_mut(split);
        let l = self.morton_recurse_1(left, bit - 1);
        let r = self.morton_recurse_1(right, bit - 1);
        self.create_internal(l, r)
    }

    /// No Morton splitting at all: every level splits by array-index
    /// midpoint of the already Morton-sorted list.
    fn morton_recurse_2(&mut self, ids: &mut [NodeId]) -> NodeId {
        self.index_median_build(ids)
    }

    /// Recursively halves `ids` by array-index midpoint, ignoring geometry
    /// entirely, until each side is a single leaf.
    fn index_median_build(&mut self, ids: &mut [NodeId]) -> NodeId {
        if ids.len() == 1 {
            return ids[0];
        }
        let mid = ids.len() / 2;
        let (left, right) = ids.split_at_mut(mid);
        let l = self.index_median_build(left);
        let r = self.index_median_build(right);
        self.create_internal(l, r)
    }
}

/// Index (0, 1, or 2) of the axis along which `bv` has the largest extent.
fn largest_axis<Bv: BoundingVolume>(bv: &Bv) -> usize {
    let (w, h, d) = (bv.width(), bv.height(), bv.depth());
    if w >= h && w >= d {
        0
    } else if h >= d {
        1
    } else {
        2
    }
}

/// Stably partitions `items` in place so that every element for which
/// `predicate` holds precedes every element for which it doesn't,
/// preserving relative order within each group. Returns the split point.
///
/// `std::slice` has no in-place stable partition, so this collects through
/// `Itertools::partition_map` (order-preserving) into two scratch buffers
/// and copies them back.
fn stable_partition_by<T: Copy>(items: &mut [T], predicate: impl Fn(&T) -> bool) -> usize {
    let (left, right): (Vec<T>, Vec<T>) = items.iter().partition_map(|item| {
        if predicate(item) {
            Either::Left(*item)
        } else {
            Either::Right(*item)
        }
    });
    let mid = left.len();
    items[..mid].copy_from_slice(&left);
    items[mid..].copy_from_slice(&right);
    mid
}
