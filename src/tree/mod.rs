//! The dynamic bounding-volume hierarchy itself: a rooted binary tree over
//! arena indices, maintained so that every internal node's bounding volume
//! contains the union of its descendants'.
//!
//! Mutating operations take `&mut self`, which is the idiomatic Rust
//! expression of "requires exclusive access" (see `spec.md` §5) — there are
//! no internal locks because the borrow checker already forbids concurrent
//! mutation.

mod build;
mod inspect;
mod mutate;
mod rebalance;

use std::fmt;

use crate::arena::{NodeArena, NodeId, NULL};
use crate::capability::BoundingVolume;

/// Default subtree size at or below which the top-down builders switch to
/// [`Tree::bottomup`](crate::Tree::balance_bottomup)-style greedy
/// construction.
pub const DEFAULT_BU_THRESHOLD: usize = 16;

/// Default top-down construction variant (median split along the
/// largest-extent axis).
pub const DEFAULT_TOPDOWN_LEVEL: u8 = 0;

/// A dynamic bounding-volume hierarchy whose leaves carry a `Bv` bounding
/// volume and an opaque `Payload` reference.
///
/// `Tree` is the broad-phase acceleration structure: it maintains the
/// topology and the internal bounding volumes, but has no notion of what a
/// leaf's bounding volume or payload mean. See [`crate::capability`] for the
/// capability contract leaves must satisfy.
pub struct Tree<Bv, Payload> {
    pub(crate) root: NodeId,
    pub(crate) arena: NodeArena<Bv, Payload>,
    pub(crate) leaf_count: usize,
    /// Rolling bit-path used by [`Tree::balance_incremental`] to
    /// deterministically walk from root to a leaf across calls.
    pub(crate) opath: u32,
    /// How far [`Tree::update_bv`] climbs toward the root before searching
    /// for a new sibling when reinserting.
    pub max_lookahead_level: i32,
    /// Subtree size at or below which the top-down builders switch to
    /// bottom-up greedy construction.
    pub bu_threshold: usize,
    /// Selects the top-down construction variant (0 or 1).
    pub topdown_level: u8,
}

impl<Bv, Payload> Tree<Bv, Payload>
where
    Bv: BoundingVolume,
    Payload: Default,
{
    /// Creates an empty tree with the default `bu_threshold` (16) and
    /// `topdown_level` (0).
    pub fn new() -> Self {
        Self::with_params(DEFAULT_BU_THRESHOLD, DEFAULT_TOPDOWN_LEVEL)
    }

    /// Creates an empty tree with the given batch-builder tunables.
    pub fn with_params(bu_threshold: usize, topdown_level: u8) -> Self {
        Tree {
            root: NULL,
            arena: NodeArena::new(),
            leaf_count: 0,
            opath: 0,
            max_lookahead_level: 1,
            bu_threshold,
            topdown_level,
        }
    }

    /// Number of leaves currently in the tree. Distinct from the arena's
    /// `used` count, which also includes internal nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// `true` iff the tree holds no leaves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.used() == 0
    }

    /// Index of the root node, or [`crate::arena::NULL`] when empty.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read-only access to the backing arena, for external traversals (e.g.
    /// the collision manager's pairwise overlap enumeration) that only need
    /// to read the topology and bounding volumes.
    #[inline]
    pub fn nodes(&self) -> &NodeArena<Bv, Payload> {
        &self.arena
    }

    /// Releases all topology and re-initializes the arena at its initial
    /// capacity.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = NULL;
        self.leaf_count = 0;
        self.opath = 0;
    }
}

impl<Bv, Payload> Default for Tree<Bv, Payload>
where
    Bv: BoundingVolume,
    Payload: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Bv, Payload> fmt::Debug for Tree<Bv, Payload>
where
    Bv: BoundingVolume + fmt::Debug,
    Payload: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn recurse<Bv: fmt::Debug, Payload: fmt::Debug>(
            f: &mut fmt::Formatter<'_>,
            arena: &NodeArena<Bv, Payload>,
            node: NodeId,
            depth: usize,
        ) -> fmt::Result {
            if node == NULL {
                return Ok(());
            }
            let record = arena.get(node);
            writeln!(f, "{:indent$}#{node} bv={:?}", "", record.bv, indent = depth * 2)?;
            if record.is_leaf() {
                writeln!(f, "{:indent$}  payload={:?}", "", record.payload, indent = depth * 2)?;
            } else {
                recurse(f, arena, record.children[0], depth + 1)?;
                recurse(f, arena, record.children[1], depth + 1)?;
            }
            Ok(())
        }
        recurse(f, &self.arena, self.root, 0)
    }
}
