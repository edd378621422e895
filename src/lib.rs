//! ## About
//!
//! A dynamic bounding-volume hierarchy (BVH): an arena-backed, strictly
//! binary tree used as a broad-phase acceleration structure for collision
//! detection. The tree never constructs a bounding volume itself — it is
//! generic over any type implementing [`BoundingVolume`], and optionally
//! [`MortonEncodable`] for the Morton-code batch builders — and has no
//! notion of what a leaf's payload means.
//!
//! Three families of operation are provided:
//!
//! * **Online mutation** ([`Tree::insert`], [`Tree::remove`],
//!   [`Tree::reinsert`], [`Tree::update_bv`] and its velocity/margin
//!   variants) for objects that move every frame. A local sibling-selection
//!   heuristic and a containment-driven ancestor refit keep these
//!   amortised `O(log n)`.
//! * **Batch construction** ([`Tree::build_topdown`], [`Tree::init`]) for
//!   building a tree from scratch — greedy bottom-up, top-down median
//!   split, or Morton-code radix split, selected by `bu_threshold` /
//!   `topdown_level` / the `level` argument.
//! * **Rebalancing and inspection** ([`Tree::refit`],
//!   [`Tree::balance_bottomup`], [`Tree::balance_topdown`],
//!   [`Tree::balance_incremental`], [`Tree::max_height`],
//!   [`Tree::extract_leaves`]) for maintaining tree quality over the
//!   lifetime of a simulation.
//!
//! See [`validate`] for the whole-tree consistency checker used by tests,
//! and [`shapes`] for a minimal AABB implementing the capability contract.
//!
//! ## Naming conventions
//! * Traits – adjectives that indicate capability and behavior
//! * Structs – substantives that indicate entities implementing a behavior
//! * Methods – imperative forms with the exception of getters and
//!   factories, which use substantives (i.e., omit a `get_` prefix) much
//!   like the standard library.

pub mod arena;
pub mod capability;
pub mod error;
pub mod shapes;
pub mod tree;
pub mod validate;

pub use arena::{NodeId, NodeRecord, NULL};
pub use capability::{BoundingVolume, MortonEncodable, MortonEncoder};
pub use error::BvhError;
pub use tree::{Tree, DEFAULT_BU_THRESHOLD, DEFAULT_TOPDOWN_LEVEL};
