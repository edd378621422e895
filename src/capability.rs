//! The narrow capability contract the tree is generic over.
//!
//! The tree itself never constructs a bounding volume and never knows what a
//! leaf's payload means; both are supplied by the caller through
//! [`BoundingVolume`] and the plain `Payload` type parameter on [`crate::Tree`].

use nalgebra::{RealField, Vector3};

/// Capability required of a bounding volume type for it to be stored in a
/// [`crate::Tree`].
///
/// Implementors are expected to be small, `Copy` value types (an AABB, an
/// OBB, a k-DOP, ...). The tree only ever combines volumes through this
/// trait; it has no notion of the volume's concrete shape.
pub trait BoundingVolume: Default + Clone + Copy {
    /// The scalar type used for coordinates and extents. `RealField`
    /// (rather than bare `num_traits::Float`) because `Vector3<Self::S>`
    /// needs nalgebra's `Scalar` bound to be constructible and indexable,
    /// and `RealField` already implies `Float`.
    type S: RealField;

    /// Returns a bounding volume containing both `self` and `other`.
    fn union(&self, other: &Self) -> Self;

    /// Returns `true` iff `self` fully contains `other`.
    fn contain(&self, other: &Self) -> bool;

    /// Exact equality, used by the refit cutoff and the BV-update no-op
    /// check. Not a tolerant/approximate comparison.
    fn equal(&self, other: &Self) -> bool;

    /// The volume's centroid.
    fn center(&self) -> Vector3<Self::S>;

    /// Extent along axis 0.
    fn width(&self) -> Self::S;

    /// Extent along axis 1.
    fn height(&self) -> Self::S;

    /// Extent along axis 2.
    fn depth(&self) -> Self::S;

    /// A cost metric monotonic in volume extent (e.g. surface area or
    /// volume), used by [`crate::Tree::balance_bottomup`] to score candidate
    /// merges. Smaller is better.
    fn size(&self) -> Self::S;

    /// Picks which of two candidate children to descend into while
    /// inserting a leaf whose volume is `query`.
    ///
    /// Returns `0` to favour `child0`, `1` to favour `child1`. The default
    /// implementation always returns `0` ("left child") — this fallback is
    /// deliberate and must be preserved for `BoundingVolume` types that do
    /// not override it, since it is directly observable in tree shape.
    fn select_child(query: &Self, child0: &Self, child1: &Self) -> usize {
        let _ = (query, child0, child1);
        0
    }
}

/// A Morton-code functor over a bounding volume's centroid, scoped to the
/// union bounding volume of the leaves being encoded.
///
/// `bits()` is the width of the produced code (at most 32); the call
/// operator lives on `encode`.
pub trait MortonEncoder<S> {
    /// Number of significant bits in codes produced by [`Self::encode`].
    /// Must be `<= 32`.
    fn bits(&self) -> u32;

    /// Encodes a centroid into a Morton code.
    fn encode(&self, center: Vector3<S>) -> u32;
}

/// Capability required of a bounding volume type to be usable with the
/// Morton-code batch builders ([`crate::Tree::init`] levels 1-3).
pub trait MortonEncodable: BoundingVolume {
    /// The functor type constructed from the union bounding volume of the
    /// leaves about to be encoded.
    type Encoder: MortonEncoder<Self::S>;

    /// Builds the Morton encoder scoped to `union`, the bounding volume of
    /// all leaves about to be partitioned.
    fn morton_encoder(union: &Self) -> Self::Encoder;
}
