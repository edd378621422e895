//! A minimal axis-aligned bounding box, implementing the
//! [`BoundingVolume`]/[`MortonEncodable`] capability contract.
//!
//! Not part of the crate's conceptual core — concrete bounding volume types
//! are the caller's concern (see `spec.md` §1) — this exists so the crate's
//! doctests, unit tests, and integration tests have a concrete type to
//! build trees over, the same role `src/dummy.rs` plays in the teacher
//! crate.

use nalgebra::{RealField, Vector3};
use num_traits::{Float, NumCast, One, Zero};

use crate::capability::{BoundingVolume, MortonEncodable, MortonEncoder};

/// An axis-aligned box, stored as its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3<S> {
    pub min: Vector3<S>,
    pub max: Vector3<S>,
}

impl<S: RealField> Aabb3<S> {
    /// Builds a box from its minimum and maximum corners. Does not check
    /// that `min <= max` componentwise; callers are expected to pass
    /// well-formed corners.
    pub fn new(min: Vector3<S>, max: Vector3<S>) -> Self {
        Aabb3 { min, max }
    }

    /// Builds a zero-volume box centred on `point`.
    pub fn from_point(point: Vector3<S>) -> Self {
        Aabb3 { min: point, max: point }
    }
}

impl<S: RealField> Default for Aabb3<S> {
    fn default() -> Self {
        Aabb3 {
            min: Vector3::new(S::zero(), S::zero(), S::zero()),
            max: Vector3::new(S::zero(), S::zero(), S::zero()),
        }
    }
}

impl<S: RealField> BoundingVolume for Aabb3<S> {
    type S = S;

    fn union(&self, other: &Self) -> Self {
        Aabb3 {
            min: Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    fn contain(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    fn equal(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }

    fn center(&self) -> Vector3<S> {
        let half = S::from(0.5).expect("0.5 must be representable");
        Vector3::new(
            (self.min.x + self.max.x) * half,
            (self.min.y + self.max.y) * half,
            (self.min.z + self.max.z) * half,
        )
    }

    fn width(&self) -> S {
        self.max.x - self.min.x
    }

    fn height(&self) -> S {
        self.max.y - self.min.y
    }

    fn depth(&self) -> S {
        self.max.z - self.min.z
    }

    /// Surface area, a standard monotonic-in-extent cost metric for AABB
    /// trees.
    fn size(&self) -> S {
        let two = S::from(2.0).expect("2.0 must be representable");
        let (w, h, d) = (self.width(), self.height(), self.depth());
        two * (w * h + h * d + d * w)
    }

    /// Favours the child whose centre is closer to `query`'s centre under
    /// the L1 metric, on doubled coordinates (matching the reference
    /// `HierarchyTree::select` heuristic, which avoids a factor-of-two
    /// division by comparing `2 * center` instead of `center`).
    fn select_child(query: &Self, child0: &Self, child1: &Self) -> usize {
        let two = S::from(2.0).expect("2.0 must be representable");
        let double = |v: Vector3<S>| Vector3::new(v.x * two, v.y * two, v.z * two);
        let q = double(query.center());
        let c0 = double(child0.center());
        let c1 = double(child1.center());
        let d0 = (q.x - c0.x).abs() + (q.y - c0.y).abs() + (q.z - c0.z).abs();
        let d1 = (q.x - c1.x).abs() + (q.y - c1.y).abs() + (q.z - c1.z).abs();
        if d0 <= d1 {
            0
        } else {
            1
        }
    }
}

/// Bits of Morton code used per axis; `3 * MORTON_BITS_PER_AXIS` must not
/// exceed 32.
const MORTON_BITS_PER_AXIS: u32 = 10;

/// Encodes a centroid into a 30-bit (10 bits/axis) interleaved Morton code,
/// scoped to a reference box covering the region of interest.
pub struct Aabb3MortonEncoder<S> {
    origin: Vector3<S>,
    inv_extent: Vector3<S>,
}

impl<S: RealField> MortonEncoder<S> for Aabb3MortonEncoder<S> {
    fn bits(&self) -> u32 {
        3 * MORTON_BITS_PER_AXIS
    }

    fn encode(&self, center: Vector3<S>) -> u32 {
        let scale = S::from((1u32 << MORTON_BITS_PER_AXIS) - 1).expect("quantization scale must fit S");
        let quantize = |value: S, origin: S, inv_extent: S| -> u32 {
            let normalized = ((value - origin) * inv_extent).max(S::zero()).min(S::one());
            let scaled = normalized * scale;
            NumCast::from(scaled.round()).unwrap_or(0)
        };
        let qx = quantize(center.x, self.origin.x, self.inv_extent.x);
        let qy = quantize(center.y, self.origin.y, self.inv_extent.y);
        let qz = quantize(center.z, self.origin.z, self.inv_extent.z);
        spread_bits(qx) | (spread_bits(qy) << 1) | (spread_bits(qz) << 2)
    }
}

/// Spreads the low `MORTON_BITS_PER_AXIS` bits of `value` so each occupies
/// every third bit position, leaving room to interleave three axes.
fn spread_bits(value: u32) -> u32 {
    let mut x = value as u64 & ((1 << MORTON_BITS_PER_AXIS) - 1);
    x = (x | (x << 16)) & 0x030000FF;
    x = (x | (x << 8)) & 0x0300F00F;
    x = (x | (x << 4)) & 0x030C30C3;
    x = (x | (x << 2)) & 0x09249249;
    x as u32
}

impl<S: RealField> MortonEncodable for Aabb3<S> {
    type Encoder = Aabb3MortonEncoder<S>;

    fn morton_encoder(union: &Self) -> Self::Encoder {
        let one = S::one();
        let extent = Vector3::new(
            (union.width()).max(one),
            (union.height()).max(one),
            (union.depth()).max(one),
        );
        Aabb3MortonEncoder {
            origin: union.min,
            inv_extent: Vector3::new(one / extent.x, one / extent.y, one / extent.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn box_at(x: f64, y: f64, z: f64) -> Aabb3<f64> {
        Aabb3::from_point(Vector3::new(x, y, z))
    }

    /// Inverse of [`spread_bits`]: compacts every third bit back together.
    fn compact_bits(mut x: u32) -> u32 {
        x &= 0x09249249;
        x = (x | (x >> 2)) & 0x030C30C3;
        x = (x | (x >> 4)) & 0x0300F00F;
        x = (x | (x >> 8)) & 0x030000FF;
        x = (x | (x >> 16)) & 0x000003FF;
        x
    }

    #[test]
    fn union_contains_both_inputs() {
        let a = box_at(0.0, 0.0, 0.0);
        let b = box_at(2.0, -1.0, 5.0);
        let u = a.union(&b);
        assert!(u.contain(&a));
        assert!(u.contain(&b));
    }

    #[test]
    fn equal_is_exact() {
        let a = box_at(1.0, 1.0, 1.0);
        let b = box_at(1.0, 1.0, 1.0);
        assert!(a.equal(&b));
        assert!(!a.equal(&box_at(1.0, 1.0, 1.000001)));
    }

    #[test]
    fn morton_encoder_is_monotonic_along_x() {
        let union = Aabb3::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(100.0, 100.0, 100.0));
        let encoder = Aabb3::morton_encoder(&union);
        let low = encoder.encode(Vector3::new(1.0, 0.0, 0.0));
        let high = encoder.encode(Vector3::new(90.0, 0.0, 0.0));
        assert!(low < high);
    }

    /// Decoding a Morton code recovers the original centroid only up to one
    /// quantization step (`union.width() / (2^10 - 1)` per axis), so the
    /// comparison needs `approx`'s tolerant equality rather than
    /// `BoundingVolume::equal`'s exact one.
    #[test]
    fn morton_quantization_round_trip_is_within_one_step() {
        let union = Aabb3::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(100.0, 100.0, 100.0));
        let encoder = Aabb3::morton_encoder(&union);
        let point = Vector3::new(37.0, 82.0, 5.0);
        let code = encoder.encode(point);

        let scale = ((1u32 << MORTON_BITS_PER_AXIS) - 1) as f64;
        let qx = compact_bits(code) as f64;
        let qy = compact_bits(code >> 1) as f64;
        let qz = compact_bits(code >> 2) as f64;
        let recovered = Vector3::new(
            qx / scale * union.width() + union.min.x,
            qy / scale * union.height() + union.min.y,
            qz / scale * union.depth() + union.min.z,
        );

        let step = union.width() / scale;
        assert_relative_eq!(recovered.x, point.x, epsilon = step);
        assert_relative_eq!(recovered.y, point.y, epsilon = step);
        assert_relative_eq!(recovered.z, point.z, epsilon = step);
    }
}
