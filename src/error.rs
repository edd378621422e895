//! Diagnostics raised by [`crate::Tree::validate`].
//!
//! Mutating tree operations never return a `Result`: their preconditions are
//! the caller's responsibility and are enforced with `debug_assert!` (see the
//! module docs on [`crate::Tree`]). `BvhError` exists only for the validation
//! pass used by property-based tests, where a violated invariant should be
//! reported rather than panicked on.

use thiserror::Error;

use crate::arena::NodeId;

/// One invariant from the tree's structural contract, violated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhError {
    /// A non-root node's `parent` does not point back at a node whose
    /// children include it.
    #[error("node {0} has a parent that does not list it as a child")]
    DanglingParent(NodeId),

    /// An internal node's two children do not both point back to it as
    /// their parent.
    #[error("node {0} is not consistently linked to both of its children")]
    SiblingMismatch(NodeId),

    /// An internal node's bounding volume does not contain the union of its
    /// children's bounding volumes.
    #[error("node {0}'s bounding volume does not contain its children's union")]
    BvNotContaining(NodeId),

    /// The number of leaves reachable from the root does not match
    /// `leaf_count`.
    #[error("reachable leaf count {reachable} does not match recorded leaf_count {recorded}")]
    LeafCountMismatch { reachable: usize, recorded: usize },

    /// Walking the free list did not visit exactly `capacity - used` slots,
    /// or it did not terminate at `NULL`.
    #[error("free list is corrupt: visited {visited}, expected {expected}")]
    FreeListCorrupt { visited: usize, expected: usize },

    /// A `NULL` sentinel is used where the structure requires a real index:
    /// either the root's `parent` is not `NULL`, or a node whose leaf
    /// discriminator (`children[0] == NULL`) marks it a leaf still carries a
    /// non-`NULL` `children[1]` (the two sentinel slots disagree).
    #[error("node {0} violates sentinel discipline")]
    SentinelMismatch(NodeId),
}
