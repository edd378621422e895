//! The uniform record stored in each arena slot.

/// Index into a [`super::NodeArena`]. Stable only as long as the arena does
/// not grow (growth may relocate records — see [`super::NodeArena::allocate`]).
pub type NodeId = u32;

/// Sentinel denoting "no such node": the all-ones value of the index type,
/// not zero. Used both for "no parent" (root) and for the leaf-vs-internal
/// discriminator (`children[0] == NULL`).
pub const NULL: NodeId = NodeId::MAX;

/// One arena slot. Plays one of two roles depending on whether it is
/// currently allocated:
///
/// * **Live node** (leaf or internal, distinguished by `children[0]`):
///   `bv`, `parent`, `children`, `code`, `payload` are meaningful.
/// * **Free slot**: only `next` is meaningful (the free-list successor,
///   `NULL` if this is the last free slot). All other fields are left at
///   whatever they held when the slot was released — callers must not read
///   them in that state.
///
/// This overlapping-field design (rather than an enum with a `Free` variant)
/// matches the arena's intrusive free list: the slot's "next free" pointer
/// and its "live node" fields share storage by convention, documented here,
/// instead of by a tagged representation.
#[derive(Debug, Clone)]
pub struct NodeRecord<Bv, Payload> {
    /// For a leaf: the object's bounding volume. For an internal node: the
    /// union of its children's bounding volumes (possibly stale until the
    /// next refit/ancestor-walk touches it).
    pub bv: Bv,
    /// Index of the parent node, or `NULL` if this is the root (or if the
    /// slot is free).
    pub parent: NodeId,
    /// `children[0] == NULL` iff this node is a leaf (the discriminator).
    /// For an internal node both entries are valid indices. For a free
    /// slot, `children[0]` doubles as the free-list successor — see
    /// [`Self::next`]/[`Self::set_next`].
    pub children: [NodeId; 2],
    /// Morton code, written by the Morton-based builders. Don't-care
    /// otherwise.
    pub code: u32,
    /// The leaf's opaque payload. Unused (left at its `Default`) for
    /// internal nodes.
    pub payload: Payload,
}

impl<Bv: Default, Payload: Default> Default for NodeRecord<Bv, Payload> {
    fn default() -> Self {
        NodeRecord {
            bv: Bv::default(),
            parent: NULL,
            children: [NULL, NULL],
            code: 0,
            payload: Payload::default(),
        }
    }
}

impl<Bv, Payload> NodeRecord<Bv, Payload> {
    /// `true` iff this node is a leaf, i.e. `children[0] == NULL`. Undefined
    /// for a free slot.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children[0] == NULL
    }

    /// Reads the free-list successor. Only valid while this slot is free;
    /// overlaid onto `children[0]`.
    #[inline]
    pub fn next(&self) -> NodeId {
        self.children[0]
    }

    /// Writes the free-list successor. Only meaningful while this slot is
    /// free; overlaid onto `children[0]`.
    #[inline]
    pub fn set_next(&mut self, next: NodeId) {
        self.children[0] = next;
    }
}
