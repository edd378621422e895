//! Contiguous, growable store of node records with an intrusive free list.

use tracing::trace;

use super::node::{NodeId, NodeRecord, NULL};

const INITIAL_CAPACITY: usize = 16;

/// Owns every [`NodeRecord`] in a [`crate::Tree`]. Grows by doubling and
/// never shrinks; [`Self::release`] returns a slot to the free list without
/// reclaiming memory.
#[derive(Debug)]
pub struct NodeArena<Bv, Payload> {
    storage: Vec<NodeRecord<Bv, Payload>>,
    free_head: NodeId,
    used: usize,
}

impl<Bv, Payload> NodeArena<Bv, Payload> {
    /// Number of currently allocated (live) slots.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total number of slots, allocated or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Head of the free list, `NULL` when the arena is fully allocated.
    #[inline]
    pub fn free_head(&self) -> NodeId {
        self.free_head
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &NodeRecord<Bv, Payload> {
        &self.storage[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeRecord<Bv, Payload> {
        &mut self.storage[id as usize]
    }

    /// Iterates the free list from [`Self::free_head`] to `NULL`, yielding
    /// each visited slot index exactly once. Used by [`crate::Tree::validate`].
    pub fn free_list(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.free_head;
        std::iter::from_fn(move || {
            if current == NULL {
                None
            } else {
                let id = current;
                current = self.storage[id as usize].next();
                Some(id)
            }
        })
    }
}

impl<Bv, Payload> NodeArena<Bv, Payload>
where
    Bv: Default,
    Payload: Default,
{
    /// Creates an arena with the given initial capacity, empty and fully
    /// free.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut storage = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let mut record = NodeRecord::default();
            let next = if i + 1 == capacity { NULL } else { (i + 1) as NodeId };
            record.set_next(next);
            storage.push(record);
        }
        NodeArena {
            storage,
            free_head: 0,
            used: 0,
        }
    }

    /// Creates an arena at the default initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Resets the arena to an empty state at the initial capacity,
    /// releasing all previously allocated storage.
    pub fn clear(&mut self) {
        *self = Self::with_capacity(INITIAL_CAPACITY);
    }

    /// Allocates a slot from the free list, growing (doubling) the arena
    /// first if none is available. Clears `parent`/`children` on the
    /// returned record to `NULL`; `bv`/`code`/`payload` are left at their
    /// `Default`.
    pub fn allocate(&mut self) -> NodeId {
        if self.free_head == NULL {
            self.grow();
        }
        let id = self.free_head;
        let next = self.storage[id as usize].next();
        self.free_head = next;
        let record = &mut self.storage[id as usize];
        *record = NodeRecord::default();
        self.used += 1;
        trace!(node = id, "arena allocate");
        id
    }

    /// Returns a slot to the free list. Topology fields are not scrubbed;
    /// correctness depends on callers not reading a free slot's node fields.
    pub fn release(&mut self, id: NodeId) {
        debug_assert!((id as usize) < self.storage.len());
        self.storage[id as usize].set_next(self.free_head);
        self.free_head = id;
        self.used -= 1;
        trace!(node = id, "arena release");
    }

    /// Doubles capacity, threading the new suffix onto the free list ahead
    /// of whatever was already there (there is nothing already there in
    /// practice, since `grow` only runs when the free list is exhausted).
    fn grow(&mut self) {
        let old_capacity = self.storage.len();
        let new_capacity = old_capacity * 2;
        debug_assert!(new_capacity < NULL as usize, "arena capacity would collide with NULL");
        trace!(old_capacity, new_capacity, "arena grow");
        self.storage.reserve(new_capacity - old_capacity);
        for i in old_capacity..new_capacity {
            let mut record = NodeRecord::default();
            let next = if i + 1 == new_capacity { NULL } else { (i + 1) as NodeId };
            record.set_next(next);
            self.storage.push(record);
        }
        self.free_head = old_capacity as NodeId;
    }
}

impl<Bv, Payload> Default for NodeArena<Bv, Payload>
where
    Bv: Default,
    Payload: Default,
{
    fn default() -> Self {
        Self::new()
    }
}
