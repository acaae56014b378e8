//! Handles into the arena.
//!
//! Two handle kinds exist and they point at different words of a block:
//!
//! ```text
//!   offset:  h      h+1 ................ h+W-2   h+W-1
//!          ┌──────┬──────────────────────────────┬──────┐
//!          │ -W   │          payload             │ -W   │
//!          └──────┴──────────────────────────────┴──────┘
//!            ▲      ▲
//!            │      └── PayloadHandle (returned by allocate)
//!            └── BlockHandle (returned by iteration)
//! ```
//!
//! Keeping them as separate types turns a mix-up into a compile error.
//! Both carry the [`ArenaId`] of the allocator that issued them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of one allocator instance (and one reset epoch of it).
///
/// Drawn from a monotonic atomic counter, so handles from a dropped or
/// reset allocator are never mistaken for live ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh, unique arena ID.
    pub fn next() -> Self {
        Self(ARENA_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to the first payload word of an allocated block.
///
/// Returned by [`allocate`](crate::BoundaryTagAllocator::allocate) and
/// consumed by [`free`](crate::BoundaryTagAllocator::free).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct PayloadHandle {
    pub(crate) arena: ArenaId,
    pub(crate) offset: u32,
}

impl PayloadHandle {
    pub(crate) fn new(arena: ArenaId, offset: u32) -> Self {
        Self { arena, offset }
    }

    /// Word offset of the first payload word.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Arena that issued this handle.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Handle to the header of the same block.
    ///
    /// Always valid for handles produced by `allocate`, whose offset is at
    /// least one.
    pub fn block(&self) -> BlockHandle {
        BlockHandle::new(self.arena, self.offset.saturating_sub(1))
    }
}

impl fmt::Display for PayloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadHandle(arena={}, off={})", self.arena, self.offset)
    }
}

/// Handle to the header word of a block, free or allocated.
///
/// Produced by iteration and consumed by the query helpers
/// [`is_free`](crate::BoundaryTagAllocator::is_free) and
/// [`size`](crate::BoundaryTagAllocator::size).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct BlockHandle {
    pub(crate) arena: ArenaId,
    pub(crate) offset: u32,
}

impl BlockHandle {
    pub(crate) fn new(arena: ArenaId, offset: u32) -> Self {
        Self { arena, offset }
    }

    /// Word offset of the block header.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Arena that issued this handle.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHandle(arena={}, off={})", self.arena, self.offset)
    }
}
