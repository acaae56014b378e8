//! Allocator error types.

use std::error::Error;
use std::fmt;

use crate::handle::ArenaId;

/// Errors that can occur during allocator operations.
///
/// Running out of space in [`allocate`](crate::BoundaryTagAllocator::allocate)
/// is not an error; it returns `None`. [`ArenaError::CapacityExceeded`] is
/// only produced by [`try_allocate`](crate::BoundaryTagAllocator::try_allocate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The requested arena size cannot be represented.
    InvalidConfig {
        /// Requested arena length in words.
        words: u32,
        /// Smallest accepted length.
        minimum: u32,
        /// Largest accepted length.
        maximum: u32,
    },
    /// No free block is large enough for the request.
    CapacityExceeded {
        /// Number of bytes requested.
        requested_bytes: usize,
        /// Block length the request needs, tags included. `None` if the
        /// request overflows the word count.
        requested_words: Option<u32>,
        /// Largest free block currently available, in words.
        largest_free: u32,
    },
    /// The handle was issued by a different allocator, or before the last
    /// [`reset`](crate::BoundaryTagAllocator::reset).
    ForeignHandle {
        /// Arena the handle was issued by.
        handle_arena: ArenaId,
        /// Arena the handle was presented to.
        arena: ArenaId,
    },
    /// The handle does not address a payload inside the arena.
    OutOfBounds {
        /// Payload offset carried by the handle.
        offset: u32,
        /// Arena length in words.
        words: u32,
    },
    /// The word before the handle is not a header whose footer agrees with it.
    NotABlock {
        /// Header offset derived from the handle.
        offset: u32,
    },
    /// The handle's block is free, so it has no payload.
    NotAllocated {
        /// Header offset of the block.
        offset: u32,
    },
    /// The block is already free.
    DoubleFree {
        /// Header offset of the block.
        offset: u32,
    },
    /// An invariant audit found inconsistent arena state.
    Corrupted {
        /// Offset where the inconsistency was detected.
        offset: u32,
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig {
                words,
                minimum,
                maximum,
            } => {
                write!(
                    f,
                    "invalid arena size: {words} words, expected {minimum}..={maximum}"
                )
            }
            Self::CapacityExceeded {
                requested_bytes,
                requested_words,
                largest_free,
            } => match requested_words {
                Some(words) => write!(
                    f,
                    "arena capacity exceeded: requested {requested_bytes} bytes ({words} words), largest free block {largest_free} words"
                ),
                None => write!(
                    f,
                    "arena capacity exceeded: requested {requested_bytes} bytes overflows the word count"
                ),
            },
            Self::ForeignHandle {
                handle_arena,
                arena,
            } => {
                write!(f, "handle from arena {handle_arena} used with arena {arena}")
            }
            Self::OutOfBounds { offset, words } => {
                write!(f, "payload offset {offset} outside arena of {words} words")
            }
            Self::NotABlock { offset } => {
                write!(f, "no valid block header at offset {offset}")
            }
            Self::NotAllocated { offset } => {
                write!(f, "block at offset {offset} is not allocated")
            }
            Self::DoubleFree { offset } => {
                write!(f, "block at offset {offset} is already free")
            }
            Self::Corrupted { offset, reason } => {
                write!(f, "arena corrupted at offset {offset}: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}
