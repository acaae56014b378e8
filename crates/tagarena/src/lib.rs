//! Fixed-capacity boundary-tag allocator over an owned word arena.
//!
//! A [`BoundaryTagAllocator`] owns one pre-sized array of [`Word`]s and
//! hands out blocks from it. Every block carries its size in a header and a
//! footer word, so a block's physical neighbours can be found from the block
//! alone and freed space is merged back immediately.
//!
//! # Layout
//!
//! ```text
//! allocated block (W words)          free block (W words)
//! ┌──────┬─────────────┬──────┐      ┌──────┬──────┬─────┬─────┬──────┐
//! │  -W  │   payload   │  -W  │      │  +W  │ next │ ... │ ... │  +W  │
//! └──────┴─────────────┴──────┘      └──────┴──────┴─────┴─────┴──────┘
//!  header               footer        header  link               footer
//! ```
//!
//! Free blocks form a singly linked list through their `next` word, which
//! holds the header offset of the following free block or `-1`. All
//! addressing is by word offset; the crate contains no `unsafe`.
//!
//! # Policy
//!
//! - **Allocate:** first fit in free-list order. The low part of the chosen
//!   block is handed out; a remainder of at least [`MIN_BLOCK_WORDS`] stays
//!   free in the same list position, a smaller one is absorbed.
//! - **Free:** merge with a free left and/or right neighbour at once. A block
//!   with no free neighbour is pushed on the list head.
//! - **Iterate:** [`start`](BoundaryTagAllocator::start) /
//!   [`next`](BoundaryTagAllocator::next) walk every block by header size.
//!
//! # Example
//!
//! ```rust
//! use tagarena::BoundaryTagAllocator;
//!
//! let mut arena = BoundaryTagAllocator::with_words(64).unwrap();
//! let handle = arena.allocate(40).unwrap();
//! assert_eq!(arena.payload(handle).unwrap().len(), 10);
//!
//! arena.start();
//! let first = arena.next().unwrap();
//! assert_eq!(arena.size(first), 12);
//! assert!(!arena.is_free(first));
//!
//! arena.free(Some(handle)).unwrap();
//! assert_eq!(arena.stats().largest_free, 64);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
mod audit;
pub mod config;
pub mod error;
pub mod handle;
pub mod iter;
pub mod stats;
pub mod tag;

// Public re-exports for the primary API surface.
pub use allocator::BoundaryTagAllocator;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::{ArenaId, BlockHandle, PayloadHandle};
pub use iter::{BlockInfo, Blocks, FreeBlocks};
pub use stats::ArenaStats;
pub use tag::{BlockState, Tag, Word, BYTES_PER_WORD, MIN_BLOCK_WORDS};
