//! Block traversal.
//!
//! Two ways to walk the arena:
//!
//! - The stateful cursor [`start`](BoundaryTagAllocator::start) /
//!   [`next`](BoundaryTagAllocator::next), which lives inside the allocator
//!   and yields [`BlockHandle`]s for use with the query helpers.
//! - The borrowing iterators [`Blocks`] and [`FreeBlocks`], which hold a
//!   shared borrow and therefore cannot be interleaved with mutation.
//!
//! Any successful `allocate`, `free` or `reset` ends a cursor traversal in
//! progress: `next` returns `None` until `start` is called again, so the
//! cursor never lands inside a block that was split or merged under it.

use crate::allocator::BoundaryTagAllocator;
use crate::handle::{ArenaId, BlockHandle};
use crate::tag::{decode_link, Tag, Word, LINK_OFFSET, MIN_BLOCK_WORDS};

/// A block as seen during traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Handle to the block header.
    pub handle: BlockHandle,
    /// Decoded header tag.
    pub tag: Tag,
}

impl BlockInfo {
    /// Header offset.
    pub fn offset(&self) -> u32 {
        self.handle.offset
    }

    /// Block length in words, tags included.
    pub fn words(&self) -> u32 {
        self.tag.words
    }

    /// Whether the block is free.
    pub fn is_free(&self) -> bool {
        self.tag.is_free()
    }

    /// Usable words between the header and footer.
    pub fn payload_words(&self) -> u32 {
        self.tag.words - 2
    }
}

impl BoundaryTagAllocator {
    /// Rewind the block cursor to the first block.
    pub fn start(&mut self) {
        self.cursor = Some(0);
    }

    /// Yield the block under the cursor and advance past it.
    ///
    /// Returns `None` once the cursor has passed the last block, or if a
    /// mutation ended the traversal. The handle addresses the block header,
    /// not its payload.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<BlockHandle> {
        let current = self.cursor?;
        self.cursor = self
            .tag_at(current)
            .map(|tag| current + tag.words)
            .filter(|&offset| offset < self.config.words);
        Some(BlockHandle::new(self.id, current))
    }

    /// Whether the block at `block` is free.
    ///
    /// # Panics
    ///
    /// Panics if the handle lies outside the arena.
    pub fn is_free(&self, block: BlockHandle) -> bool {
        debug_assert_eq!(block.arena, self.id, "block handle from another arena");
        self.memory[block.offset as usize] > 0
    }

    /// Magnitude of the tag at `block`, i.e. the block length in words.
    ///
    /// Pass a [`BlockHandle`]; for a payload handle use
    /// [`block_of`](Self::block_of) first.
    ///
    /// # Panics
    ///
    /// Panics if the handle lies outside the arena.
    pub fn size(&self, block: BlockHandle) -> u32 {
        debug_assert_eq!(block.arena, self.id, "block handle from another arena");
        self.memory[block.offset as usize].unsigned_abs()
    }

    /// Iterate over every block, in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            memory: &self.memory,
            arena: self.id,
            offset: 0,
        }
    }

    /// Iterate over free blocks, in free-list order.
    pub fn free_blocks(&self) -> FreeBlocks<'_> {
        FreeBlocks {
            memory: &self.memory,
            arena: self.id,
            next: self.free_head,
            remaining: self.memory.len() / MIN_BLOCK_WORDS as usize,
        }
    }
}

/// Address-order iterator over all blocks. See
/// [`BoundaryTagAllocator::blocks`].
pub struct Blocks<'a> {
    memory: &'a [Word],
    arena: ArenaId,
    offset: usize,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let word = *self.memory.get(self.offset)?;
        let Some(tag) = Tag::decode(word) else {
            self.offset = self.memory.len();
            return None;
        };
        let handle = BlockHandle::new(self.arena, self.offset as u32);
        self.offset += tag.words as usize;
        Some(BlockInfo { handle, tag })
    }
}

/// Free-list iterator. See [`BoundaryTagAllocator::free_blocks`].
///
/// Stops after as many steps as the arena could hold blocks, so a corrupted
/// cyclic list still terminates.
pub struct FreeBlocks<'a> {
    memory: &'a [Word],
    arena: ArenaId,
    next: Option<u32>,
    remaining: usize,
}

impl Iterator for FreeBlocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let offset = self.next.take()?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let tag = Tag::decode(*self.memory.get(offset as usize)?)?;
        self.next = self
            .memory
            .get(offset as usize + LINK_OFFSET)
            .copied()
            .and_then(decode_link);
        Some(BlockInfo {
            handle: BlockHandle::new(self.arena, offset),
            tag,
        })
    }
}
