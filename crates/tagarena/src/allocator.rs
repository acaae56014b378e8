//! The boundary-tag allocator.
//!
//! [`BoundaryTagAllocator`] owns a fixed `Box<[Word]>` arena and carves it
//! into tagged blocks. Free blocks are threaded into a singly linked list
//! through the word after their header; the list head lives outside the
//! arena. Allocation is first-fit over that list, and freeing coalesces with
//! both physical neighbours immediately.
//!
//! All links and handles are word offsets into the arena, never pointers.

use std::fmt;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{ArenaId, BlockHandle, PayloadHandle};
use crate::tag::{
    decode_link, encode_link, words_for_bytes, Tag, Word, LINK_OFFSET, MIN_BLOCK_WORDS,
};

/// Fixed-capacity allocator over a single word arena.
///
/// Single-threaded: every operation runs to completion and the type does
/// no internal locking. Wrap it in a `Mutex` if it must be shared.
///
/// # Invariants
///
/// Between public calls:
///
/// 1. Blocks tile the arena from offset 0 to the end with no gaps.
/// 2. Every block's header and footer hold the same tag.
/// 3. Every free block is on the free list exactly once.
/// 4. No two physically adjacent blocks are both free.
/// 5. The free list holds only free blocks and has no cycle.
///
/// [`check_invariants`](Self::check_invariants) audits all five.
pub struct BoundaryTagAllocator {
    /// Identity stamped into every handle this allocator issues.
    pub(crate) id: ArenaId,
    pub(crate) config: ArenaConfig,
    /// Backing storage. Length is `config.words` for the allocator's lifetime.
    pub(crate) memory: Box<[Word]>,
    /// Header offset of the first free block, `None` when the arena is full.
    pub(crate) free_head: Option<u32>,
    /// Header offset the block cursor will yield next, `None` at the end.
    pub(crate) cursor: Option<u32>,
}

/// Physical neighbour that takes part in a merge.
#[derive(Clone, Copy, Debug)]
struct Neighbour {
    offset: u32,
    words: u32,
}

impl BoundaryTagAllocator {
    /// Create an allocator whose arena is one free block spanning every word.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::formatted(config))
    }

    fn formatted(config: ArenaConfig) -> Self {
        let mut allocator = Self {
            id: ArenaId::next(),
            memory: vec![0; config.words as usize].into_boxed_slice(),
            config,
            free_head: None,
            cursor: None,
        };
        allocator.format();
        allocator.cursor = Some(0);
        allocator
    }

    /// Shorthand for `new(ArenaConfig::new(words))`.
    pub fn with_words(words: u32) -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::new(words))
    }

    /// Return the arena to its freshly constructed state.
    ///
    /// The allocator takes a new [`ArenaId`], so every handle issued before
    /// the reset is rejected with [`ArenaError::ForeignHandle`]. A block
    /// traversal in progress ends; call [`start`](Self::start) to walk the
    /// fresh arena.
    pub fn reset(&mut self) {
        let previous = self.id;
        self.id = ArenaId::next();
        self.format();
        self.cursor = None;
        tracing::debug!(%previous, arena = %self.id, "arena reset");
    }

    fn format(&mut self) {
        self.memory.fill(0);
        self.write_tags(0, Tag::free(self.config.words));
        self.set_link(0, None);
        self.free_head = Some(0);
    }

    /// Identity of this allocator, as stamped into its handles.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// The configuration the allocator was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Arena length in words.
    pub fn words(&self) -> u32 {
        self.config.words
    }

    /// The arena in its signed on-arena encoding: positive tags are free,
    /// negative tags are allocated, `-1` links end the free list.
    pub fn raw_words(&self) -> &[Word] {
        &self.memory
    }

    /// Allocate a block with room for `bytes` bytes.
    ///
    /// Returns a handle to the first payload word, or `None` if no free
    /// block is large enough. A failed call leaves the arena untouched.
    pub fn allocate(&mut self, bytes: usize) -> Option<PayloadHandle> {
        self.try_allocate(bytes).ok()
    }

    /// Like [`allocate`](Self::allocate), but reports why it failed.
    pub fn try_allocate(&mut self, bytes: usize) -> Result<PayloadHandle, ArenaError> {
        let Some(needed) = words_for_bytes(bytes) else {
            return Err(self.exhausted(bytes, None));
        };
        let Some((prev, start, available)) = self.find_fit(needed) else {
            return Err(self.exhausted(bytes, Some(needed)));
        };

        let next = self.link_at(start);
        let leftover = available - needed;
        let taken = if leftover >= MIN_BLOCK_WORDS {
            // High words stay free and take over the list position.
            let rest = start + needed;
            self.write_tags(rest, Tag::free(leftover));
            self.set_link(rest, next);
            self.relink(prev, Some(rest));
            tracing::trace!(start, needed, leftover, "split free block");
            needed
        } else {
            self.relink(prev, next);
            available
        };
        self.write_tags(start, Tag::allocated(taken));
        self.cursor = None;
        self.debug_audit();

        Ok(PayloadHandle::new(self.id, start + 1))
    }

    /// First free block in list order with at least `needed` words, with
    /// its list predecessor.
    fn find_fit(&self, needed: u32) -> Option<(Option<u32>, u32, u32)> {
        let mut prev = None;
        for block in self.free_blocks() {
            let offset = block.handle.offset;
            if block.tag.words >= needed {
                return Some((prev, offset, block.tag.words));
            }
            prev = Some(offset);
        }
        None
    }

    fn exhausted(&self, requested_bytes: usize, requested_words: Option<u32>) -> ArenaError {
        let largest_free = self
            .free_blocks()
            .map(|block| block.tag.words)
            .max()
            .unwrap_or(0);
        tracing::debug!(
            arena = %self.id,
            requested_bytes,
            ?requested_words,
            largest_free,
            "allocation failed"
        );
        ArenaError::CapacityExceeded {
            requested_bytes,
            requested_words,
            largest_free,
        }
    }

    /// Release a block returned by [`allocate`](Self::allocate).
    ///
    /// `None` is a no-op. The block is merged with any free physical
    /// neighbour before this call returns.
    ///
    /// # Errors
    ///
    /// Handles are validated before anything is written: a handle from
    /// another allocator (or from before a reset), one that does not
    /// address a block header, or one whose block is already free is
    /// rejected and the arena is left unchanged.
    ///
    /// A stale handle whose block has since been handed out again cannot be
    /// told apart from the new owner's handle and frees that block.
    pub fn free(&mut self, handle: Option<PayloadHandle>) -> Result<(), ArenaError> {
        let Some(handle) = handle else {
            return Ok(());
        };
        let (start, tag) = match self.resolve(handle) {
            Ok((start, tag)) if tag.is_free() => Err(ArenaError::DoubleFree { offset: start }),
            other => other,
        }
        .inspect_err(|error| {
            tracing::debug!(%handle, %error, "rejected free");
        })?;

        let words = tag.words;
        let end = start + words;

        let left = start
            .checked_sub(1)
            .and_then(|footer| self.tag_at(footer))
            .filter(Tag::is_free)
            .and_then(|left| {
                let offset = start.checked_sub(left.words)?;
                Some(Neighbour {
                    offset,
                    words: left.words,
                })
            });
        let right = (end < self.config.words)
            .then(|| self.tag_at(end))
            .flatten()
            .filter(Tag::is_free)
            .map(|right| Neighbour {
                offset: end,
                words: right.words,
            });
        // Locate the right neighbour's list entry before writing anything.
        let right_prev = match right {
            Some(r) => Some(self.predecessor(r.offset).ok_or_else(|| ArenaError::Corrupted {
                offset: r.offset,
                reason: "free block missing from free list".to_string(),
            })?),
            None => None,
        };

        self.write_tags(start, Tag::free(words));

        match (left, right, right_prev) {
            (Some(l), Some(r), Some(r_prev)) => {
                let r_next = self.link_at(r.offset);
                self.relink(r_prev, r_next);
                self.write_tags(l.offset, Tag::free(l.words + words + r.words));
                tracing::trace!(
                    start = l.offset,
                    words = l.words + words + r.words,
                    "coalesced both sides"
                );
            }
            (Some(l), None, _) => {
                self.write_tags(l.offset, Tag::free(l.words + words));
                tracing::trace!(start = l.offset, words = l.words + words, "coalesced left");
            }
            (None, Some(r), Some(r_prev)) => {
                let r_next = self.link_at(r.offset);
                self.set_link(start, r_next);
                self.relink(r_prev, Some(start));
                self.write_tags(start, Tag::free(words + r.words));
                tracing::trace!(start, words = words + r.words, "coalesced right");
            }
            _ => {
                self.set_link(start, self.free_head);
                self.free_head = Some(start);
            }
        }
        self.cursor = None;
        self.debug_audit();
        Ok(())
    }

    /// Header handle for the block behind a payload handle.
    pub fn block_of(&self, handle: PayloadHandle) -> BlockHandle {
        handle.block()
    }

    /// The usable words of an allocated block.
    pub fn payload(&self, handle: PayloadHandle) -> Result<&[Word], ArenaError> {
        let (first, len) = self.payload_span(handle)?;
        Ok(&self.memory[first..first + len])
    }

    /// Mutable access to the usable words of an allocated block.
    pub fn payload_mut(&mut self, handle: PayloadHandle) -> Result<&mut [Word], ArenaError> {
        let (first, len) = self.payload_span(handle)?;
        Ok(&mut self.memory[first..first + len])
    }

    fn payload_span(&self, handle: PayloadHandle) -> Result<(usize, usize), ArenaError> {
        let (start, tag) = self.resolve(handle)?;
        if tag.is_free() {
            return Err(ArenaError::NotAllocated { offset: start });
        }
        Ok((start as usize + 1, tag.words as usize - 2))
    }

    /// Validate a payload handle and decode its header.
    ///
    /// Allocated blocks are checked against their footer. Free blocks are
    /// returned as soon as the header decodes, so that a repeated free of a
    /// block that has since been merged away still reads as free.
    fn resolve(&self, handle: PayloadHandle) -> Result<(u32, Tag), ArenaError> {
        if handle.arena != self.id {
            return Err(ArenaError::ForeignHandle {
                handle_arena: handle.arena,
                arena: self.id,
            });
        }
        if handle.offset == 0 || handle.offset >= self.config.words {
            return Err(ArenaError::OutOfBounds {
                offset: handle.offset,
                words: self.config.words,
            });
        }
        let start = handle.offset - 1;
        let not_a_block = ArenaError::NotABlock { offset: start };
        let tag = self.tag_at(start).ok_or_else(|| not_a_block.clone())?;
        if tag.is_free() {
            return Ok((start, tag));
        }
        let end = u64::from(start) + u64::from(tag.words);
        if end > u64::from(self.config.words) {
            return Err(not_a_block);
        }
        if self.memory[end as usize - 1] != self.memory[start as usize] {
            return Err(not_a_block);
        }
        Ok((start, tag))
    }

    pub(crate) fn tag_at(&self, offset: u32) -> Option<Tag> {
        self.memory
            .get(offset as usize)
            .copied()
            .and_then(Tag::decode)
    }

    /// Write `tag` to both the header at `offset` and the matching footer.
    fn write_tags(&mut self, offset: u32, tag: Tag) {
        let word = tag.encode();
        let start = offset as usize;
        self.memory[start] = word;
        self.memory[start + tag.words as usize - 1] = word;
    }

    pub(crate) fn link_at(&self, offset: u32) -> Option<u32> {
        self.memory
            .get(offset as usize + LINK_OFFSET)
            .copied()
            .and_then(decode_link)
    }

    fn set_link(&mut self, offset: u32, next: Option<u32>) {
        self.memory[offset as usize + LINK_OFFSET] = encode_link(next);
    }

    /// Point `prev`'s link (or the list head when `prev` is `None`) at `next`.
    fn relink(&mut self, prev: Option<u32>, next: Option<u32>) {
        match prev {
            Some(prev) => self.set_link(prev, next),
            None => self.free_head = next,
        }
    }

    /// List predecessor of the free block at `target`: `Some(None)` if it is
    /// the head, `None` if it is not on the list.
    fn predecessor(&self, target: u32) -> Option<Option<u32>> {
        let mut prev = None;
        for block in self.free_blocks() {
            if block.handle.offset == target {
                return Some(prev);
            }
            prev = Some(block.handle.offset);
        }
        None
    }

    #[cfg(debug_assertions)]
    fn debug_audit(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("allocator invariant violated: {err}");
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_audit(&self) {}
}

impl Default for BoundaryTagAllocator {
    fn default() -> Self {
        Self::formatted(ArenaConfig::default())
    }
}

impl fmt::Debug for BoundaryTagAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryTagAllocator")
            .field("id", &self.id)
            .field("words", &self.config.words)
            .field("free_head", &self.free_head)
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// One line per block: `[start..end) state(words)`, plus the list link of
/// free blocks.
impl fmt::Display for BoundaryTagAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "arena {} ({} words)", self.id, self.config.words)?;
        for block in self.blocks() {
            let start = block.handle.offset;
            let end = start + block.tag.words;
            write!(f, "  [{start:>6}..{end:>6}) {}", block.tag)?;
            if block.tag.is_free() {
                match self.link_at(start) {
                    Some(next) => write!(f, " next={next}")?,
                    None => write!(f, " next=nil")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
