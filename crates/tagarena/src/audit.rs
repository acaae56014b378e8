//! Invariant audit and occupancy statistics.
//!
//! [`check_invariants`](BoundaryTagAllocator::check_invariants) walks the
//! arena by header magnitudes and then walks the free list, cross-checking
//! the two. Debug builds run it after every mutation.

use indexmap::IndexSet;

use crate::allocator::BoundaryTagAllocator;
use crate::error::ArenaError;
use crate::stats::ArenaStats;
use crate::tag::{BlockState, Tag};

fn corrupted(offset: u32, reason: impl Into<String>) -> ArenaError {
    ArenaError::Corrupted {
        offset,
        reason: reason.into(),
    }
}

impl BoundaryTagAllocator {
    /// Verify the arena layout and free list.
    ///
    /// Checks that blocks tile the arena exactly, that every header agrees
    /// with its footer, that no two free blocks are adjacent, and that the
    /// free list holds exactly the free blocks, each once, without a cycle.
    /// Reports the first violation found.
    pub fn check_invariants(&self) -> Result<(), ArenaError> {
        let total = self.config.words;
        let mut free_set = IndexSet::new();
        let mut offset = 0u32;
        let mut prev_free = false;

        while offset < total {
            let header = self.memory[offset as usize];
            let tag = Tag::decode(header)
                .ok_or_else(|| corrupted(offset, format!("invalid header word {header}")))?;
            let end = u64::from(offset) + u64::from(tag.words);
            if end > u64::from(total) {
                return Err(corrupted(
                    offset,
                    format!("block of {} words overruns arena end {total}", tag.words),
                ));
            }
            let footer = self.memory[end as usize - 1];
            if footer != header {
                return Err(corrupted(
                    offset,
                    format!("header {header} disagrees with footer {footer}"),
                ));
            }
            if tag.is_free() {
                if prev_free {
                    return Err(corrupted(offset, "adjacent free blocks not coalesced"));
                }
                free_set.insert(offset);
            }
            prev_free = tag.is_free();
            offset = end as u32;
        }

        let mut listed = IndexSet::new();
        let mut cursor = self.free_head;
        while let Some(entry) = cursor {
            if !listed.insert(entry) {
                return Err(corrupted(entry, "free list revisits a block"));
            }
            if !free_set.contains(&entry) {
                return Err(corrupted(entry, "free list entry is not a free block"));
            }
            cursor = self.link_at(entry);
        }

        if let Some(&missing) = free_set.iter().find(|off| !listed.contains(*off)) {
            return Err(corrupted(missing, "free block missing from free list"));
        }
        Ok(())
    }

    /// Occupancy snapshot of the arena.
    pub fn stats(&self) -> ArenaStats {
        let mut stats = ArenaStats {
            total_words: self.config.words,
            ..Default::default()
        };
        for block in self.blocks() {
            match block.tag.state {
                BlockState::Free => {
                    stats.free_words += block.tag.words;
                    stats.free_blocks += 1;
                    stats.largest_free = stats.largest_free.max(block.tag.words);
                }
                BlockState::Allocated => {
                    stats.allocated_words += block.tag.words;
                    stats.allocated_blocks += 1;
                }
            }
        }
        stats
    }
}
