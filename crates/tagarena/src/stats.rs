//! Point-in-time occupancy figures for an arena.

/// Occupancy snapshot produced by
/// [`BoundaryTagAllocator::stats`](crate::BoundaryTagAllocator::stats).
///
/// All sizes are in words and include boundary tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Arena length.
    pub total_words: u32,
    /// Words held by free blocks.
    pub free_words: u32,
    /// Words held by allocated blocks.
    pub allocated_words: u32,
    /// Number of free blocks.
    pub free_blocks: u32,
    /// Number of allocated blocks.
    pub allocated_blocks: u32,
    /// Length of the largest free block, 0 if none.
    pub largest_free: u32,
}

impl ArenaStats {
    /// Share of free space that is not part of the largest free block.
    ///
    /// 0.0 means all free words are contiguous (or nothing is free); values
    /// near 1.0 mean free space is scattered across many small blocks.
    pub fn fragmentation(&self) -> f64 {
        if self.free_words == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.largest_free) / f64::from(self.free_words)
    }

    /// Total number of blocks in the arena.
    pub fn block_count(&self) -> u32 {
        self.free_blocks + self.allocated_blocks
    }
}
