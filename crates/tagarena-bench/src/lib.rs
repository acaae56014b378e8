//! Benchmark profiles for the tagarena allocator.
//!
//! - [`reference_profile`]: 64K-word arena (256KB) with a mixed-size script
//! - [`stress_profile`]: 4K-word arena driven close to exhaustion
//! - [`fragmented_arena`]: arena with every other block freed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tagarena::{BoundaryTagAllocator, PayloadHandle};
use tagarena_test_utils::workload::{script, ChurnOp};

/// A benchmark arena size paired with a deterministic churn script.
pub struct Profile {
    /// Arena length in words.
    pub words: u32,
    /// Operations to replay.
    pub ops: Vec<ChurnOp>,
}

impl Profile {
    /// A fresh arena sized for this profile.
    pub fn arena(&self) -> BoundaryTagAllocator {
        BoundaryTagAllocator::with_words(self.words).unwrap()
    }
}

/// 65_536-word arena, 10K ops, requests up to 256 bytes.
pub fn reference_profile(seed: u64) -> Profile {
    Profile {
        words: 65_536,
        ops: script(seed, 10_000, 256),
    }
}

/// 4_096-word arena, 10K ops, requests up to 1KB: most allocations race
/// against exhaustion.
pub fn stress_profile(seed: u64) -> Profile {
    Profile {
        words: 4_096,
        ops: script(seed, 10_000, 1_024),
    }
}

/// Tile `words` words with `block_bytes`-sized blocks, then free every other
/// one. Returns the arena and the handles still allocated.
pub fn fragmented_arena(
    words: u32,
    block_bytes: usize,
) -> (BoundaryTagAllocator, Vec<PayloadHandle>) {
    let mut arena = BoundaryTagAllocator::with_words(words).unwrap();
    let mut handles = Vec::new();
    while let Some(h) = arena.allocate(block_bytes) {
        handles.push(h);
    }
    let mut kept = Vec::with_capacity(handles.len() / 2 + 1);
    for (i, h) in handles.into_iter().enumerate() {
        if i % 2 == 0 {
            arena.free(Some(h)).unwrap();
        } else {
            kept.push(h);
        }
    }
    (arena, kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_deterministic() {
        let a = reference_profile(42);
        let b = reference_profile(42);
        assert_eq!(a.ops, b.ops);
        assert_eq!(a.arena().words(), 65_536);
    }

    #[test]
    #[should_panic(expected = "InvalidConfig")]
    fn fragmented_arena_rejects_undersized_arena() {
        let _ = fragmented_arena(2, 24);
    }

    #[test]
    #[should_panic(expected = "InvalidConfig")]
    fn profile_rejects_undersized_arena() {
        let profile = Profile {
            words: 3,
            ops: Vec::new(),
        };
        let _ = profile.arena();
    }

    #[test]
    fn fragmented_arena_alternates() {
        let (arena, kept) = fragmented_arena(256, 24);
        let stats = arena.stats();
        assert_eq!(stats.allocated_blocks as usize, kept.len());
        assert_eq!(stats.free_blocks, 16);
        assert_eq!(stats.largest_free, 8);
    }
}
