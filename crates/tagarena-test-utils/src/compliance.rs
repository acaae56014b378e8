//! Allocator invariant assertions.
//!
//! These walk the arena through the public surface (cursor, raw words,
//! free-list iterator) rather than trusting
//! [`BoundaryTagAllocator::check_invariants`], so a bug in the audit does
//! not hide a bug in the allocator.

use indexmap::IndexSet;
use tagarena::{BoundaryTagAllocator, Tag};

/// Assert that walking from offset 0 by header magnitudes lands exactly on
/// the arena end.
pub fn assert_partitioned(arena: &mut BoundaryTagAllocator) {
    let total = arena.words();
    let mut expected = 0u32;
    arena.start();
    while let Some(block) = arena.next() {
        assert_eq!(
            block.offset(),
            expected,
            "block at {} but previous block ended at {expected}",
            block.offset()
        );
        let size = arena.size(block);
        assert!(size > 0, "zero-sized block at {expected}");
        expected += size;
    }
    assert_eq!(expected, total, "blocks cover {expected} of {total} words");
}

/// Assert that every block's footer repeats its header.
pub fn assert_tags_symmetric(arena: &BoundaryTagAllocator) {
    let words = arena.raw_words();
    for block in arena.blocks() {
        let start = block.offset() as usize;
        let header = words[start];
        let footer = words[start + block.words() as usize - 1];
        assert_eq!(
            header, footer,
            "block at {start}: header {header} != footer {footer}"
        );
        assert_eq!(Tag::decode(header), Some(block.tag));
    }
}

/// Assert that no two consecutive blocks are both free.
pub fn assert_no_adjacent_free(arena: &BoundaryTagAllocator) {
    let mut prev: Option<(u32, bool)> = None;
    for block in arena.blocks() {
        if let Some((prev_offset, true)) = prev {
            assert!(
                !block.is_free(),
                "free blocks at {prev_offset} and {} are adjacent",
                block.offset()
            );
        }
        prev = Some((block.offset(), block.is_free()));
    }
}

/// Assert that the free list holds exactly the free blocks, once each.
pub fn assert_free_list_exact(arena: &BoundaryTagAllocator) {
    let free: IndexSet<u32> = arena
        .blocks()
        .filter(|b| b.is_free())
        .map(|b| b.offset())
        .collect();
    let mut listed = IndexSet::new();
    for entry in arena.free_blocks() {
        assert!(
            entry.is_free(),
            "free list holds allocated block at {}",
            entry.offset()
        );
        assert!(
            listed.insert(entry.offset()),
            "free list visits {} twice",
            entry.offset()
        );
    }
    assert_eq!(
        free.len(),
        listed.len(),
        "free blocks {free:?} vs free list {listed:?}"
    );
    for offset in &free {
        assert!(listed.contains(offset), "free block {offset} not on list");
    }
}

/// Assert that the arena is a single free block, as after construction.
pub fn assert_pristine(arena: &BoundaryTagAllocator) {
    let blocks: Vec<_> = arena.blocks().collect();
    assert_eq!(blocks.len(), 1, "expected one block, found {}", blocks.len());
    assert!(blocks[0].is_free());
    assert_eq!(blocks[0].words(), arena.words());
    assert_eq!(arena.free_blocks().count(), 1);
}

/// Run every invariant assertion plus the allocator's own audit.
///
/// Leaves the block cursor at its end.
pub fn assert_all_invariants(arena: &mut BoundaryTagAllocator) {
    assert_partitioned(arena);
    assert_tags_symmetric(arena);
    assert_no_adjacent_free(arena);
    assert_free_list_exact(arena);
    if let Err(err) = arena.check_invariants() {
        panic!("check_invariants failed: {err}");
    }
}
