//! Integration tests: allocate/free scenarios on small arenas.
//!
//! Each test drives the allocator through the public API and checks the
//! arena with the compliance helpers after every step.

use tagarena::{ArenaError, BoundaryTagAllocator, PayloadHandle, Tag, BYTES_PER_WORD};
use tagarena_test_utils::compliance::{assert_all_invariants, assert_pristine};

fn arena(words: u32) -> BoundaryTagAllocator {
    BoundaryTagAllocator::with_words(words).unwrap()
}

fn layout(arena: &BoundaryTagAllocator) -> Vec<(u32, Tag)> {
    arena.blocks().map(|b| (b.offset(), b.tag)).collect()
}

// ── The 64-word walkthrough ─────────────────────────────────────────

#[test]
fn sixty_four_word_walkthrough() {
    assert_eq!(BYTES_PER_WORD, 4);
    let mut a = arena(64);
    assert_pristine(&a);

    let h = a.allocate(40).expect("40 bytes fit in 64 words");
    assert_all_invariants(&mut a);
    assert_eq!(layout(&a), vec![(0, Tag::allocated(12)), (12, Tag::free(52))]);

    a.free(Some(h)).unwrap();
    assert_all_invariants(&mut a);
    assert_pristine(&a);

    let before = a.raw_words().to_vec();
    assert!(a.allocate(1000).is_none());
    assert_eq!(a.raw_words(), &before[..]);
    assert_pristine(&a);
}

// ── Exhaustion ──────────────────────────────────────────────────────

#[test]
fn fill_to_exhaustion_then_fail_cleanly() {
    let mut a = arena(64);
    let mut live = Vec::new();
    // 4-word blocks: 16 of them tile the arena exactly.
    while let Some(h) = a.allocate(8) {
        live.push(h);
        assert_all_invariants(&mut a);
    }
    assert_eq!(live.len(), 16);
    assert_eq!(a.stats().free_words, 0);

    let before = a.raw_words().to_vec();
    assert!(a.allocate(0).is_none());
    assert_eq!(a.raw_words(), &before[..]);

    for h in live {
        a.free(Some(h)).unwrap();
        assert_all_invariants(&mut a);
    }
    assert_pristine(&a);
}

#[test]
fn fragmented_arena_fails_large_request() {
    let mut a = arena(64);
    let handles: Vec<PayloadHandle> = (0..8).map(|_| a.allocate(24).unwrap()).collect();
    // Free every other 8-word block: 32 free words, none contiguous beyond 8.
    for h in handles.iter().step_by(2) {
        a.free(Some(*h)).unwrap();
    }
    assert_all_invariants(&mut a);
    assert_eq!(a.stats().free_words, 32);
    assert_eq!(a.stats().largest_free, 8);

    let err = a.try_allocate(40).unwrap_err();
    assert!(matches!(
        err,
        ArenaError::CapacityExceeded {
            requested_words: Some(12),
            largest_free: 8,
            ..
        }
    ));
    assert_all_invariants(&mut a);
}

// ── Coalescing ──────────────────────────────────────────────────────

fn coalesce_pair(first_left: bool) {
    let mut a = arena(64);
    let guard_left = a.allocate(8).unwrap(); // [0..4)
    let left = a.allocate(16).unwrap(); // [4..10)
    let right = a.allocate(24).unwrap(); // [10..18)
    let guard_right = a.allocate(8).unwrap(); // [18..22)

    let order = if first_left { [left, right] } else { [right, left] };
    for h in order {
        a.free(Some(h)).unwrap();
        assert_all_invariants(&mut a);
    }
    assert_eq!(
        layout(&a),
        vec![
            (0, Tag::allocated(4)),
            (4, Tag::free(14)),
            (18, Tag::allocated(4)),
            (22, Tag::free(42)),
        ]
    );

    // The merged block serves a request of the combined size in place.
    let merged = a.allocate(12 * BYTES_PER_WORD).unwrap();
    assert_eq!(merged.offset(), 5);
    assert_eq!(a.size(a.block_of(merged)), 14);

    a.free(Some(merged)).unwrap();
    a.free(Some(guard_left)).unwrap();
    a.free(Some(guard_right)).unwrap();
    assert_pristine(&a);
}

#[test]
fn coalesce_left_then_right() {
    coalesce_pair(true);
}

#[test]
fn coalesce_right_then_left() {
    coalesce_pair(false);
}

#[test]
fn three_way_merge_keeps_single_list_entry() {
    let mut a = arena(64);
    let hs: Vec<PayloadHandle> = (0..5).map(|_| a.allocate(8).unwrap()).collect();
    a.free(Some(hs[1])).unwrap();
    a.free(Some(hs[3])).unwrap();
    a.free(Some(hs[2])).unwrap();
    assert_all_invariants(&mut a);
    assert_eq!(layout(&a)[1], (4, Tag::free(12)));
    assert_eq!(a.free_blocks().count(), 2);
}

#[test]
fn round_trip_restores_partition() {
    let mut a = arena(128);
    let _keep = a.allocate(20).unwrap();
    let _keep2 = a.allocate(36).unwrap();
    let other = a.allocate(12).unwrap();
    a.free(Some(other)).unwrap();
    let before = layout(&a);

    for bytes in [0, 1, 4, 17, 64, 200] {
        let h = a.allocate(bytes).unwrap();
        a.free(Some(h)).unwrap();
        assert_eq!(layout(&a), before, "round trip of {bytes} bytes");
        assert_all_invariants(&mut a);
    }
}

// ── Contract violations ─────────────────────────────────────────────

#[test]
fn rejected_frees_leave_arena_untouched() {
    let mut a = arena(64);
    let mut other = arena(64);
    let h = a.allocate(40).unwrap();
    let foreign = other.allocate(40).unwrap();
    let before = a.raw_words().to_vec();

    assert!(matches!(
        a.free(Some(foreign)),
        Err(ArenaError::ForeignHandle { .. })
    ));
    assert_eq!(a.raw_words(), &before[..]);

    a.free(Some(h)).unwrap();
    let before = a.raw_words().to_vec();
    assert!(matches!(
        a.free(Some(h)),
        Err(ArenaError::DoubleFree { .. })
    ));
    assert_eq!(a.raw_words(), &before[..]);
    assert_all_invariants(&mut a);
}

#[test]
fn null_free_is_noop() {
    let mut a = arena(64);
    let _h = a.allocate(4).unwrap();
    let before = a.raw_words().to_vec();
    assert!(a.free(None).is_ok());
    assert_eq!(a.raw_words(), &before[..]);
}

#[test]
fn minimal_arena_holds_one_block() {
    let mut a = arena(4);
    assert_pristine(&a);
    let h = a.allocate(8).unwrap();
    assert!(a.allocate(0).is_none());
    a.free(Some(h)).unwrap();
    assert_pristine(&a);
}
