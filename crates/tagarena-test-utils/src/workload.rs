//! Deterministic allocate/free workloads.
//!
//! A script is a seeded sequence of [`ChurnOp`]s. Running it stamps every
//! payload with its own offset and checks the stamp before freeing, so two
//! blocks that overlap are caught even when the tags look fine.

use tagarena::{ArenaError, BoundaryTagAllocator, PayloadHandle, Word};

/// One step of a churn script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Allocate `bytes` bytes.
    Alloc { bytes: usize },
    /// Free the live block at `slot % live_count`. Skipped when nothing is live.
    Free { slot: usize },
}

/// Build a churn script of `len` operations.
///
/// Roughly one op in three is a free. Allocation sizes are in
/// `0..=max_bytes`. The same seed always yields the same script.
pub fn script(seed: u64, len: usize, max_bytes: usize) -> Vec<ChurnOp> {
    let mut state = seed;
    let mut ops = Vec::with_capacity(len);
    for _ in 0..len {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let op = if (state >> 33) % 3 == 0 {
            ChurnOp::Free {
                slot: (state >> 17) as usize,
            }
        } else {
            ChurnOp::Alloc {
                bytes: (state >> 40) as usize % (max_bytes + 1),
            }
        };
        ops.push(op);
    }
    ops
}

/// What a script run left behind.
#[derive(Debug, Default)]
pub struct ScriptOutcome {
    /// Handles still allocated, in allocation order (with swap-removes).
    pub live: Vec<PayloadHandle>,
    /// Successful allocations.
    pub allocated: usize,
    /// Allocations that returned `None`.
    pub failed: usize,
    /// Successful frees.
    pub freed: usize,
}

fn stamp(handle: PayloadHandle) -> Word {
    handle.offset() as Word
}

/// Run `ops` against `arena`, starting from an empty set of live handles.
///
/// Panics if a payload stamp was overwritten, which means two live blocks
/// overlapped.
pub fn run_script(
    arena: &mut BoundaryTagAllocator,
    ops: &[ChurnOp],
) -> Result<ScriptOutcome, ArenaError> {
    let mut outcome = ScriptOutcome::default();
    for op in ops {
        match *op {
            ChurnOp::Alloc { bytes } => match arena.allocate(bytes) {
                Some(handle) => {
                    arena.payload_mut(handle)?.fill(stamp(handle));
                    outcome.live.push(handle);
                    outcome.allocated += 1;
                }
                None => outcome.failed += 1,
            },
            ChurnOp::Free { slot } => {
                if outcome.live.is_empty() {
                    continue;
                }
                let handle = outcome.live.swap_remove(slot % outcome.live.len());
                assert_stamped(arena, handle)?;
                arena.free(Some(handle))?;
                outcome.freed += 1;
            }
        }
    }
    Ok(outcome)
}

/// Free every handle in `live`, checking stamps first.
pub fn drain(
    arena: &mut BoundaryTagAllocator,
    live: &mut Vec<PayloadHandle>,
) -> Result<(), ArenaError> {
    for handle in live.drain(..) {
        assert_stamped(arena, handle)?;
        arena.free(Some(handle))?;
    }
    Ok(())
}

fn assert_stamped(arena: &BoundaryTagAllocator, handle: PayloadHandle) -> Result<(), ArenaError> {
    let expected = stamp(handle);
    let payload = arena.payload(handle)?;
    assert!(
        payload.iter().all(|&w| w == expected),
        "payload of {handle} overwritten: {payload:?}"
    );
    Ok(())
}
