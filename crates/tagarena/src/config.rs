//! Arena configuration parameters.

use crate::error::ArenaError;
use crate::tag::{BYTES_PER_WORD, MIN_BLOCK_WORDS};

/// Configuration for a [`BoundaryTagAllocator`](crate::BoundaryTagAllocator).
///
/// The arena size is fixed for the allocator's lifetime. Validated at
/// construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Arena length in words.
    ///
    /// Must be at least [`MIN_BLOCK_WORDS`] and at most [`Self::MAX_WORDS`].
    pub words: u32,
}

impl ArenaConfig {
    /// Default arena length: 1024 words (4KB).
    pub const DEFAULT_WORDS: u32 = 1024;

    /// Largest arena whose block sizes still fit in a signed tag word.
    pub const MAX_WORDS: u32 = i32::MAX as u32;

    /// Create a config for an arena of `words` words.
    pub fn new(words: u32) -> Self {
        Self { words }
    }

    /// Check that the arena can hold at least one block and that every
    /// block size is representable as a tag.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.words < MIN_BLOCK_WORDS || self.words > Self::MAX_WORDS {
            return Err(ArenaError::InvalidConfig {
                words: self.words,
                minimum: MIN_BLOCK_WORDS,
                maximum: Self::MAX_WORDS,
            });
        }
        Ok(())
    }

    /// Total arena size in bytes.
    pub fn arena_bytes(&self) -> usize {
        self.words as usize * BYTES_PER_WORD
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORDS)
    }
}
