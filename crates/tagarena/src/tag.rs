//! Boundary-tag word encoding.
//!
//! Every block stores its size in a header word and a footer word. The sign
//! carries the block state: positive magnitude is free, negative magnitude is
//! allocated. In Rust the state is decoded into a [`Tag`] so that callers
//! never reason about sign bits directly; the signed form only exists inside
//! the arena (and in raw dumps).

use std::fmt;

/// Storage unit of the arena. Holds a tag, a free-list link, or payload.
pub type Word = i32;

/// Width of one [`Word`] in bytes.
pub const BYTES_PER_WORD: usize = std::mem::size_of::<Word>();

/// End-of-list sentinel stored in a free block's `next` word.
pub const NIL: Word = -1;

/// Smallest block the allocator ever creates, in words.
///
/// Layout: header, next link, reserved, footer. Allocated blocks obey the
/// same minimum so that any block can be turned back into a free block.
pub const MIN_BLOCK_WORDS: u32 = 4;

/// Word offset of the `next` link relative to a free block's header.
pub(crate) const LINK_OFFSET: usize = 1;

/// Whether a block is on the free list or handed out to a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// On the free list; encoded with a positive magnitude.
    Free,
    /// Owned by a caller; encoded with a negative magnitude.
    Allocated,
}

/// Decoded header or footer word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Block state.
    pub state: BlockState,
    /// Block length in words, tags included.
    pub words: u32,
}

impl Tag {
    /// A free tag of `words` words.
    pub fn free(words: u32) -> Self {
        Self {
            state: BlockState::Free,
            words,
        }
    }

    /// An allocated tag of `words` words.
    pub fn allocated(words: u32) -> Self {
        Self {
            state: BlockState::Allocated,
            words,
        }
    }

    /// Whether this tag marks a free block.
    pub fn is_free(&self) -> bool {
        self.state == BlockState::Free
    }

    /// Signed in-arena representation.
    ///
    /// `words` is bounded by the arena size, which [`ArenaConfig`] caps at
    /// `i32::MAX`, so the conversion is lossless.
    ///
    /// [`ArenaConfig`]: crate::config::ArenaConfig
    pub fn encode(&self) -> Word {
        let magnitude = self.words as Word;
        match self.state {
            BlockState::Free => magnitude,
            BlockState::Allocated => -magnitude,
        }
    }

    /// Decode a signed tag word.
    ///
    /// Returns `None` for magnitudes below [`MIN_BLOCK_WORDS`], which no
    /// valid block can have.
    pub fn decode(word: Word) -> Option<Self> {
        let words = word.unsigned_abs();
        if words < MIN_BLOCK_WORDS {
            return None;
        }
        let state = if word > 0 {
            BlockState::Free
        } else {
            BlockState::Allocated
        };
        Some(Self { state, words })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            BlockState::Free => write!(f, "free({})", self.words),
            BlockState::Allocated => write!(f, "allocated({})", self.words),
        }
    }
}

/// Block length needed to serve a request of `bytes` bytes.
///
/// Rounds the payload up to whole words, adds the header and footer, and
/// raises the result to [`MIN_BLOCK_WORDS`]. Returns `None` if the result
/// does not fit in a `u32`.
pub fn words_for_bytes(bytes: usize) -> Option<u32> {
    let payload = bytes.div_ceil(BYTES_PER_WORD);
    let words = payload.checked_add(2)?;
    let words = u32::try_from(words).ok()?;
    Some(words.max(MIN_BLOCK_WORDS))
}

/// Encode an arena offset as a link word.
pub(crate) fn encode_link(offset: Option<u32>) -> Word {
    match offset {
        Some(off) => off as Word,
        None => NIL,
    }
}

/// Decode a link word. Any negative value is treated as end-of-list.
pub(crate) fn decode_link(word: Word) -> Option<u32> {
    u32::try_from(word).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tags_are_positive() {
        assert_eq!(Tag::free(12).encode(), 12);
        assert_eq!(Tag::allocated(12).encode(), -12);
    }

    #[test]
    fn decode_recovers_state_and_size() {
        assert_eq!(Tag::decode(64), Some(Tag::free(64)));
        assert_eq!(Tag::decode(-7), Some(Tag::allocated(7)));
    }

    #[test]
    fn undersized_words_do_not_decode() {
        for w in -3..=3 {
            assert_eq!(Tag::decode(w), None, "word {w} decoded");
        }
    }

    #[test]
    fn words_for_bytes_rounds_up_and_adds_tags() {
        // 40 bytes on 4-byte words: 10 payload words + 2 tags.
        assert_eq!(words_for_bytes(40), Some(12));
        assert_eq!(words_for_bytes(41), Some(13));
        assert_eq!(words_for_bytes(9), Some(5));
    }

    #[test]
    fn words_for_bytes_enforces_minimum_block() {
        assert_eq!(words_for_bytes(0), Some(MIN_BLOCK_WORDS));
        assert_eq!(words_for_bytes(1), Some(MIN_BLOCK_WORDS));
        assert_eq!(words_for_bytes(8), Some(MIN_BLOCK_WORDS));
    }

    #[test]
    fn words_for_bytes_overflow_is_none() {
        assert_eq!(words_for_bytes(usize::MAX), None);
    }

    #[test]
    fn links_round_trip_nil() {
        assert_eq!(encode_link(None), NIL);
        assert_eq!(decode_link(NIL), None);
        assert_eq!(decode_link(encode_link(Some(16))), Some(16));
    }

    #[test]
    fn display_names_state() {
        assert_eq!(Tag::free(8).to_string(), "free(8)");
        assert_eq!(Tag::allocated(4).to_string(), "allocated(4)");
    }
}
