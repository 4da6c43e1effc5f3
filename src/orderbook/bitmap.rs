//! Two-level bitmap index over the tick range.
//!
//! ## Design
//!
//! One bit per tick, grouped into 64-bit words, plus a summary word with
//! one bit per non-empty word. "Next initialized tick" queries mask the
//! starting word and then jump via the summary, so a swap walk never scans
//! the full tick range linearly even across wide gaps in liquidity.
//!
//! ## Layout
//!
//! Ticks shift by `-MIN_TICK` into `0..=4000`:
//!
//! ```text
//! word  = index / 64     (63 words cover the range)
//! bit   = index % 64
//! summary bit w is set iff words[w] != 0
//! ```
//!
//! The book keeps one bitmap per side. A bit is set iff the tick's level
//! holds nonzero liquidity; the bit clears in the same step the level
//! empties.

use crate::types::price::{MAX_TICK, MIN_TICK};

const TICK_COUNT: usize = (MAX_TICK as i32 - MIN_TICK as i32 + 1) as usize;
const WORD_BITS: usize = 64;
const NUM_WORDS: usize = (TICK_COUNT + WORD_BITS - 1) / WORD_BITS;

/// Initialized-tick index for one side of one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickBitmap {
    /// Bit `w` set iff `words[w]` is nonzero.
    summary: u64,
    /// Per-tick bits, 64 ticks per word.
    words: [u64; NUM_WORDS],
}

impl Default for TickBitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl TickBitmap {
    pub fn new() -> Self {
        Self {
            summary: 0,
            words: [0u64; NUM_WORDS],
        }
    }

    #[inline]
    fn index(tick: i16) -> usize {
        debug_assert!((MIN_TICK..=MAX_TICK).contains(&tick));
        (tick as i32 - MIN_TICK as i32) as usize
    }

    #[inline]
    fn tick_at(index: usize) -> i16 {
        (index as i32 + MIN_TICK as i32) as i16
    }

    /// Whether the tick currently holds liquidity.
    #[inline]
    pub fn is_set(&self, tick: i16) -> bool {
        let idx = Self::index(tick);
        self.words[idx / WORD_BITS] & (1u64 << (idx % WORD_BITS)) != 0
    }

    /// Mark a tick initialized.
    pub fn set(&mut self, tick: i16) {
        let idx = Self::index(tick);
        let word = idx / WORD_BITS;
        self.words[word] |= 1u64 << (idx % WORD_BITS);
        self.summary |= 1u64 << word;
    }

    /// Mark a tick empty.
    pub fn clear(&mut self, tick: i16) {
        let idx = Self::index(tick);
        let word = idx / WORD_BITS;
        self.words[word] &= !(1u64 << (idx % WORD_BITS));
        if self.words[word] == 0 {
            self.summary &= !(1u64 << word);
        }
    }

    /// Nearest initialized tick from `from` in the given direction.
    ///
    /// `lte = true` searches downward and is inclusive of `from`;
    /// `lte = false` searches strictly upward. Returns `None` when no
    /// initialized tick remains in that direction.
    pub fn next_initialized(&self, from: i16, lte: bool) -> Option<i16> {
        if lte {
            self.next_down(from)
        } else {
            self.next_up(from)
        }
    }

    /// Greatest set tick <= from.
    fn next_down(&self, from: i16) -> Option<i16> {
        let idx = from.min(MAX_TICK) as i32 - MIN_TICK as i32;
        if idx < 0 {
            return None;
        }
        let idx = idx as usize;
        let (word, bit) = (idx / WORD_BITS, idx % WORD_BITS);

        // Bits at or below the starting position within its word.
        let mask = if bit == WORD_BITS - 1 {
            u64::MAX
        } else {
            (1u64 << (bit + 1)) - 1
        };
        let masked = self.words[word] & mask;
        if masked != 0 {
            let hi = WORD_BITS - 1 - masked.leading_zeros() as usize;
            return Some(Self::tick_at(word * WORD_BITS + hi));
        }

        // Jump to the nearest non-empty word below via the summary.
        let summary_below = self.summary & ((1u64 << word) - 1);
        if summary_below == 0 {
            return None;
        }
        let word = 63 - summary_below.leading_zeros() as usize;
        let hi = WORD_BITS - 1 - self.words[word].leading_zeros() as usize;
        Some(Self::tick_at(word * WORD_BITS + hi))
    }

    /// Smallest set tick > from.
    fn next_up(&self, from: i16) -> Option<i16> {
        let start = from as i32 - MIN_TICK as i32 + 1;
        let start = start.max(0) as usize;
        if start >= TICK_COUNT {
            return None;
        }
        let (word, bit) = (start / WORD_BITS, start % WORD_BITS);

        let masked = self.words[word] & (u64::MAX << bit);
        if masked != 0 {
            let lo = masked.trailing_zeros() as usize;
            return Some(Self::tick_at(word * WORD_BITS + lo));
        }

        // Jump to the nearest non-empty word above via the summary.
        let summary_above = self.summary & (u64::MAX << (word + 1));
        if summary_above == 0 {
            return None;
        }
        let word = summary_above.trailing_zeros() as usize;
        let lo = self.words[word].trailing_zeros() as usize;
        Some(Self::tick_at(word * WORD_BITS + lo))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
