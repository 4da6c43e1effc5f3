//! Per-pair orderbook state.
//!
//! ## Architecture
//!
//! An [`OrderBook`] owns everything specific to one trading pair:
//!
//! - tick levels per side (`HashMap<i16, TickLevel>`), each a FIFO queue
//!   over the shared order arena
//! - one [`TickBitmap`] per side tracking which ticks hold liquidity
//! - best-tick pointers with empty-side sentinels
//!
//! The order arena itself is shared across all pairs and lives on the
//! engine; the book only stores slab keys.
//!
//! ## Pair Identity
//!
//! A pair's key is the SHA-256 digest of its two token ids in sorted order,
//! so `pair_key(a, b) == pair_key(b, a)` and the key is stable across runs.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::orderbook::{TickBitmap, TickLevel};
use crate::types::{PairKey, Side};

/// Sentinel for `best_bid_tick` when the bid side is empty.
pub const NO_BID: i16 = i16::MIN;

/// Sentinel for `best_ask_tick` when the ask side is empty.
pub const NO_ASK: i16 = i16::MAX;

/// Deterministic, order-independent pair key.
pub fn pair_key(token_a: u64, token_b: u64) -> PairKey {
    let (lo, hi) = if token_a <= token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };
    let mut hasher = Sha256::new();
    hasher.update(lo.to_be_bytes());
    hasher.update(hi.to_be_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

/// Orderbook for a single (base, quote) pair.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Base token id.
    pub base: u64,

    /// Quote token id. Fixed at creation even if the base token's
    /// quote-token setting later changes.
    pub quote: u64,

    /// Highest tick holding bid liquidity, or [`NO_BID`].
    pub best_bid_tick: i16,

    /// Lowest tick holding ask liquidity, or [`NO_ASK`].
    pub best_ask_tick: i16,

    bids: HashMap<i16, TickLevel>,
    asks: HashMap<i16, TickLevel>,
    bid_bitmap: TickBitmap,
    ask_bitmap: TickBitmap,
}

impl OrderBook {
    pub fn new(base: u64, quote: u64) -> Self {
        Self {
            base,
            quote,
            best_bid_tick: NO_BID,
            best_ask_tick: NO_ASK,
            bids: HashMap::new(),
            asks: HashMap::new(),
            bid_bitmap: TickBitmap::new(),
            ask_bitmap: TickBitmap::new(),
        }
    }

    /// This pair's deterministic key.
    pub fn key(&self) -> PairKey {
        pair_key(self.base, self.quote)
    }

    /// Best tick for a side, sentinel when empty.
    #[inline]
    pub fn best_tick(&self, side: Side) -> i16 {
        match side {
            Side::Bid => self.best_bid_tick,
            Side::Ask => self.best_ask_tick,
        }
    }

    /// Whether the side holds any liquidity at all.
    #[inline]
    pub fn has_liquidity(&self, side: Side) -> bool {
        match side {
            Side::Bid => self.best_bid_tick != NO_BID,
            Side::Ask => self.best_ask_tick != NO_ASK,
        }
    }

    /// Whether resting an order at `tick` on `side` would cross the book.
    ///
    /// Equality with the opposite best tick is allowed; only strictly
    /// passing it crosses.
    pub fn would_cross(&self, side: Side, tick: i16) -> bool {
        match side {
            Side::Bid => self.best_ask_tick != NO_ASK && tick > self.best_ask_tick,
            Side::Ask => self.best_bid_tick != NO_BID && tick < self.best_bid_tick,
        }
    }

    #[inline]
    pub fn level(&self, side: Side, tick: i16) -> Option<&TickLevel> {
        match side {
            Side::Bid => self.bids.get(&tick),
            Side::Ask => self.asks.get(&tick),
        }
    }

    #[inline]
    pub fn level_mut(&mut self, side: Side, tick: i16) -> Option<&mut TickLevel> {
        match side {
            Side::Bid => self.bids.get_mut(&tick),
            Side::Ask => self.asks.get_mut(&tick),
        }
    }

    /// Level for a tick, created empty if absent.
    pub fn ensure_level(&mut self, side: Side, tick: i16) -> &mut TickLevel {
        match side {
            Side::Bid => self.bids.entry(tick).or_default(),
            Side::Ask => self.asks.entry(tick).or_default(),
        }
    }

    /// Mark a tick as holding liquidity and advance the best pointer if it
    /// became the new top of book.
    pub fn initialize_tick(&mut self, side: Side, tick: i16) {
        match side {
            Side::Bid => {
                self.bid_bitmap.set(tick);
                if tick > self.best_bid_tick {
                    self.best_bid_tick = tick;
                }
            }
            Side::Ask => {
                self.ask_bitmap.set(tick);
                if tick < self.best_ask_tick {
                    self.best_ask_tick = tick;
                }
            }
        }
    }

    /// Drop an emptied tick: remove its level, clear its bit, and when it
    /// was the best tick, search away from the top of book for the
    /// successor (sentinel when the side is now empty).
    pub fn deinitialize_tick(&mut self, side: Side, tick: i16) {
        match side {
            Side::Bid => {
                self.bids.remove(&tick);
                self.bid_bitmap.clear(tick);
                if self.best_bid_tick == tick {
                    self.best_bid_tick =
                        self.bid_bitmap.next_initialized(tick, true).unwrap_or(NO_BID);
                }
            }
            Side::Ask => {
                self.asks.remove(&tick);
                self.ask_bitmap.clear(tick);
                if self.best_ask_tick == tick {
                    self.best_ask_tick =
                        self.ask_bitmap.next_initialized(tick, false).unwrap_or(NO_ASK);
                }
            }
        }
    }

    /// Next initialized tick away from the top of book: downward for bids,
    /// upward for asks. Downward search includes `from` itself.
    pub fn next_initialized(&self, side: Side, from: i16) -> Option<i16> {
        match side {
            Side::Bid => self.bid_bitmap.next_initialized(from, true),
            Side::Ask => self.ask_bitmap.next_initialized(from, false),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
