//! Observer-facing events.
//!
//! Every committed state transition emits exactly one event. Events are an
//! append-only log drained by the caller via `Exchange::take_events`; a
//! failed operation emits nothing. Flip synthesis that silently no-ops also
//! emits nothing — only a successful successor placement is observable.

use crate::types::order::PairKey;

/// Facts emitted by the exchange engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeEvent {
    /// A new pair was registered (explicitly or on first placement).
    PairCreated { key: PairKey, base: u64, quote: u64 },

    /// An order entered the book, including flip successors.
    OrderPlaced {
        order_id: u128,
        maker: u64,
        /// Base token of the pair.
        token: u64,
        amount: u128,
        is_bid: bool,
        tick: i16,
        is_flip: bool,
        /// 0 for standard orders.
        flip_tick: i16,
        /// 0 when the maker supplied none.
        client_id: u128,
    },

    /// A resting order was hit by a swap.
    OrderFilled {
        order_id: u128,
        maker: u64,
        taker: u64,
        /// Base amount filled in this step.
        amount_filled: u128,
        /// True when the order survives with remaining size.
        partial_fill: bool,
    },

    /// An order left the book by explicit or stale cancellation.
    OrderCancelled { order_id: u128 },
}
