//! Order types for the tick orderbook.
//!
//! ## Order Kinds
//!
//! - **Standard orders** rest until filled or cancelled.
//! - **Flip orders** carry a target tick; when fully filled they synthesize
//!   a successor order on the opposite side at the target tick, with the
//!   original tick as the new target. A flip chain alternates sides
//!   indefinitely while the maker's internal balance can fund the escrow.
//!
//! ## Lifecycle
//!
//! Open -> PartiallyFilled* -> Filled | Cancelled. Terminal states are never
//! re-entered; a filled flip order's successor is a brand new order with a
//! fresh id. FIFO queue links live on the arena node, not here.

/// Pair identity: order-independent digest of the two token ids.
pub type PairKey = [u8; 32];

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buying base with quote; escrows quote.
    Bid,
    /// Selling base for quote; escrows base.
    Ask,
}

impl Side {
    /// Build from the public API's `is_bid` flag.
    #[inline]
    pub fn from_is_bid(is_bid: bool) -> Self {
        if is_bid {
            Side::Bid
        } else {
            Side::Ask
        }
    }

    #[inline]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// The side a flip successor rests on.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// Standard vs flip, checked once at synthesis time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Plain resting order.
    Standard,
    /// Recreates itself on the opposite side at `flip_tick` once filled.
    Flip { flip_tick: i16 },
}

/// A resting limit order.
///
/// Amounts are always denominated in the pair's base token; the quote-side
/// escrow is derived from the tick price at placement time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Monotonic id, unique for the lifetime of the system (starts at 1).
    pub id: u128,

    /// Account that placed the order and owns its escrow.
    pub maker: u64,

    /// The pair this order rests on.
    pub pair: PairKey,

    /// Bid or ask.
    pub side: Side,

    /// Price tick the order rests at.
    pub tick: i16,

    /// Original base amount.
    pub amount: u128,

    /// Unfilled base amount. Zero means the order is terminal.
    pub remaining: u128,

    /// Standard or flip.
    pub kind: OrderKind,

    /// Caller-supplied correlation id; 0 means none. Unique only among the
    /// maker's currently live orders, and inherited across flips.
    pub client_id: u128,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u128,
        maker: u64,
        pair: PairKey,
        side: Side,
        tick: i16,
        amount: u128,
        kind: OrderKind,
        client_id: u128,
    ) -> Self {
        Self {
            id,
            maker,
            pair,
            side,
            tick,
            amount,
            remaining: amount,
            kind,
            client_id,
        }
    }

    /// Fill up to `amount` base units, clamped to the remaining size.
    ///
    /// Returns the amount actually filled.
    #[inline]
    pub fn fill(&mut self, amount: u128) -> u128 {
        let filled = amount.min(self.remaining);
        self.remaining -= filled;
        filled
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    #[inline]
    pub fn is_flip(&self) -> bool {
        matches!(self.kind, OrderKind::Flip { .. })
    }

    /// The flip target tick, if this is a flip order.
    #[inline]
    pub fn flip_tick(&self) -> Option<i16> {
        match self.kind {
            OrderKind::Flip { flip_tick } => Some(flip_tick),
            OrderKind::Standard => None,
        }
    }

    /// Construct the successor a filled flip order synthesizes.
    ///
    /// Opposite side, resting at the old target tick with the old resting
    /// tick as the new target, full original amount, client id preserved.
    /// Returns `None` for standard orders.
    pub fn flipped(&self, new_id: u128) -> Option<Order> {
        let OrderKind::Flip { flip_tick } = self.kind else {
            return None;
        };
        debug_assert!(self.is_filled(), "flip synthesis requires a filled order");
        Some(Order {
            id: new_id,
            maker: self.maker,
            pair: self.pair,
            side: self.side.opposite(),
            tick: flip_tick,
            amount: self.amount,
            remaining: self.amount,
            kind: OrderKind::Flip {
                flip_tick: self.tick,
            },
            client_id: self.client_id,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order(id: u128, kind: OrderKind) -> Order {
        Order::new(id, 7, [0u8; 32], Side::Bid, -10, 1000, kind, 42)
    }

    #[test]
    fn test_side() {
        assert_eq!(Side::from_is_bid(true), Side::Bid);
        assert_eq!(Side::from_is_bid(false), Side::Ask);
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert!(Side::Bid.is_bid());
        assert!(!Side::Ask.is_bid());
    }

    #[test]
    fn test_order_new() {
        let order = test_order(1, OrderKind::Standard);
        assert_eq!(order.id, 1);
        assert_eq!(order.amount, 1000);
        assert_eq!(order.remaining, 1000);
        assert!(!order.is_filled());
        assert!(!order.is_flip());
        assert_eq!(order.flip_tick(), None);
    }

    #[test]
    fn test_fill_clamps() {
        let mut order = test_order(1, OrderKind::Standard);
        assert_eq!(order.fill(300), 300);
        assert_eq!(order.remaining, 700);
        // Over-fill is clamped to what remains.
        assert_eq!(order.fill(5000), 700);
        assert!(order.is_filled());
        assert_eq!(order.fill(1), 0);
    }

    #[test]
    fn test_flipped_successor() {
        let mut order = test_order(5, OrderKind::Flip { flip_tick: 20 });
        order.fill(1000);

        let successor = order.flipped(6).unwrap();
        assert_eq!(successor.id, 6);
        assert_eq!(successor.side, Side::Ask);
        assert_eq!(successor.tick, 20);
        assert_eq!(successor.kind, OrderKind::Flip { flip_tick: -10 });
        assert_eq!(successor.amount, 1000);
        assert_eq!(successor.remaining, 1000);
        assert_eq!(successor.client_id, 42);
        assert_eq!(successor.maker, order.maker);
        assert_eq!(successor.pair, order.pair);
    }

    #[test]
    fn test_flipped_round_trip_restores_ticks() {
        let mut order = test_order(1, OrderKind::Flip { flip_tick: -10 });
        order.fill(1000);
        let mut successor = order.flipped(2).unwrap();
        // Same-tick flip: target equals the resting tick.
        assert_eq!(successor.tick, -10);
        successor.fill(1000);
        let third = successor.flipped(3).unwrap();
        assert_eq!(third.side, order.side);
        assert_eq!(third.tick, order.tick);
        assert_eq!(third.client_id, order.client_id);
    }

    #[test]
    fn test_standard_order_never_flips() {
        let mut order = test_order(1, OrderKind::Standard);
        order.fill(1000);
        assert!(order.flipped(2).is_none());
    }
}
