//! # Stablebook
//!
//! Deterministic order-matching and settlement engine for
//! stablecoin-to-stablecoin exchange.
//!
//! ## Architecture
//!
//! - **Types**: orders, events, fill records, and the fixed-point price grid
//! - **OrderBook**: per-pair tick levels over a shared slab arena, with
//!   bitmap-indexed tick search
//! - **Bridge**: the trait boundary to token configuration, transfer
//!   policy, and external holdings
//! - **Engine**: the exchange itself — escrowed placement, flip orders,
//!   multi-hop swaps routed over the quote-token tree, and settlement
//!   receipts
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical operation sequences produce identical
//!    balances, books, and receipt state roots
//! 2. **No Floating Point**: settlement math is pure integer on a scaled
//!    price grid (10^5 units per 1.0) with explicit rounding everywhere
//! 3. **Escrow Covers Everything**: order value is locked in full at
//!    placement, so fills and refunds can never go negative
//! 4. **Pre-allocated Memory**: slab allocation for O(1) order operations

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, ExchangeEvent, Fill, SettlementReceipt
pub mod types;

/// Order book: tick levels, bitmaps, slab-backed FIFO queues
pub mod orderbook;

/// External collaborator boundary: TokenBridge
pub mod bridge;

/// Exchange engine: placement, swaps, routing, settlement
pub mod engine;

/// Error taxonomy shared by every operation
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use bridge::{InMemoryBridge, TokenBridge};
pub use engine::{Exchange, Hop};
pub use error::{ExchangeError, Result};
pub use orderbook::{pair_key, OrderBook};
pub use types::{ExchangeEvent, Fill, Order, OrderKind, PairKey, SettlementReceipt, Side};
