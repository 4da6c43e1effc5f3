//! Exchange engine: pairs, escrow, routing, matching, settlement.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: the same operation sequence always produces the same
//!    balances, books, and settlement receipts
//! 2. **Fixed-Point Math**: all settlement arithmetic is integer with
//!    explicit rounding, floors to takers and ceilings from takers
//! 3. **Quote-Then-Execute**: swaps are fully quoted over an immutable view
//!    before any fill mutates state, so failures never leave partial fills
//! 4. **Price-Time Priority**: best tick first, FIFO within a tick
//!
//! ## Example
//!
//! ```
//! use stablebook::bridge::InMemoryBridge;
//! use stablebook::engine::Exchange;
//!
//! let mut bridge = InMemoryBridge::new();
//! bridge.register_root(0);
//! bridge.register_token(1, 0);
//! bridge.fund(100, 1, 10_000);
//! bridge.fund(101, 0, 10_000);
//!
//! let mut exchange = Exchange::new(bridge);
//!
//! // Resting ask at tick 10 (price 1.0001).
//! exchange.place(100, 1, 1_000, false, 10, 0).unwrap();
//!
//! // Taker funds internal balance and swaps through it.
//! let bid = exchange.place(101, 1, 1_000, true, 0, 0).unwrap();
//! exchange.cancel(101, bid).unwrap();
//! let out = exchange.swap_exact_in(101, 0, 1, 500, 0).unwrap();
//! assert_eq!(out, 499); // 500 / 1.0001 floored
//! ```

pub mod exchange;
pub mod router;

pub use exchange::Exchange;
pub use router::{find_route, Hop};
