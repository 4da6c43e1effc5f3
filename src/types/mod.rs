//! Core data types for the exchange engine.
//!
//! ## Types
//!
//! - [`Order`]: a resting limit order (standard or flip)
//! - [`Side`]: bid or ask
//! - [`OrderKind`]: standard vs flip variant with its target tick
//! - [`ExchangeEvent`]: observer-facing event log entries
//! - [`Fill`] / [`SettlementReceipt`]: audit records with SSZ state roots
//!
//! ## Price Representation
//!
//! Prices are scaled integers on a tick grid: `price = PRICE_SCALE + tick`
//! with `PRICE_SCALE = 100_000`. See [`price`] for conversions and bounds.

mod event;
mod order;
mod receipt;
pub mod price;

// Re-export all types at module level
pub use event::ExchangeEvent;
pub use order::{Order, OrderKind, PairKey, Side};
pub use receipt::{Fill, SettlementReceipt};
