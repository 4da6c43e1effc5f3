//! Orderbook data structures.
//!
//! ## Architecture
//!
//! Books are arena-backed: all order nodes live in one `Slab` on the engine,
//! and each pair's [`OrderBook`] holds FIFO queues of slab keys per tick plus
//! a per-side [`TickBitmap`] for initialized-tick queries.
//!
//! ## Components
//!
//! - [`OrderNode`]: wrapper around `Order` with linked-list pointers
//! - [`TickLevel`]: FIFO queue of orders at a single tick
//! - [`TickBitmap`]: two-level initialized-tick index per side
//! - [`OrderBook`]: per-pair state (levels, bitmaps, best ticks)
//!
//! ## Performance
//!
//! | Operation                 | Complexity |
//! |---------------------------|------------|
//! | Insert order at tick      | O(1)       |
//! | Remove order by slab key  | O(1)       |
//! | Best bid/ask              | O(1)       |
//! | Next initialized tick     | O(1)       |

pub mod bitmap;
pub mod book;
pub mod level;
pub mod node;

pub use bitmap::TickBitmap;
pub use book::{pair_key, OrderBook, NO_ASK, NO_BID};
pub use level::TickLevel;
pub use node::OrderNode;
