//! Tick level management for orders resting at the same tick.
//!
//! ## Design
//!
//! A `TickLevel` represents all orders at a single tick on one side of a
//! pair. Orders are maintained in a doubly-linked list for FIFO ordering
//! (price-time priority).
//!
//! ## Queue Structure
//!
//! ```text
//! head (oldest) <-> order2 <-> order3 <-> tail (newest)
//! ```
//!
//! - New orders are appended at the tail
//! - Matching consumes orders from the head
//! - Any order can be removed in O(1) using the slab key
//!
//! The level tracks aggregate remaining liquidity; the book de-initializes
//! the tick's bitmap bit in the same step this reaches zero.

use crate::orderbook::OrderNode;
use slab::Slab;

/// A tick level containing orders at a single tick.
///
/// Orders are stored in a FIFO queue (doubly-linked list). The actual order
/// data lives in the slab; this struct only holds the queue metadata.
#[derive(Debug, Clone, Default)]
pub struct TickLevel {
    /// Total remaining base liquidity at this tick.
    /// Updated when orders are added/removed/filled.
    pub total_liquidity: u128,

    /// Head of the order queue (oldest order, slab key).
    /// This is the first order to be matched.
    pub head: Option<usize>,

    /// Tail of the order queue (newest order, slab key).
    /// New orders are appended here.
    pub tail: Option<usize>,

    /// Number of orders at this tick.
    pub order_count: usize,
}

impl TickLevel {
    /// Create a new empty tick level
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the tick level is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Add an order to the tail of the queue
    ///
    /// This maintains FIFO ordering - oldest orders are matched first.
    ///
    /// # Panics
    ///
    /// Panics if the key doesn't exist in the slab
    pub fn push_back(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let node = slab.get_mut(key).expect("Invalid slab key");
        let liquidity = node.remaining();

        // Update linked list pointers
        node.prev = self.tail;
        node.next = None;

        if let Some(tail_key) = self.tail {
            // Link the old tail to the new node
            let tail_node = slab.get_mut(tail_key).expect("Invalid tail key");
            tail_node.next = Some(key);
        } else {
            // Empty list - this is also the head
            self.head = Some(key);
        }

        self.tail = Some(key);
        self.order_count += 1;
        self.total_liquidity = self.total_liquidity.saturating_add(liquidity);
    }

    /// Remove an order from the queue by slab key
    ///
    /// # Returns
    ///
    /// The remaining liquidity of the removed order
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> u128 {
        let node = slab.get(key).expect("Invalid slab key");
        let liquidity = node.remaining();
        let prev_key = node.prev;
        let next_key = node.next;

        // Update the previous node's next pointer
        if let Some(prev) = prev_key {
            let prev_node = slab.get_mut(prev).expect("Invalid prev key");
            prev_node.next = next_key;
        } else {
            // This was the head
            self.head = next_key;
        }

        // Update the next node's prev pointer
        if let Some(next) = next_key {
            let next_node = slab.get_mut(next).expect("Invalid next key");
            next_node.prev = prev_key;
        } else {
            // This was the tail
            self.tail = prev_key;
        }

        // Clear the removed node's pointers
        let node = slab.get_mut(key).expect("Invalid slab key");
        node.prev = None;
        node.next = None;

        self.order_count -= 1;
        self.total_liquidity = self.total_liquidity.saturating_sub(liquidity);

        liquidity
    }

    /// Get the head order's slab key (oldest order)
    ///
    /// This is the first order to be matched at this tick.
    #[inline]
    pub fn peek_head(&self) -> Option<usize> {
        self.head
    }

    /// Update the aggregate liquidity after a partial fill
    pub fn reduce_liquidity(&mut self, filled: u128) {
        self.total_liquidity = self.total_liquidity.saturating_sub(filled);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
