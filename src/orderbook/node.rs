//! Order node for slab-based storage.
//!
//! ## Design
//!
//! `OrderNode` wraps an [`Order`] with doubly-linked list pointers so a tick
//! queue can remove any member in O(1) when it holds the slab key.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys may be reused after `slab.remove()`
//! - O(1) insert, remove, and lookup
//!
//! Public order ids stay unique forever; slab keys do not. The engine keeps
//! an id -> key index and never hands slab keys across its API boundary.
//!
//! ## Linked List
//!
//! Orders at the same tick form a doubly-linked FIFO queue:
//! - `next`: the next (newer) order at the tick
//! - `prev`: the previous (older) order at the tick

use crate::types::Order;

/// Order node stored in the slab.
///
/// Contains the order data plus linked-list pointers for the tick queue.
/// The pointers are slab keys (`usize`), not direct references.
#[derive(Debug, Clone)]
pub struct OrderNode {
    /// The actual order data
    pub order: Order,

    /// Next order in the tick queue (slab key)
    /// None if this is the tail (newest order)
    pub next: Option<usize>,

    /// Previous order in the tick queue (slab key)
    /// None if this is the head (oldest order)
    pub prev: Option<usize>,
}

impl OrderNode {
    /// Create a new order node (not yet linked)
    #[inline]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            next: None,
            prev: None,
        }
    }

    /// Check if this node is unlinked (not part of any tick queue)
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }

    /// Get the order ID
    #[inline]
    pub fn order_id(&self) -> u128 {
        self.order.id
    }

    /// Get the tick the order rests at
    #[inline]
    pub fn tick(&self) -> i16 {
        self.order.tick
    }

    /// Get the remaining base amount
    #[inline]
    pub fn remaining(&self) -> u128 {
        self.order.remaining
    }

    /// Fill a portion of this order, clamped to its remaining size
    #[inline]
    pub fn fill(&mut self, amount: u128) -> u128 {
        self.order.fill(amount)
    }

    /// Check if the order is fully filled
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.order.is_filled()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderKind, Side};

    fn create_test_order(id: u128, amount: u128) -> Order {
        Order::new(id, 100, [0u8; 32], Side::Bid, -10, amount, OrderKind::Standard, 0)
    }

    #[test]
    fn test_order_node_new() {
        let order = create_test_order(1, 1000);
        let node = OrderNode::new(order.clone());

        assert_eq!(node.order, order);
        assert!(node.next.is_none());
        assert!(node.prev.is_none());
        assert!(node.is_unlinked());
    }

    #[test]
    fn test_order_node_accessors() {
        let node = OrderNode::new(create_test_order(42, 1000));

        assert_eq!(node.order_id(), 42);
        assert_eq!(node.tick(), -10);
        assert_eq!(node.remaining(), 1000);
        assert!(!node.is_filled());
    }

    #[test]
    fn test_order_node_fill() {
        let mut node = OrderNode::new(create_test_order(1, 1000));

        // Partial fill
        assert_eq!(node.fill(300), 300);
        assert_eq!(node.remaining(), 700);
        assert!(!node.is_filled());

        // Complete fill
        assert_eq!(node.fill(700), 700);
        assert_eq!(node.remaining(), 0);
        assert!(node.is_filled());
    }

    #[test]
    fn test_order_node_linking() {
        let mut node = OrderNode::new(create_test_order(1, 1000));

        assert!(node.is_unlinked());

        node.next = Some(2);
        assert!(!node.is_unlinked());

        node.prev = Some(0);
        node.next = None;
        assert!(!node.is_unlinked());
    }
}
