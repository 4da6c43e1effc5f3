//! Fill audit records and settlement receipts.
//!
//! Every fill the engine executes is appended to an audit log as a [`Fill`]
//! record. Draining the log produces a [`SettlementReceipt`] whose state
//! root commits to the exact fill sequence, so two runs of the same input
//! can be compared by a single 32-byte hash.

use sha2::{Digest, Sha256};
use ssz_rs::prelude::*;

/// One executed fill, in canonical audit form.
///
/// SSZ-encoded into the receipt state root. Field types stay within the SSZ
/// basic set so the encoding is fixed-size and unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Fill {
    /// Resting order that was hit.
    pub order_id: u128,

    /// Maker account of the resting order.
    pub maker: u64,

    /// Account whose swap consumed the order.
    pub taker: u64,

    /// Scaled price of the tick the fill executed at.
    pub price: u32,

    /// Base amount filled in this step.
    pub base_amount: u128,

    /// True when the resting order survived with remaining size.
    pub partial: bool,
}

/// Summary of a drained batch of engine operations.
///
/// The state root is `SHA-256` over the concatenated SSZ encodings of every
/// fill in the batch, in execution order. An empty batch commits to the
/// hash of the empty byte string.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct SettlementReceipt {
    /// Batch sequence number, caller-assigned.
    pub batch_id: u64,

    /// Orders placed since the previous receipt.
    pub orders_placed: u64,

    /// Fills executed since the previous receipt.
    pub fills_executed: u64,

    /// SHA-256 commitment to the batch's fill sequence.
    pub state_root: [u8; 32],

    /// Batch completion timestamp in milliseconds.
    pub timestamp: u64,
}

impl SettlementReceipt {
    /// Build a receipt committing to the given fill sequence.
    pub fn for_fills(batch_id: u64, orders_placed: u64, fills: &[Fill], timestamp: u64) -> Self {
        let mut hasher = Sha256::new();
        for fill in fills {
            // Fixed-size record; encoding cannot fail.
            let bytes = ssz_rs::serialize(fill).expect("fill record serializes");
            hasher.update(&bytes);
        }
        let mut state_root = [0u8; 32];
        state_root.copy_from_slice(&hasher.finalize());
        Self {
            batch_id,
            orders_placed,
            fills_executed: fills.len() as u64,
            state_root,
            timestamp,
        }
    }

    /// State root as a lowercase hex string.
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    /// True when the batch contained no placements and no fills.
    pub fn is_empty(&self) -> bool {
        self.orders_placed == 0 && self.fills_executed == 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fill(order_id: u128) -> Fill {
        Fill {
            order_id,
            maker: 100,
            taker: 200,
            price: 99_990,
            base_amount: 1000,
            partial: false,
        }
    }

    #[test]
    fn test_fill_ssz_roundtrip() {
        let fill = sample_fill(42);
        let bytes = ssz_rs::serialize(&fill).expect("serialize");
        let back: Fill = ssz_rs::deserialize(&bytes).expect("deserialize");
        assert_eq!(fill, back);
    }

    #[test]
    fn test_fill_serialization_deterministic() {
        let fill = sample_fill(42);
        let a = ssz_rs::serialize(&fill).expect("serialize");
        let b = ssz_rs::serialize(&fill).expect("serialize");
        assert_eq!(a, b);
    }

    #[test]
    fn test_receipt_commits_to_fill_sequence() {
        let fills = vec![sample_fill(1), sample_fill(2)];
        let a = SettlementReceipt::for_fills(1, 2, &fills, 0);
        let b = SettlementReceipt::for_fills(1, 2, &fills, 0);
        assert_eq!(a.state_root, b.state_root);
        assert_eq!(a.fills_executed, 2);

        // Order matters.
        let swapped = vec![sample_fill(2), sample_fill(1)];
        let c = SettlementReceipt::for_fills(1, 2, &swapped, 0);
        assert_ne!(a.state_root, c.state_root);
    }

    #[test]
    fn test_empty_receipt() {
        let receipt = SettlementReceipt::for_fills(1, 0, &[], 0);
        assert!(receipt.is_empty());
        // SHA-256 of the empty string.
        assert_eq!(
            receipt.state_root_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_receipt_ssz_roundtrip() {
        let receipt = SettlementReceipt::for_fills(7, 10, &[sample_fill(1)], 1_703_577_600_000);
        let bytes = ssz_rs::serialize(&receipt).expect("serialize");
        let back: SettlementReceipt = ssz_rs::deserialize(&bytes).expect("deserialize");
        assert_eq!(receipt, back);
    }

    #[test]
    fn test_state_root_hex_shape() {
        let receipt = SettlementReceipt::for_fills(1, 0, &[sample_fill(9)], 0);
        let hex = receipt.state_root_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
