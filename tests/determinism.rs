//! Determinism tests for the exchange engine.
//!
//! These tests verify:
//! 1. The same operation sequence always yields the same receipts
//! 2. Balances and order ids replay identically
//! 3. No token is ever minted, whatever the operation mix
//!
//! ## Running
//!
//! ```bash
//! cargo test --test determinism -- --nocapture
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use stablebook::bridge::InMemoryBridge;
use stablebook::engine::Exchange;
use stablebook::SettlementReceipt;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

const USD: u64 = 0;
const COINS: [u64; 3] = [1, 2, 3];
const ACCOUNTS: [u64; 6] = [100, 101, 102, 103, 104, 105];

/// Operations per scripted run.
const OP_COUNT: usize = 5_000;

/// External funding per (account, token).
const FUNDING: u128 = 10_000_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn build_exchange() -> Exchange<InMemoryBridge> {
    let mut bridge = InMemoryBridge::new();
    bridge.register_root(USD);
    for coin in COINS {
        bridge.register_token(coin, USD);
    }
    for account in ACCOUNTS {
        bridge.fund(account, USD, FUNDING);
        for coin in COINS {
            bridge.fund(account, coin, FUNDING);
        }
    }
    let mut exchange = Exchange::with_capacity(bridge, OP_COUNT);
    for coin in COINS {
        exchange.create_pair(coin, USD).expect("pair");
    }
    // Swaps spend internal balances; seed them through escrow round trips.
    for account in ACCOUNTS {
        for token in [USD, COINS[0], COINS[1], COINS[2]] {
            let order_id = match token {
                USD => exchange.place(account, COINS[0], 100_000, true, 0, 0),
                coin => exchange.place(account, coin, 100_000, false, 2000, 0),
            }
            .expect("funding placement");
            exchange.cancel(account, order_id).expect("funding cancel");
        }
    }
    exchange
}

/// Drive a seeded operation mix. Individual operations are allowed to fail
/// (crossing, slippage, exhausted balances); what matters is that the whole
/// run is a pure function of the seed.
fn run_scripted_session(seed: u64) -> (Exchange<InMemoryBridge>, SettlementReceipt) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut exchange = build_exchange();

    for _ in 0..OP_COUNT {
        let account = ACCOUNTS[rng.gen_range(0..ACCOUNTS.len())];
        let coin = COINS[rng.gen_range(0..COINS.len())];
        let tick = rng.gen_range(-100i16..=100) * 10;
        let amount = rng.gen_range(1u128..=5_000);

        match rng.gen_range(0u8..100) {
            0..=34 => {
                let is_bid = rng.gen_bool(0.5);
                let client_id = rng.gen_range(0u128..50);
                let _ = exchange.place(account, coin, amount, is_bid, tick, client_id);
            }
            35..=49 => {
                let is_bid = rng.gen_bool(0.5);
                let offset = rng.gen_range(0i16..=20) * 10;
                let flip_tick = if is_bid { tick + offset } else { tick - offset };
                let _ = exchange.place_flip(
                    account,
                    coin,
                    amount,
                    is_bid,
                    tick,
                    flip_tick.clamp(-2000, 2000),
                    0,
                );
            }
            50..=79 => {
                let (token_in, token_out) = if rng.gen_bool(0.5) {
                    (USD, coin)
                } else {
                    (coin, USD)
                };
                if rng.gen_bool(0.5) {
                    let _ = exchange.swap_exact_in(account, token_in, token_out, amount, 0);
                } else {
                    let _ = exchange.swap_exact_out(account, token_in, token_out, amount, u128::MAX);
                }
            }
            80..=89 => {
                let order_id = rng.gen_range(1u128..=exchange.next_order_id().max(2) - 1);
                let _ = exchange.cancel(account, order_id);
            }
            _ => {
                let _ = exchange.withdraw(account, coin, amount);
            }
        }
    }

    let receipt = exchange.settle_batch(1, 0);
    (exchange, receipt)
}

/// A token's grand total: external holdings plus internal balances across
/// every account. Excludes escrow locked in resting orders and stranded
/// rounding dust, both of which only ever shrink the total.
fn circulating(exchange: &Exchange<InMemoryBridge>, token: u64) -> u128 {
    ACCOUNTS
        .iter()
        .map(|&a| exchange.bridge().holding_of(a, token) + exchange.balance_of(a, token))
        .sum()
}

// ============================================================================
// DETERMINISM TESTS
// ============================================================================

/// Same seed, same receipts, same balances, same order ids.
#[test]
fn determinism_identical_replay() {
    let (first, first_receipt) = run_scripted_session(42);
    let (second, second_receipt) = run_scripted_session(42);

    assert_eq!(first_receipt, second_receipt);
    assert_eq!(first_receipt.state_root, second_receipt.state_root);
    assert_eq!(first.next_order_id(), second.next_order_id());

    for account in ACCOUNTS {
        for token in [USD, COINS[0], COINS[1], COINS[2]] {
            assert_eq!(
                first.balance_of(account, token),
                second.balance_of(account, token),
                "account {account} token {token}"
            );
            assert_eq!(
                first.bridge().holding_of(account, token),
                second.bridge().holding_of(account, token),
                "account {account} token {token}"
            );
        }
    }
}

/// Different seeds land on different fill sequences; the receipt hash is a
/// meaningful fingerprint, not a constant.
#[test]
fn determinism_seed_sensitivity() {
    let (_, receipt_a) = run_scripted_session(42);
    let (_, receipt_b) = run_scripted_session(43);

    assert!(receipt_a.fills_executed > 0, "seed 42 produced no fills");
    assert_ne!(receipt_a.state_root, receipt_b.state_root);
}

/// Whatever the operation mix, no token total ever grows.
#[test]
fn determinism_no_token_minted() {
    let initial_total = FUNDING * ACCOUNTS.len() as u128;
    let (exchange, receipt) = run_scripted_session(7);
    assert!(receipt.fills_executed > 0, "seed 7 produced no fills");

    for token in [USD, COINS[0], COINS[1], COINS[2]] {
        let total = circulating(&exchange, token);
        assert!(
            total <= initial_total,
            "token {token}: {total} exceeds funded {initial_total}"
        );
    }
}
