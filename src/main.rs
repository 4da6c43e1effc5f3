//! Stablebook - Demo Entry Point
//!
//! Walks one multi-hop swap end to end: two stablecoins quoting against a
//! shared USD root, resting liquidity on both pairs, and a settlement
//! receipt at the end.

use stablebook::bridge::InMemoryBridge;
use stablebook::engine::Exchange;
use stablebook::types::price::{price_to_decimal, tick_to_price};

const USD: u64 = 0;
const COIN_A: u64 = 1;
const COIN_B: u64 = 2;

const MAKER_A: u64 = 100;
const MAKER_B: u64 = 101;
const TAKER: u64 = 102;

fn main() {
    println!("===========================================");
    println!("  Stablebook - matching engine demo");
    println!("===========================================");
    println!();

    let mut bridge = InMemoryBridge::new();
    bridge.register_root(USD);
    bridge.register_token(COIN_A, USD);
    bridge.register_token(COIN_B, USD);
    bridge.fund(MAKER_A, USD, 10_000);
    bridge.fund(MAKER_B, COIN_B, 10_000);
    bridge.fund(TAKER, COIN_A, 10_000);

    let mut exchange = Exchange::new(bridge);

    // Maker A bids for COIN_A below parity; maker B asks COIN_B above it.
    println!("Placing resting liquidity...");
    exchange
        .place(MAKER_A, COIN_A, 1_000, true, -10, 0)
        .expect("bid placement");
    exchange
        .place(MAKER_B, COIN_B, 1_000, false, 10, 0)
        .expect("ask placement");
    println!("  bid  COIN_A @ {}", price_to_decimal(tick_to_price(-10)));
    println!("  ask  COIN_B @ {}", price_to_decimal(tick_to_price(10)));
    println!();

    // Swaps spend internal balance; a place-and-cancel round trip pulls the
    // taker's external COIN_A in through the escrow path.
    let funding = exchange
        .place(TAKER, COIN_A, 1_000, false, 2000, 0)
        .expect("funding placement");
    exchange.cancel(TAKER, funding).expect("funding cancel");

    println!("Swapping 1000 COIN_A -> COIN_B through USD...");
    let quoted = exchange
        .quote_swap_exact_in(COIN_A, COIN_B, 1_000)
        .expect("quote");
    let out = exchange
        .swap_exact_in(TAKER, COIN_A, COIN_B, 1_000, quoted)
        .expect("swap");
    println!("  quoted: {quoted}");
    println!("  filled: {out}");
    println!("  taker COIN_B balance: {}", exchange.balance_of(TAKER, COIN_B));
    println!();

    println!("Events:");
    for event in exchange.take_events() {
        println!("  {event:?}");
    }
    println!();

    let receipt = exchange.settle_batch(1, 1_700_000_000);
    println!("Settlement receipt:");
    println!("  batch:      {}", receipt.batch_id);
    println!("  orders:     {}", receipt.orders_placed);
    println!("  fills:      {}", receipt.fills_executed);
    println!("  state root: {}", receipt.state_root_hex());
}
