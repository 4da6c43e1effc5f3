//! Path resolution over the quote-token tree.
//!
//! ## Design
//!
//! Every token designates exactly one quote token, except the single root
//! token which designates none. The designations form a forest with no
//! cycles (enforced at token configuration time, not here). The path
//! between any two tokens is therefore unique: walk each token's ancestor
//! chain toward the root, find the lowest common ancestor, and join the
//! two half-paths. Uniqueness is the deliberate design property — there is
//! never an alternative route to compare, so liquidity cannot fragment
//! across competing paths.
//!
//! A hop is a (pair, direction) tuple: `base_for_quote = true` sells the
//! pair's base into its bids, `false` sells quote into its asks.

use std::collections::{HashMap, HashSet};

use crate::bridge::TokenBridge;
use crate::error::{ExchangeError, Result};
use crate::orderbook::{pair_key, OrderBook};
use crate::types::PairKey;

/// Upper bound on an ancestor chain. A well-formed token forest is shallow;
/// hitting this means the bridge reported a cycle.
const MAX_ROUTE_DEPTH: usize = 16;

/// One pair traversal within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// Pair to trade through.
    pub pair: PairKey,
    /// True: sell the pair's base into its bids. False: sell the pair's
    /// quote into its asks.
    pub base_for_quote: bool,
}

/// Resolve the unique route from `token_in` to `token_out`.
///
/// Fails with [`ExchangeError::NoTradePath`] when the tokens live in
/// disjoint trees and [`ExchangeError::PairDoesNotExist`] when a pair along
/// the derived path has not been created yet.
pub fn find_route<B: TokenBridge>(
    bridge: &B,
    books: &HashMap<PairKey, OrderBook>,
    token_in: u64,
    token_out: u64,
) -> Result<Vec<Hop>> {
    if token_in == token_out {
        return Err(ExchangeError::IdenticalTokens);
    }

    // Direct pair fast path: one token quotes against the other.
    if bridge.quote_token(token_in) == Some(token_out) {
        return Ok(vec![hop_exists(books, token_in, token_out, true)?]);
    }
    if bridge.quote_token(token_out) == Some(token_in) {
        return Ok(vec![hop_exists(books, token_out, token_in, false)?]);
    }

    let chain_in = ancestor_chain(bridge, token_in)?;
    let chain_out = ancestor_chain(bridge, token_out)?;

    // Lowest common ancestor of the two chains.
    let in_set: HashSet<u64> = chain_in.iter().copied().collect();
    let (lca_out_pos, lca) = chain_out
        .iter()
        .enumerate()
        .find(|(_, token)| in_set.contains(token))
        .map(|(pos, token)| (pos, *token))
        .ok_or(ExchangeError::NoTradePath)?;
    let lca_in_pos = chain_in
        .iter()
        .position(|&token| token == lca)
        .expect("lca is on both chains");

    // Ascend from token_in to the LCA selling base at each step, then
    // descend to token_out selling quote at each step.
    let mut hops = Vec::with_capacity(lca_in_pos + lca_out_pos);
    for i in 0..lca_in_pos {
        hops.push(hop_exists(books, chain_in[i], chain_in[i + 1], true)?);
    }
    for i in (0..lca_out_pos).rev() {
        hops.push(hop_exists(books, chain_out[i], chain_out[i + 1], false)?);
    }
    Ok(hops)
}

/// The token's chain toward its root, starting with the token itself.
fn ancestor_chain<B: TokenBridge>(bridge: &B, token: u64) -> Result<Vec<u64>> {
    let mut chain = vec![token];
    let mut current = token;
    while let Some(quote) = bridge.quote_token(current) {
        if chain.len() >= MAX_ROUTE_DEPTH {
            return Err(ExchangeError::NoTradePath);
        }
        chain.push(quote);
        current = quote;
    }
    Ok(chain)
}

/// Hop through the (base, quote) pair, requiring the pair to exist.
fn hop_exists(
    books: &HashMap<PairKey, OrderBook>,
    base: u64,
    quote: u64,
    base_for_quote: bool,
) -> Result<Hop> {
    let pair = pair_key(base, quote);
    if !books.contains_key(&pair) {
        return Err(ExchangeError::PairDoesNotExist);
    }
    Ok(Hop {
        pair,
        base_for_quote,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::InMemoryBridge;

    /// Tree: 0 is the root; 1 and 2 quote against 0; 3 quotes against 1.
    /// Separate tree: 5 is a root; 6 quotes against 5.
    fn fixture() -> (InMemoryBridge, HashMap<PairKey, OrderBook>) {
        let mut bridge = InMemoryBridge::new();
        bridge.register_root(0);
        bridge.register_token(1, 0);
        bridge.register_token(2, 0);
        bridge.register_token(3, 1);
        bridge.register_root(5);
        bridge.register_token(6, 5);

        let mut books = HashMap::new();
        for (base, quote) in [(1, 0), (2, 0), (3, 1), (6, 5)] {
            books.insert(pair_key(base, quote), OrderBook::new(base, quote));
        }
        (bridge, books)
    }

    #[test]
    fn test_identical_tokens() {
        let (bridge, books) = fixture();
        assert_eq!(
            find_route(&bridge, &books, 1, 1),
            Err(ExchangeError::IdenticalTokens)
        );
    }

    #[test]
    fn test_direct_routes() {
        let (bridge, books) = fixture();

        let up = find_route(&bridge, &books, 1, 0).unwrap();
        assert_eq!(up, vec![Hop { pair: pair_key(1, 0), base_for_quote: true }]);

        let down = find_route(&bridge, &books, 0, 1).unwrap();
        assert_eq!(down, vec![Hop { pair: pair_key(1, 0), base_for_quote: false }]);
    }

    #[test]
    fn test_sibling_route_through_root() {
        let (bridge, books) = fixture();
        let route = find_route(&bridge, &books, 1, 2).unwrap();
        assert_eq!(
            route,
            vec![
                Hop { pair: pair_key(1, 0), base_for_quote: true },
                Hop { pair: pair_key(2, 0), base_for_quote: false },
            ]
        );
    }

    #[test]
    fn test_deep_route() {
        let (bridge, books) = fixture();
        let route = find_route(&bridge, &books, 3, 2).unwrap();
        assert_eq!(
            route,
            vec![
                Hop { pair: pair_key(3, 1), base_for_quote: true },
                Hop { pair: pair_key(1, 0), base_for_quote: true },
                Hop { pair: pair_key(2, 0), base_for_quote: false },
            ]
        );

        // The reverse route mirrors direction at every hop.
        let back = find_route(&bridge, &books, 2, 3).unwrap();
        assert_eq!(
            back,
            vec![
                Hop { pair: pair_key(2, 0), base_for_quote: true },
                Hop { pair: pair_key(1, 0), base_for_quote: false },
                Hop { pair: pair_key(3, 1), base_for_quote: false },
            ]
        );
    }

    #[test]
    fn test_lca_short_circuits_root() {
        let (bridge, books) = fixture();
        // 3 -> 1 meets at 1 without touching the root.
        let route = find_route(&bridge, &books, 3, 1).unwrap();
        assert_eq!(route, vec![Hop { pair: pair_key(3, 1), base_for_quote: true }]);
    }

    #[test]
    fn test_disjoint_trees() {
        let (bridge, books) = fixture();
        assert_eq!(
            find_route(&bridge, &books, 1, 6),
            Err(ExchangeError::NoTradePath)
        );
    }

    #[test]
    fn test_missing_pair_on_path() {
        let (mut bridge, books) = fixture();
        // Token 4 is configured but its pair was never created.
        bridge.register_token(4, 0);
        assert_eq!(
            find_route(&bridge, &books, 4, 0),
            Err(ExchangeError::PairDoesNotExist)
        );
        assert_eq!(
            find_route(&bridge, &books, 1, 4),
            Err(ExchangeError::PairDoesNotExist)
        );
    }

    #[test]
    fn test_unconfigured_token_has_no_path() {
        let (bridge, books) = fixture();
        assert_eq!(
            find_route(&bridge, &books, 1, 99),
            Err(ExchangeError::NoTradePath)
        );
    }
}
