//! The exchange engine: pairs, escrow, matching, and settlement.
//!
//! ## Architecture
//!
//! [`Exchange`] is the single owner of all mutable state:
//!
//! - one [`OrderBook`] per pair, keyed by the pair digest
//! - one shared `Slab` arena holding every live order node
//! - the internal balance ledger, `(account, token) -> amount`
//! - the event log and the per-batch fill log
//!
//! External effects (token configuration, transfer policy, external
//! holdings) go through the [`TokenBridge`] the engine is constructed with.
//!
//! ## Matching
//!
//! Swaps walk resting liquidity tick by tick from the top of book, FIFO
//! within a tick. Every swap is quoted in full over an immutable view
//! first; only a quote that satisfies the caller's slippage bound is then
//! executed, so a failed swap never leaves partial fills behind.
//!
//! ## Escrow
//!
//! Placement locks the full order value up front: asks lock the base
//! amount, bids lock the quote value rounded up. From that point every
//! payout to the maker or refund on cancel is covered by construction, and
//! rounding remainders stay inside the engine rather than going negative.

use std::collections::HashMap;
use std::mem;

use slab::Slab;

use crate::bridge::TokenBridge;
use crate::engine::router::{self, Hop};
use crate::error::{ExchangeError, Result};
use crate::orderbook::{pair_key, OrderBook, OrderNode};
use crate::types::price::{self, Rounding};
use crate::types::{ExchangeEvent, Fill, Order, OrderKind, PairKey, SettlementReceipt, Side};

/// Order-matching and settlement engine over a [`TokenBridge`].
#[derive(Debug, Clone)]
pub struct Exchange<B: TokenBridge> {
    bridge: B,

    /// Per-pair books. Never removed once created.
    books: HashMap<PairKey, OrderBook>,

    /// Shared order arena; tick queues link nodes by slab key.
    arena: Slab<OrderNode>,

    /// Public order id -> slab key for every live order.
    order_index: HashMap<u128, usize>,

    /// (maker, client id) -> live order id. Entries exist only while the
    /// order (or its current flip successor) is resting.
    client_ids: HashMap<(u64, u128), u128>,

    /// Internal balance ledger, (account, token) -> amount.
    balances: HashMap<(u64, u64), u128>,

    /// Next public order id. Starts at 1 and never repeats.
    next_order_id: u128,

    /// Append-only event log, drained by the caller.
    events: Vec<ExchangeEvent>,

    /// Fill records accumulated since the last settlement batch.
    fill_log: Vec<Fill>,

    /// Orders placed since the last settlement batch.
    orders_placed: u64,
}

impl<B: TokenBridge> Exchange<B> {
    pub fn new(bridge: B) -> Self {
        Self::with_capacity(bridge, 0)
    }

    /// Pre-size the order arena for a known load.
    pub fn with_capacity(bridge: B, orders: usize) -> Self {
        Self {
            bridge,
            books: HashMap::new(),
            arena: Slab::with_capacity(orders),
            order_index: HashMap::with_capacity(orders),
            client_ids: HashMap::new(),
            balances: HashMap::new(),
            next_order_id: 1,
            events: Vec::new(),
            fill_log: Vec::new(),
            orders_placed: 0,
        }
    }

    // ========================================================================
    // Pair Management
    // ========================================================================

    /// Explicitly create the (base, quote) pair.
    ///
    /// The quote must be the base token's current or pending quote token.
    /// A pair created against a pending designation starts inactive: it can
    /// hold orders but swaps will not route through it until the
    /// designation activates.
    pub fn create_pair(&mut self, base: u64, quote: u64) -> Result<PairKey> {
        if base == quote {
            return Err(ExchangeError::IdenticalTokens);
        }
        let current = self.bridge.quote_token(base);
        let pending = self.bridge.pending_quote_token(base);
        if current != Some(quote) && pending != Some(quote) {
            return Err(ExchangeError::TokenNotEligible);
        }
        if self.books.contains_key(&pair_key(base, quote)) {
            return Err(ExchangeError::PairAlreadyExists);
        }
        Ok(self.insert_book(base, quote))
    }

    fn insert_book(&mut self, base: u64, quote: u64) -> PairKey {
        let key = pair_key(base, quote);
        self.books.insert(key, OrderBook::new(base, quote));
        self.events
            .push(ExchangeEvent::PairCreated { key, base, quote });
        key
    }

    /// The pair a placement on `token` lands on: the token against its
    /// current quote token. Created lazily on first use.
    ///
    /// Creation happens only after every fallible placement check has
    /// passed, so a failed placement never leaves a pair behind.
    fn active_pair_tokens(&self, token: u64) -> Result<(u64, u64)> {
        let quote = self
            .bridge
            .quote_token(token)
            .ok_or(ExchangeError::TokenNotEligible)?;
        if token == quote {
            return Err(ExchangeError::IdenticalTokens);
        }
        Ok((token, quote))
    }

    /// Whether a book still matches its base token's current quote setting.
    /// Books created against a pending designation, or orphaned by a quote
    /// change, are inactive: they skip the crossing check and never route.
    fn is_active(&self, book: &OrderBook) -> bool {
        self.bridge.quote_token(book.base) == Some(book.quote)
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// Place a resting limit order on `token` against its quote token.
    ///
    /// Returns the new order id. Escrow comes from the caller's internal
    /// balance first, with the shortfall pulled through the bridge.
    pub fn place(
        &mut self,
        account: u64,
        token: u64,
        amount: u128,
        is_bid: bool,
        tick: i16,
        client_id: u128,
    ) -> Result<u128> {
        price::validate_tick(tick)?;
        if amount == 0 {
            return Err(ExchangeError::ZeroAmount);
        }
        let (base, quote) = self.active_pair_tokens(token)?;
        self.place_order(
            account,
            base,
            quote,
            amount,
            Side::from_is_bid(is_bid),
            tick,
            OrderKind::Standard,
            client_id,
            false,
            true,
        )
    }

    /// Place a flip order: once fully filled it re-enters the book on the
    /// opposite side at `flip_tick`, with the original tick as the new
    /// target.
    ///
    /// A bid's flip target must not be below its tick, an ask's must not be
    /// above; equality is allowed and yields a same-tick perpetual flip.
    pub fn place_flip(
        &mut self,
        account: u64,
        token: u64,
        amount: u128,
        is_bid: bool,
        tick: i16,
        flip_tick: i16,
        client_id: u128,
    ) -> Result<u128> {
        price::validate_tick(tick)?;
        price::validate_tick(flip_tick)?;
        if amount == 0 {
            return Err(ExchangeError::ZeroAmount);
        }
        let side = Side::from_is_bid(is_bid);
        let valid = match side {
            Side::Bid => flip_tick >= tick,
            Side::Ask => flip_tick <= tick,
        };
        if !valid {
            return Err(ExchangeError::InvalidFlipTick);
        }
        let (base, quote) = self.active_pair_tokens(token)?;
        self.place_order(
            account,
            base,
            quote,
            amount,
            side,
            tick,
            OrderKind::Flip { flip_tick },
            client_id,
            false,
            true,
        )
    }

    /// Shared placement path for user orders and flip successors.
    ///
    /// `internal_only` restricts escrow to the internal balance (flip
    /// synthesis never touches the bridge); `enforce_crossing` is off for
    /// flip successors, whose tick was validated against the original order.
    #[allow(clippy::too_many_arguments)]
    fn place_order(
        &mut self,
        account: u64,
        base: u64,
        quote: u64,
        amount: u128,
        side: Side,
        tick: i16,
        kind: OrderKind,
        client_id: u128,
        internal_only: bool,
        enforce_crossing: bool,
    ) -> Result<u128> {
        let pair = pair_key(base, quote);

        if enforce_crossing {
            if let Some(book) = self.books.get(&pair) {
                if self.is_active(book) && book.would_cross(side, tick) {
                    return Err(ExchangeError::OrderWouldCross);
                }
            }
        }
        if client_id != 0 && self.client_ids.contains_key(&(account, client_id)) {
            return Err(ExchangeError::DuplicateClientId);
        }

        // Lock the full order value. Bids round the quote escrow up so the
        // locked amount always covers the worst-case payout.
        let (escrow_token, escrow_amount) = match side {
            Side::Bid => (quote, price::base_to_quote(amount, tick, Rounding::Up)?),
            Side::Ask => (base, amount),
        };
        self.escrow(account, escrow_token, escrow_amount, internal_only)?;

        // Committed: everything below is infallible.
        if !self.books.contains_key(&pair) {
            self.insert_book(base, quote);
        }

        let id = self.next_order_id;
        self.next_order_id += 1;

        let order = Order::new(id, account, pair, side, tick, amount, kind, client_id);
        let node_key = self.arena.insert(OrderNode::new(order));
        self.order_index.insert(id, node_key);
        if client_id != 0 {
            self.client_ids.insert((account, client_id), id);
        }

        let book = self.books.get_mut(&pair).expect("book exists after insert");
        let level = book.ensure_level(side, tick);
        let was_empty = level.is_empty();
        level.push_back(node_key, &mut self.arena);
        if was_empty {
            book.initialize_tick(side, tick);
        }

        self.orders_placed += 1;
        self.events.push(ExchangeEvent::OrderPlaced {
            order_id: id,
            maker: account,
            token: base,
            amount,
            is_bid: side.is_bid(),
            tick,
            is_flip: matches!(kind, OrderKind::Flip { .. }),
            flip_tick: match kind {
                OrderKind::Flip { flip_tick } => flip_tick,
                OrderKind::Standard => 0,
            },
            client_id,
        });
        Ok(id)
    }

    /// Escrow `amount` of `token` from the account.
    fn escrow(&mut self, account: u64, token: u64, amount: u128, internal_only: bool) -> Result<()> {
        if !self.bridge.is_authorized(account, token) {
            return Err(ExchangeError::Unauthorized);
        }
        let held = self.balance_of(account, token);
        if held >= amount || internal_only {
            return self.debit(account, token, amount);
        }
        // Shortfall comes through the bridge; the whole internal balance is
        // consumed alongside it.
        self.bridge.transfer_in(account, token, amount - held)?;
        self.balances.insert((account, token), 0);
        Ok(())
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancel the caller's own order and refund its remaining escrow to the
    /// caller's internal balance.
    ///
    /// Bid refunds round up, mirroring the round-up at escrow time: an
    /// unfilled place-then-cancel round trip returns exactly what was
    /// locked.
    pub fn cancel(&mut self, caller: u64, order_id: u128) -> Result<()> {
        let (node_key, order) = self.live_order(order_id)?;
        if order.maker != caller {
            return Err(ExchangeError::Unauthorized);
        }
        self.remove_with_refund(node_key, &order)
    }

    /// Cancel someone else's stale order.
    ///
    /// An order is stale when its maker is no longer authorized to transfer
    /// the escrowed token. The refund still goes to the original maker's
    /// internal balance, never to the caller.
    pub fn cancel_stale(&mut self, _caller: u64, order_id: u128) -> Result<()> {
        let (node_key, order) = self.live_order(order_id)?;
        let book = self.books.get(&order.pair).expect("order pair exists");
        let escrow_token = match order.side {
            Side::Bid => book.quote,
            Side::Ask => book.base,
        };
        if self.bridge.is_authorized(order.maker, escrow_token) {
            return Err(ExchangeError::OrderNotStale);
        }
        self.remove_with_refund(node_key, &order)
    }

    fn live_order(&self, order_id: u128) -> Result<(usize, Order)> {
        let node_key = *self
            .order_index
            .get(&order_id)
            .ok_or(ExchangeError::OrderDoesNotExist)?;
        Ok((node_key, self.arena[node_key].order.clone()))
    }

    fn remove_with_refund(&mut self, node_key: usize, order: &Order) -> Result<()> {
        let book = self.books.get(&order.pair).expect("order pair exists");
        let (token, refund) = match order.side {
            Side::Bid => (
                book.quote,
                price::base_to_quote(order.remaining, order.tick, Rounding::Up)?,
            ),
            Side::Ask => (book.base, order.remaining),
        };
        self.credit(order.maker, token, refund)?;
        self.unlink_order(node_key, order);
        self.events
            .push(ExchangeEvent::OrderCancelled { order_id: order.id });
        Ok(())
    }

    /// Remove a live order from its tick queue, the arena, and the indexes.
    fn unlink_order(&mut self, node_key: usize, order: &Order) {
        let book = self.books.get_mut(&order.pair).expect("order pair exists");
        let level = book
            .level_mut(order.side, order.tick)
            .expect("level exists for resting order");
        level.remove(node_key, &mut self.arena);
        let emptied = level.is_empty();
        if emptied {
            book.deinitialize_tick(order.side, order.tick);
        }
        self.arena.remove(node_key);
        self.order_index.remove(&order.id);
        if order.client_id != 0 {
            self.client_ids.remove(&(order.maker, order.client_id));
        }
    }

    // ========================================================================
    // Swaps
    // ========================================================================

    /// Swap an exact input amount along the unique route between the tokens.
    ///
    /// The full route is quoted first; if the output would fall below
    /// `min_amount_out` nothing is executed. Returns the output amount.
    pub fn swap_exact_in(
        &mut self,
        taker: u64,
        token_in: u64,
        token_out: u64,
        amount_in: u128,
        min_amount_out: u128,
    ) -> Result<u128> {
        let route = router::find_route(&self.bridge, &self.books, token_in, token_out)?;
        let expected = self.quote_route_exact_in(&route, amount_in)?;
        if expected < min_amount_out {
            return Err(ExchangeError::InsufficientOutput);
        }

        self.debit(taker, token_in, amount_in)?;
        let mut amount = amount_in;
        for hop in &route {
            amount = self.fill_exact_in(hop, amount, taker)?;
        }
        debug_assert_eq!(amount, expected);
        self.credit(taker, token_out, amount)?;
        Ok(amount)
    }

    /// Swap for an exact output amount. Fails without executing when the
    /// required input exceeds `max_amount_in`. Returns the input amount.
    pub fn swap_exact_out(
        &mut self,
        taker: u64,
        token_in: u64,
        token_out: u64,
        amount_out: u128,
        max_amount_in: u128,
    ) -> Result<u128> {
        let route = router::find_route(&self.bridge, &self.books, token_in, token_out)?;
        let required = self.quote_route_exact_out(&route, amount_out)?;
        if required > max_amount_in {
            return Err(ExchangeError::MaxInputExceeded);
        }

        self.debit(taker, token_in, required)?;
        // Execute from the output token back toward the input token so each
        // hop knows exactly how much it must deliver.
        let mut needed = amount_out;
        for hop in route.iter().rev() {
            needed = self.fill_exact_out(hop, needed, taker)?;
        }
        debug_assert_eq!(needed, required);
        self.credit(taker, token_out, amount_out)?;
        Ok(required)
    }

    /// Quote [`Self::swap_exact_in`] without touching any state.
    pub fn quote_swap_exact_in(
        &self,
        token_in: u64,
        token_out: u64,
        amount_in: u128,
    ) -> Result<u128> {
        let route = router::find_route(&self.bridge, &self.books, token_in, token_out)?;
        self.quote_route_exact_in(&route, amount_in)
    }

    /// Quote [`Self::swap_exact_out`] without touching any state.
    pub fn quote_swap_exact_out(
        &self,
        token_in: u64,
        token_out: u64,
        amount_out: u128,
    ) -> Result<u128> {
        let route = router::find_route(&self.bridge, &self.books, token_in, token_out)?;
        self.quote_route_exact_out(&route, amount_out)
    }

    fn quote_route_exact_in(&self, route: &[Hop], amount_in: u128) -> Result<u128> {
        let mut amount = amount_in;
        for hop in route {
            amount = self.quote_fill_exact_in(hop, amount)?;
        }
        Ok(amount)
    }

    fn quote_route_exact_out(&self, route: &[Hop], amount_out: u128) -> Result<u128> {
        let mut amount = amount_out;
        for hop in route.iter().rev() {
            amount = self.quote_fill_exact_out(hop, amount)?;
        }
        Ok(amount)
    }

    // ========================================================================
    // Fill Walks
    // ========================================================================
    //
    // The mutating walks assume a successful quote over the same state, so
    // running out of liquidity mid-walk cannot happen on the swap path.
    //
    // Rounding is asymmetric on purpose: takers receive floor amounts and
    // pay ceiling amounts, so every remainder stays escrowed inside the
    // engine instead of being minted.

    /// Best tick and head order for one walk step.
    fn walk_head(&self, pair: &PairKey, side: Side) -> Result<(i16, usize)> {
        let book = self.books.get(pair).ok_or(ExchangeError::PairDoesNotExist)?;
        if !book.has_liquidity(side) {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        let tick = book.best_tick(side);
        let head = book
            .level(side, tick)
            .and_then(|level| level.peek_head())
            .expect("initialized tick holds orders");
        Ok((tick, head))
    }

    /// Consume resting liquidity with a fixed input amount. Returns the
    /// output amount.
    fn fill_exact_in(&mut self, hop: &Hop, amount_in: u128, taker: u64) -> Result<u128> {
        let (base, quote, side) = self.hop_tokens(hop)?;
        let mut remaining_in = amount_in;
        let mut amount_out: u128 = 0;

        while remaining_in > 0 {
            let (tick, head) = self.walk_head(&hop.pair, side)?;
            let (maker, resting) = {
                let node = &self.arena[head];
                (node.order.maker, node.remaining())
            };

            match side {
                // Taker sells base into bids: maker receives base, taker
                // accrues floor-rounded quote out of the maker's escrow.
                Side::Bid => {
                    let fill = remaining_in.min(resting);
                    let quote_out = price::base_to_quote(fill, tick, Rounding::Down)?;
                    self.credit(maker, base, fill)?;
                    amount_out = amount_out
                        .checked_add(quote_out)
                        .ok_or(ExchangeError::BalanceOverflow)?;
                    remaining_in -= fill;
                    if fill == resting {
                        self.settle_full_fill(head, taker);
                    } else {
                        self.apply_partial_fill(hop.pair, side, tick, head, taker, fill);
                    }
                }
                // Taker sells quote into asks.
                Side::Ask => {
                    let base_cap = price::quote_to_base(remaining_in, tick, Rounding::Down)?;
                    if base_cap >= resting {
                        // Whole order: the taker pays its ceiling-rounded
                        // quote value, which the input is proven to cover.
                        let cost = price::base_to_quote(resting, tick, Rounding::Up)?;
                        self.credit(maker, quote, cost)?;
                        amount_out = amount_out
                            .checked_add(resting)
                            .ok_or(ExchangeError::BalanceOverflow)?;
                        debug_assert!(cost <= remaining_in);
                        remaining_in -= cost;
                        self.settle_full_fill(head, taker);
                    } else {
                        // Terminal partial: the maker receives the taker's
                        // entire residual input, including any remainder too
                        // small to buy another base unit. Pure dust does not
                        // reduce the order and leaves no audit record.
                        self.credit(maker, quote, remaining_in)?;
                        amount_out = amount_out
                            .checked_add(base_cap)
                            .ok_or(ExchangeError::BalanceOverflow)?;
                        if base_cap > 0 {
                            self.apply_partial_fill(hop.pair, side, tick, head, taker, base_cap);
                        }
                        remaining_in = 0;
                    }
                }
            }
        }
        Ok(amount_out)
    }

    /// Consume resting liquidity to deliver a fixed output amount. Returns
    /// the input amount required.
    fn fill_exact_out(&mut self, hop: &Hop, amount_out: u128, taker: u64) -> Result<u128> {
        let (base, quote, side) = self.hop_tokens(hop)?;
        let mut remaining_out = amount_out;
        let mut amount_in: u128 = 0;

        while remaining_out > 0 {
            let (tick, head) = self.walk_head(&hop.pair, side)?;
            let (maker, resting) = {
                let node = &self.arena[head];
                (node.order.maker, node.remaining())
            };

            match side {
                // Taker wants quote out of bids, paying base in.
                Side::Bid => {
                    let quote_full = price::base_to_quote(resting, tick, Rounding::Down)?;
                    if quote_full <= remaining_out {
                        self.credit(maker, base, resting)?;
                        amount_in = amount_in
                            .checked_add(resting)
                            .ok_or(ExchangeError::BalanceOverflow)?;
                        remaining_out -= quote_full;
                        self.settle_full_fill(head, taker);
                    } else {
                        // Ceiling-rounded base covers the residual output
                        // and never exceeds the order's remaining size.
                        let need = price::quote_to_base(remaining_out, tick, Rounding::Up)?;
                        self.credit(maker, base, need)?;
                        amount_in = amount_in
                            .checked_add(need)
                            .ok_or(ExchangeError::BalanceOverflow)?;
                        debug_assert!(need <= resting);
                        if need == resting {
                            self.settle_full_fill(head, taker);
                        } else {
                            self.apply_partial_fill(hop.pair, side, tick, head, taker, need);
                        }
                        remaining_out = 0;
                    }
                }
                // Taker wants base out of asks, paying quote in.
                Side::Ask => {
                    let fill = remaining_out.min(resting);
                    let cost = price::base_to_quote(fill, tick, Rounding::Up)?;
                    self.credit(maker, quote, cost)?;
                    amount_in = amount_in
                        .checked_add(cost)
                        .ok_or(ExchangeError::BalanceOverflow)?;
                    remaining_out -= fill;
                    if fill == resting {
                        self.settle_full_fill(head, taker);
                    } else {
                        self.apply_partial_fill(hop.pair, side, tick, head, taker, fill);
                    }
                }
            }
        }
        Ok(amount_in)
    }

    /// Read-only mirror of [`Self::fill_exact_in`], identical arithmetic.
    fn quote_fill_exact_in(&self, hop: &Hop, amount_in: u128) -> Result<u128> {
        let (_, _, side) = self.hop_tokens(hop)?;
        let book = self.books.get(&hop.pair).expect("hop pair exists");
        let mut remaining_in = amount_in;
        let mut amount_out: u128 = 0;

        let mut tick = book.has_liquidity(side).then(|| book.best_tick(side));
        while remaining_in > 0 {
            let current = tick.ok_or(ExchangeError::InsufficientLiquidity)?;
            let level = book.level(side, current).expect("initialized tick has level");
            let mut cursor = level.peek_head();
            while let Some(key) = cursor {
                if remaining_in == 0 {
                    break;
                }
                let node = &self.arena[key];
                let resting = node.remaining();
                match side {
                    Side::Bid => {
                        let fill = remaining_in.min(resting);
                        let quote_out = price::base_to_quote(fill, current, Rounding::Down)?;
                        amount_out = amount_out
                            .checked_add(quote_out)
                            .ok_or(ExchangeError::BalanceOverflow)?;
                        remaining_in -= fill;
                    }
                    Side::Ask => {
                        let base_cap = price::quote_to_base(remaining_in, current, Rounding::Down)?;
                        if base_cap >= resting {
                            let cost = price::base_to_quote(resting, current, Rounding::Up)?;
                            amount_out = amount_out
                                .checked_add(resting)
                                .ok_or(ExchangeError::BalanceOverflow)?;
                            remaining_in -= cost;
                        } else {
                            amount_out = amount_out
                                .checked_add(base_cap)
                                .ok_or(ExchangeError::BalanceOverflow)?;
                            remaining_in = 0;
                        }
                    }
                }
                cursor = node.next;
            }
            if remaining_in > 0 {
                tick = self.next_walk_tick(book, side, current);
            }
        }
        Ok(amount_out)
    }

    /// Read-only mirror of [`Self::fill_exact_out`], identical arithmetic.
    fn quote_fill_exact_out(&self, hop: &Hop, amount_out: u128) -> Result<u128> {
        let (_, _, side) = self.hop_tokens(hop)?;
        let book = self.books.get(&hop.pair).expect("hop pair exists");
        let mut remaining_out = amount_out;
        let mut amount_in: u128 = 0;

        let mut tick = book.has_liquidity(side).then(|| book.best_tick(side));
        while remaining_out > 0 {
            let current = tick.ok_or(ExchangeError::InsufficientLiquidity)?;
            let level = book.level(side, current).expect("initialized tick has level");
            let mut cursor = level.peek_head();
            while let Some(key) = cursor {
                if remaining_out == 0 {
                    break;
                }
                let node = &self.arena[key];
                let resting = node.remaining();
                match side {
                    Side::Bid => {
                        let quote_full = price::base_to_quote(resting, current, Rounding::Down)?;
                        if quote_full <= remaining_out {
                            amount_in = amount_in
                                .checked_add(resting)
                                .ok_or(ExchangeError::BalanceOverflow)?;
                            remaining_out -= quote_full;
                        } else {
                            let need = price::quote_to_base(remaining_out, current, Rounding::Up)?;
                            amount_in = amount_in
                                .checked_add(need)
                                .ok_or(ExchangeError::BalanceOverflow)?;
                            remaining_out = 0;
                        }
                    }
                    Side::Ask => {
                        let fill = remaining_out.min(resting);
                        let cost = price::base_to_quote(fill, current, Rounding::Up)?;
                        amount_in = amount_in
                            .checked_add(cost)
                            .ok_or(ExchangeError::BalanceOverflow)?;
                        remaining_out -= fill;
                    }
                }
                cursor = node.next;
            }
            if remaining_out > 0 {
                tick = self.next_walk_tick(book, side, current);
            }
        }
        Ok(amount_in)
    }

    fn hop_tokens(&self, hop: &Hop) -> Result<(u64, u64, Side)> {
        let book = self
            .books
            .get(&hop.pair)
            .ok_or(ExchangeError::PairDoesNotExist)?;
        let side = if hop.base_for_quote { Side::Bid } else { Side::Ask };
        Ok((book.base, book.quote, side))
    }

    /// Next tick past `current` for an immutable walk. Downward bid search
    /// is inclusive, so it must be stepped past the current tick by hand.
    fn next_walk_tick(&self, book: &OrderBook, side: Side, current: i16) -> Option<i16> {
        match side {
            Side::Bid => book.next_initialized(side, current - 1),
            Side::Ask => book.next_initialized(side, current),
        }
    }

    /// Reduce a resting order in place after a partial fill.
    fn apply_partial_fill(
        &mut self,
        pair: PairKey,
        side: Side,
        tick: i16,
        node_key: usize,
        taker: u64,
        fill: u128,
    ) {
        let node = self.arena.get_mut(node_key).expect("Invalid slab key");
        node.fill(fill);
        let (order_id, maker) = (node.order_id(), node.order.maker);
        let book = self.books.get_mut(&pair).expect("order pair exists");
        let level = book
            .level_mut(side, tick)
            .expect("level exists for resting order");
        level.reduce_liquidity(fill);
        self.record_fill(order_id, maker, taker, tick, fill, true);
    }

    /// Fully consume a resting order: record the fill, unlink it, and let a
    /// flip order attempt to synthesize its successor.
    fn settle_full_fill(&mut self, node_key: usize, taker: u64) {
        let mut order = self.arena[node_key].order.clone();
        let fill = order.remaining;
        order.remaining = 0;

        self.record_fill(order.id, order.maker, taker, order.tick, fill, false);
        self.unlink_order(node_key, &order);
        if order.is_flip() {
            // Best effort: a successor that cannot be funded or authorized
            // ends the flip chain without failing the taker's swap.
            let _ = self.synthesize_flip(&order);
        }
    }

    /// Place a filled flip order's successor from internal balance only.
    ///
    /// Skips the crossing check: the successor lands on the opposite side
    /// of the same pair at a tick already validated at original placement.
    fn synthesize_flip(&mut self, order: &Order) -> Result<u128> {
        let successor = order
            .flipped(0)
            .expect("synthesis only runs for flip orders");
        let book = self.books.get(&order.pair).expect("order pair exists");
        let (base, quote) = (book.base, book.quote);
        self.place_order(
            successor.maker,
            base,
            quote,
            successor.amount,
            successor.side,
            successor.tick,
            successor.kind,
            successor.client_id,
            true,
            false,
        )
    }

    fn record_fill(
        &mut self,
        order_id: u128,
        maker: u64,
        taker: u64,
        tick: i16,
        base_amount: u128,
        partial: bool,
    ) {
        self.events.push(ExchangeEvent::OrderFilled {
            order_id,
            maker,
            taker,
            amount_filled: base_amount,
            partial_fill: partial,
        });
        self.fill_log.push(Fill {
            order_id,
            maker,
            taker,
            price: price::tick_to_price(tick),
            base_amount,
            partial,
        });
    }

    // ========================================================================
    // Balances
    // ========================================================================

    /// The account's internal balance of a token.
    pub fn balance_of(&self, account: u64, token: u64) -> u128 {
        self.balances
            .get(&(account, token))
            .copied()
            .unwrap_or(0)
    }

    /// Move internal balance out through the bridge.
    pub fn withdraw(&mut self, account: u64, token: u64, amount: u128) -> Result<()> {
        if !self.bridge.is_authorized(account, token) {
            return Err(ExchangeError::Unauthorized);
        }
        if self.balance_of(account, token) < amount {
            return Err(ExchangeError::InsufficientBalance);
        }
        // Bridge first: if the external credit fails the ledger is untouched.
        self.bridge.transfer_out(account, token, amount)?;
        self.debit(account, token, amount)
    }

    fn credit(&mut self, account: u64, token: u64, amount: u128) -> Result<()> {
        let entry = self.balances.entry((account, token)).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or(ExchangeError::BalanceOverflow)?;
        Ok(())
    }

    fn debit(&mut self, account: u64, token: u64, amount: u128) -> Result<()> {
        let entry = self.balances.entry((account, token)).or_default();
        if *entry < amount {
            return Err(ExchangeError::InsufficientBalance);
        }
        *entry -= amount;
        Ok(())
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Snapshot of a live order.
    pub fn get_order(&self, order_id: u128) -> Result<Order> {
        let key = *self
            .order_index
            .get(&order_id)
            .ok_or(ExchangeError::OrderDoesNotExist)?;
        Ok(self.arena[key].order.clone())
    }

    /// The live order currently carrying the maker's client id, if any.
    /// Follows flip chains: after a flip the id maps to the successor.
    pub fn order_id_by_client(&self, maker: u64, client_id: u128) -> Option<u128> {
        self.client_ids.get(&(maker, client_id)).copied()
    }

    /// Head order id, tail order id, and total liquidity at a tick of
    /// `token`'s active pair. Zero ids for an empty level.
    pub fn get_tick_level(
        &self,
        token: u64,
        tick: i16,
        is_bid: bool,
    ) -> Result<(u128, u128, u128)> {
        let (base, quote) = self.active_pair_tokens(token)?;
        let book = self
            .books
            .get(&pair_key(base, quote))
            .ok_or(ExchangeError::PairDoesNotExist)?;
        let side = Side::from_is_bid(is_bid);
        let Some(level) = book.level(side, tick) else {
            return Ok((0, 0, 0));
        };
        let id_at = |key: Option<usize>| key.map(|k| self.arena[k].order_id()).unwrap_or(0);
        Ok((id_at(level.head), id_at(level.tail), level.total_liquidity))
    }

    /// The book for a pair key, if created.
    pub fn book(&self, pair: &PairKey) -> Option<&OrderBook> {
        self.books.get(pair)
    }

    /// The id the next placed order will receive.
    pub fn next_order_id(&self) -> u128 {
        self.next_order_id
    }

    // ========================================================================
    // Events and Settlement
    // ========================================================================

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<ExchangeEvent> {
        mem::take(&mut self.events)
    }

    /// Events accumulated since the last drain.
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    /// Close the current settlement batch: drain the fill log into a
    /// receipt and reset the per-batch counters.
    pub fn settle_batch(&mut self, batch_id: u64, timestamp: u64) -> SettlementReceipt {
        let fills = mem::take(&mut self.fill_log);
        let receipt =
            SettlementReceipt::for_fills(batch_id, self.orders_placed, &fills, timestamp);
        self.orders_placed = 0;
        receipt
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
