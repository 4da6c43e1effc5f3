//! Error types for the exchange engine.
//!
//! Every public operation returns [`Result`]. All failures are synchronous
//! and non-retryable: a call that returns an error has performed no state
//! mutation, so the caller may treat it as a no-op.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Errors surfaced by the exchange engine.
///
/// Grouped by cause:
/// - bounds: tick/price outside the grid or off the spacing
/// - liquidity: not enough resting liquidity or internal balance
/// - authorization: caller/maker fails a policy check
/// - structural: pairs, tokens, routes, client ids
/// - invariant: crossing violations and arithmetic overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExchangeError {
    // ------------------------------------------------------------------
    // Bounds
    // ------------------------------------------------------------------
    /// Tick falls outside the configured symmetric range.
    #[error("tick {tick} out of bounds")]
    TickOutOfBounds { tick: i16 },

    /// Tick is inside the range but not a multiple of the spacing.
    #[error("tick {tick} is not a multiple of the tick spacing")]
    TickNotOnSpacing { tick: i16 },

    /// Flip target tick is on the wrong side of the order tick.
    #[error("flip tick on the wrong side of the order tick")]
    InvalidFlipTick,

    /// Order amount must be nonzero.
    #[error("order amount must be nonzero")]
    ZeroAmount,

    // ------------------------------------------------------------------
    // Liquidity
    // ------------------------------------------------------------------
    /// Not enough resting liquidity to satisfy the swap.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// Internal (or external fallback) balance too low.
    #[error("insufficient balance")]
    InsufficientBalance,

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------
    /// Caller is not permitted to perform this operation.
    #[error("unauthorized")]
    Unauthorized,

    /// Stale-cancel attempted on an order whose maker is still authorized.
    #[error("order is not stale")]
    OrderNotStale,

    // ------------------------------------------------------------------
    // Structural
    // ------------------------------------------------------------------
    /// Pair already created for this (base, quote) combination.
    #[error("pair already exists")]
    PairAlreadyExists,

    /// No pair created for this (base, quote) combination.
    #[error("pair does not exist")]
    PairDoesNotExist,

    /// Base and quote tokens must differ.
    #[error("identical tokens")]
    IdenticalTokens,

    /// Token has no quote-token designation usable for this operation.
    #[error("token not eligible for this pair")]
    TokenNotEligible,

    /// The two tokens live in disjoint quote-token trees.
    #[error("no trade path between tokens")]
    NoTradePath,

    /// No live order with this id.
    #[error("order does not exist")]
    OrderDoesNotExist,

    /// Client order id already maps to one of the account's live orders.
    #[error("duplicate client order id")]
    DuplicateClientId,

    // ------------------------------------------------------------------
    // Invariant
    // ------------------------------------------------------------------
    /// Placement would cross the book on an active pair.
    #[error("order would cross the book")]
    OrderWouldCross,

    /// Integer overflow during settlement arithmetic. Never wraps.
    #[error("balance arithmetic overflow")]
    BalanceOverflow,

    // ------------------------------------------------------------------
    // Slippage
    // ------------------------------------------------------------------
    /// Exact-in swap output below the caller's minimum.
    #[error("output below minimum")]
    InsufficientOutput,

    /// Exact-out swap input above the caller's maximum.
    #[error("input above maximum")]
    MaxInputExceeded,
}
