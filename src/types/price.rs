//! Fixed-point price grid and tick/amount conversions.
//!
//! ## Overview
//!
//! Stablecoin pairs trade in a narrow band around parity, so prices live on
//! a discrete integer grid: `price = PRICE_SCALE + tick`, with `PRICE_SCALE`
//! units representing 1.0. Ticks are bounded symmetrically and orders may
//! only rest on ticks divisible by [`TICK_SPACING`].
//!
//! ## Why Fixed-Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware, breaking determinism. All settlement math here is pure integer
//! with explicit rounding; `rust_decimal` is used only at the display/parse
//! boundary.
//!
//! ## Examples
//!
//! ```
//! use stablebook::types::price::{tick_to_price, price_to_tick, PRICE_SCALE};
//!
//! assert_eq!(tick_to_price(0), PRICE_SCALE);     // 1.00000
//! assert_eq!(tick_to_price(-10), 99_990);        // 0.99990
//! assert_eq!(price_to_tick(100_010).unwrap(), 10);
//! assert!(price_to_tick(100_101).is_err());      // off the spacing grid
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::error::{ExchangeError, Result};

/// Scaled-integer units per 1.0 of price.
pub const PRICE_SCALE: u32 = 100_000;

/// Lowest permitted tick.
pub const MIN_TICK: i16 = -2000;

/// Highest permitted tick.
pub const MAX_TICK: i16 = 2000;

/// Orders may only rest on ticks divisible by this spacing.
pub const TICK_SPACING: i16 = 10;

/// Scaled price at [`MIN_TICK`].
pub const MIN_PRICE: u32 = 98_000;

/// Scaled price at [`MAX_TICK`].
pub const MAX_PRICE: u32 = 102_000;

/// Rounding direction for amount conversions.
///
/// Every conversion in the settlement path names its rounding explicitly;
/// there is no implicit rounding anywhere in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward zero (floor).
    Down,
    /// Round away from zero (ceiling).
    Up,
}

// ============================================================================
// Tick <-> Price
// ============================================================================

/// Convert a tick to its scaled price.
///
/// Infallible: every `i16` maps to a price, callers validate bounds first.
#[inline]
pub fn tick_to_price(tick: i16) -> u32 {
    (PRICE_SCALE as i32 + tick as i32) as u32
}

/// Convert a scaled price back to a tick.
///
/// Fails with [`ExchangeError::TickOutOfBounds`] outside
/// `[MIN_PRICE, MAX_PRICE]` and [`ExchangeError::TickNotOnSpacing`] when the
/// implied tick is off the spacing grid, so only prices that real orders can
/// rest at round-trip.
pub fn price_to_tick(price: u32) -> Result<i16> {
    let tick = (price as i32 - PRICE_SCALE as i32) as i16;
    if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
        return Err(ExchangeError::TickOutOfBounds { tick });
    }
    if tick % TICK_SPACING != 0 {
        return Err(ExchangeError::TickNotOnSpacing { tick });
    }
    Ok(tick)
}

/// Validate that a tick is in bounds and on the spacing grid.
///
/// Checked before any state mutation at placement time.
pub fn validate_tick(tick: i16) -> Result<()> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(ExchangeError::TickOutOfBounds { tick });
    }
    if tick % TICK_SPACING != 0 {
        return Err(ExchangeError::TickNotOnSpacing { tick });
    }
    Ok(())
}

// ============================================================================
// Amount Conversions
// ============================================================================

/// Convert a base amount to the quote amount at a tick's price.
///
/// `quote = base * price / PRICE_SCALE`, rounded as requested. Overflow is
/// an invariant violation ([`ExchangeError::BalanceOverflow`]), never a wrap.
pub fn base_to_quote(amount: u128, tick: i16, rounding: Rounding) -> Result<u128> {
    let price = tick_to_price(tick) as u128;
    let scaled = amount
        .checked_mul(price)
        .ok_or(ExchangeError::BalanceOverflow)?;
    let quote = match rounding {
        Rounding::Down => scaled / PRICE_SCALE as u128,
        Rounding::Up => scaled.div_ceil(PRICE_SCALE as u128),
    };
    Ok(quote)
}

/// Convert a quote amount to the base amount at a tick's price.
///
/// `base = quote * PRICE_SCALE / price`, rounded as requested.
pub fn quote_to_base(amount: u128, tick: i16, rounding: Rounding) -> Result<u128> {
    let price = tick_to_price(tick) as u128;
    let scaled = amount
        .checked_mul(PRICE_SCALE as u128)
        .ok_or(ExchangeError::BalanceOverflow)?;
    let base = match rounding {
        Rounding::Down => scaled / price,
        Rounding::Up => scaled.div_ceil(price),
    };
    Ok(base)
}

// ============================================================================
// Display / Parse Boundary
// ============================================================================

/// Render a scaled price as a decimal (e.g. `99_990` -> `0.9999`).
pub fn price_to_decimal(price: u32) -> Decimal {
    Decimal::from(price) / Decimal::from(PRICE_SCALE)
}

/// Parse a decimal price string into its scaled representation.
///
/// Returns `None` for negative, malformed, or sub-unit-precision inputs.
///
/// ```
/// use stablebook::types::price::parse_price;
///
/// assert_eq!(parse_price("1.0001"), Some(100_010));
/// assert_eq!(parse_price("0.999"), Some(99_900));
/// assert_eq!(parse_price("oops"), None);
/// ```
pub fn parse_price(s: &str) -> Option<u32> {
    let decimal = Decimal::from_str(s).ok()?;
    if decimal.is_sign_negative() {
        return None;
    }
    let scaled = decimal.checked_mul(Decimal::from(PRICE_SCALE))?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.to_u32()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(MIN_PRICE, (PRICE_SCALE as i32 + MIN_TICK as i32) as u32);
        assert_eq!(MAX_PRICE, (PRICE_SCALE as i32 + MAX_TICK as i32) as u32);
        assert_eq!(MIN_TICK % TICK_SPACING, 0);
        assert_eq!(MAX_TICK % TICK_SPACING, 0);
    }

    #[test]
    fn test_tick_to_price() {
        assert_eq!(tick_to_price(0), 100_000);
        assert_eq!(tick_to_price(10), 100_010);
        assert_eq!(tick_to_price(-10), 99_990);
        assert_eq!(tick_to_price(MIN_TICK), MIN_PRICE);
        assert_eq!(tick_to_price(MAX_TICK), MAX_PRICE);
    }

    #[test]
    fn test_price_to_tick_bounds() {
        assert_eq!(price_to_tick(MIN_PRICE).unwrap(), MIN_TICK);
        assert_eq!(price_to_tick(MAX_PRICE).unwrap(), MAX_TICK);
        assert!(matches!(
            price_to_tick(MIN_PRICE - 1),
            Err(ExchangeError::TickOutOfBounds { tick: -2001 })
        ));
        assert!(matches!(
            price_to_tick(MAX_PRICE + 1),
            Err(ExchangeError::TickOutOfBounds { tick: 2001 })
        ));
    }

    #[test]
    fn test_price_to_tick_off_grid() {
        // In range but not on the spacing grid.
        assert!(matches!(
            price_to_tick(100_101),
            Err(ExchangeError::TickNotOnSpacing { tick: 101 })
        ));
        assert!(price_to_tick(99_995).is_err());
    }

    #[test]
    fn test_tick_round_trip_all_valid_ticks() {
        let mut tick = MIN_TICK;
        while tick <= MAX_TICK {
            assert_eq!(price_to_tick(tick_to_price(tick)).unwrap(), tick);
            tick += TICK_SPACING;
        }
    }

    #[test]
    fn test_validate_tick() {
        assert!(validate_tick(0).is_ok());
        assert!(validate_tick(MIN_TICK).is_ok());
        assert!(validate_tick(MAX_TICK).is_ok());
        assert!(matches!(
            validate_tick(MAX_TICK + 1),
            Err(ExchangeError::TickOutOfBounds { .. })
        ));
        assert!(matches!(
            validate_tick(5),
            Err(ExchangeError::TickNotOnSpacing { tick: 5 })
        ));
    }

    #[test]
    fn test_base_to_quote_rounding() {
        // 1000 * 0.9999 = 999.9
        assert_eq!(base_to_quote(1000, -10, Rounding::Down).unwrap(), 999);
        assert_eq!(base_to_quote(1000, -10, Rounding::Up).unwrap(), 1000);
        // Exact multiples round identically in both directions.
        assert_eq!(base_to_quote(100_000, 10, Rounding::Down).unwrap(), 100_010);
        assert_eq!(base_to_quote(100_000, 10, Rounding::Up).unwrap(), 100_010);
        assert_eq!(base_to_quote(0, 10, Rounding::Up).unwrap(), 0);
    }

    #[test]
    fn test_quote_to_base_rounding() {
        // 999 / 1.0010 = 998.001...
        assert_eq!(quote_to_base(999, 10, Rounding::Down).unwrap(), 998);
        assert_eq!(quote_to_base(999, 10, Rounding::Up).unwrap(), 999);
        assert_eq!(quote_to_base(100_010, 10, Rounding::Down).unwrap(), 100_000);
    }

    #[test]
    fn test_conversion_overflow_fails_loudly() {
        assert_eq!(
            base_to_quote(u128::MAX, 10, Rounding::Down),
            Err(ExchangeError::BalanceOverflow)
        );
        assert_eq!(
            quote_to_base(u128::MAX, -10, Rounding::Up),
            Err(ExchangeError::BalanceOverflow)
        );
    }

    #[test]
    fn test_conversion_consistency() {
        // Buying back through the inverse conversion never manufactures value.
        for tick in [-2000i16, -10, 0, 10, 2000] {
            for amount in [1u128, 999, 1000, 123_457] {
                let quote = base_to_quote(amount, tick, Rounding::Down).unwrap();
                let back = quote_to_base(quote, tick, Rounding::Down).unwrap();
                assert!(back <= amount, "tick {tick} amount {amount}");
            }
        }
    }

    #[test]
    fn test_price_decimal_display() {
        assert_eq!(price_to_decimal(99_990).to_string(), "0.9999");
        assert_eq!(price_to_decimal(100_000).to_string(), "1");
        assert_eq!(price_to_decimal(100_010).to_string(), "1.0001");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("1"), Some(100_000));
        assert_eq!(parse_price("0.9999"), Some(99_990));
        assert_eq!(parse_price("1.0001"), Some(100_010));
        // Finer than one scaled unit cannot be represented.
        assert_eq!(parse_price("1.000001"), None);
        assert_eq!(parse_price("-1"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_price_round_trips_grid() {
        let mut tick = MIN_TICK;
        while tick <= MAX_TICK {
            let price = tick_to_price(tick);
            let shown = price_to_decimal(price).to_string();
            assert_eq!(parse_price(&shown), Some(price));
            tick += TICK_SPACING;
        }
    }
}
