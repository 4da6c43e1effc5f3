//! External collaborator boundary.
//!
//! The engine never talks to token contracts directly; everything it needs
//! from the outside world goes through [`TokenBridge`]:
//!
//! - the quote-token designation that shapes the routing tree
//! - the transfer-policy gate consulted before escrow draws and credits
//! - the external token ledger, used only for initial-escrow shortfall and
//!   withdrawals — never for flip re-synthesis
//!
//! [`InMemoryBridge`] is the in-crate implementation used by tests, benches,
//! and the demo binary.

use std::collections::{HashMap, HashSet};

use crate::error::{ExchangeError, Result};

/// Boundary to token configuration, transfer policy, and external holdings.
pub trait TokenBridge {
    /// The token's designated quote token, `None` for the root token.
    fn quote_token(&self, token: u64) -> Option<u64>;

    /// A scheduled-but-not-yet-active quote token change, if any.
    fn pending_quote_token(&self, token: u64) -> Option<u64>;

    /// Transfer-policy gate. A resting order whose maker fails this check
    /// for the escrowed token is stale and third-party cancellable.
    fn is_authorized(&self, account: u64, token: u64) -> bool;

    /// Pull tokens from the account's external holding into the engine.
    fn transfer_in(&mut self, account: u64, token: u64, amount: u128) -> Result<()>;

    /// Push tokens from the engine out to the account's external holding.
    fn transfer_out(&mut self, account: u64, token: u64, amount: u128) -> Result<()>;
}

/// Quote-token designation for one registered token.
#[derive(Debug, Clone, Copy, Default)]
struct TokenConfig {
    quote: Option<u64>,
    pending_quote: Option<u64>,
}

/// In-memory [`TokenBridge`] with explicit authorization revocation.
///
/// Accounts are authorized by default; `freeze` revokes a specific
/// (account, token) combination, which is what makes resting orders stale.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBridge {
    tokens: HashMap<u64, TokenConfig>,
    frozen: HashSet<(u64, u64)>,
    holdings: HashMap<(u64, u64), u128>,
}

impl InMemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the root token (no quote designation).
    pub fn register_root(&mut self, token: u64) {
        self.tokens.entry(token).or_default();
    }

    /// Register a token quoting against `quote`.
    pub fn register_token(&mut self, token: u64, quote: u64) {
        self.tokens.entry(token).or_default().quote = Some(quote);
    }

    /// Schedule a quote-token change without activating it.
    pub fn set_pending_quote(&mut self, token: u64, quote: u64) {
        self.tokens.entry(token).or_default().pending_quote = Some(quote);
    }

    /// Activate a previously scheduled quote-token change.
    pub fn promote_pending_quote(&mut self, token: u64) {
        if let Some(config) = self.tokens.get_mut(&token) {
            if let Some(pending) = config.pending_quote.take() {
                config.quote = Some(pending);
            }
        }
    }

    /// Revoke transfer authorization for (account, token).
    pub fn freeze(&mut self, account: u64, token: u64) {
        self.frozen.insert((account, token));
    }

    /// Restore transfer authorization for (account, token).
    pub fn thaw(&mut self, account: u64, token: u64) {
        self.frozen.remove(&(account, token));
    }

    /// Mint external holdings for an account.
    pub fn fund(&mut self, account: u64, token: u64, amount: u128) {
        *self.holdings.entry((account, token)).or_default() += amount;
    }

    /// The account's external holding.
    pub fn holding_of(&self, account: u64, token: u64) -> u128 {
        self.holdings.get(&(account, token)).copied().unwrap_or(0)
    }
}

impl TokenBridge for InMemoryBridge {
    fn quote_token(&self, token: u64) -> Option<u64> {
        self.tokens.get(&token)?.quote
    }

    fn pending_quote_token(&self, token: u64) -> Option<u64> {
        self.tokens.get(&token)?.pending_quote
    }

    fn is_authorized(&self, account: u64, token: u64) -> bool {
        !self.frozen.contains(&(account, token))
    }

    fn transfer_in(&mut self, account: u64, token: u64, amount: u128) -> Result<()> {
        let holding = self.holdings.entry((account, token)).or_default();
        if *holding < amount {
            return Err(ExchangeError::InsufficientBalance);
        }
        *holding -= amount;
        Ok(())
    }

    fn transfer_out(&mut self, account: u64, token: u64, amount: u128) -> Result<()> {
        let holding = self.holdings.entry((account, token)).or_default();
        *holding = holding
            .checked_add(amount)
            .ok_or(ExchangeError::BalanceOverflow)?;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
