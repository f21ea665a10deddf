//! # In-Memory Token
//!
//! Fungible token ledger held in process memory. Used by tests and by
//! embedders that do not settle against an external token.

use crate::domain::TokenError;
use crate::ports::TokenLedger;
use parking_lot::Mutex;
use shared_types::{Address, Amount};
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenState {
    fn balance(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Validated move; nothing changes on error.
    fn move_tokens(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        if from.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let available = self.balance(&from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                owner: from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(&to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }
}

/// In-memory token with standard balance / allowance semantics.
#[derive(Default)]
pub struct InMemoryToken {
    state: Mutex<TokenState>,
}

impl InMemoryToken {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&self, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let mut state = self.state.lock();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = state.balance(&to) + amount;
        state.total_supply = supply;
        state.balances.insert(to, balance);
        debug!(to = %to, amount, "Tokens minted");
        Ok(())
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Amount {
        self.state.lock().total_supply
    }
}

impl TokenLedger for InMemoryToken {
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        self.state.lock().move_tokens(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut state = self.state.lock();
        let allowed = state
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner,
                spender,
                needed: amount,
                available: allowed,
            });
        }
        state.move_tokens(owner, to, amount)?;
        state.allowances.insert((owner, spender), allowed - amount);
        Ok(())
    }

    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), TokenError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.state.lock().allowances.insert((owner, spender), amount);
        Ok(())
    }

    fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.state
            .lock()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn balance_of(&self, owner: Address) -> Amount {
        self.state.lock().balance(&owner)
    }
}
