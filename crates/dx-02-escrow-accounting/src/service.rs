//! # Escrow Ledger
//!
//! The only component that moves escrowed funds. All tokens held for orders,
//! batch accounts, batches and challenge bonds sit in one vault address and
//! are attributed to [`EscrowKey`] sub-accounts.
//!
//! ## Conservation
//!
//! For a vault touched only through this ledger:
//!
//! ```text
//! Σ balance(key) == token.balance_of(vault)
//! ```
//!
//! The sub-account map stays locked across the token call, so the two sides
//! never drift apart even under concurrent use.

use crate::domain::{EscrowError, EscrowKey, EscrowPlan, Payout, TokenError};
use crate::ports::TokenLedger;
use parking_lot::Mutex;
use shared_types::{Address, Amount};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Escrow ledger over a token vault.
pub struct EscrowLedger {
    vault: Address,
    token: Arc<dyn TokenLedger>,
    balances: Mutex<HashMap<EscrowKey, Amount>>,
}

impl EscrowLedger {
    /// Create a ledger holding funds at `vault`.
    pub fn new(vault: Address, token: Arc<dyn TokenLedger>) -> Result<Self, EscrowError> {
        if vault.is_zero() {
            return Err(EscrowError::InvalidVault);
        }
        Ok(Self {
            vault,
            token,
            balances: Mutex::new(HashMap::new()),
        })
    }

    /// Vault address. Owners approve this address before funds are locked.
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// The token capability behind the vault.
    pub fn token(&self) -> &Arc<dyn TokenLedger> {
        &self.token
    }

    /// Check that `owner` could fund a lock of `amount` right now.
    ///
    /// # Errors
    /// - `InsufficientFunds` class if the owner's balance is short
    /// - `InsufficientAllowance` class if the vault's allowance is short
    pub fn ensure_can_lock(&self, owner: Address, amount: Amount) -> Result<(), EscrowError> {
        let available = self.token.balance_of(owner);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                owner,
                needed: amount,
                available,
            }
            .into());
        }
        let allowed = self.token.allowance(owner, self.vault);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner,
                spender: self.vault,
                needed: amount,
                available: allowed,
            }
            .into());
        }
        Ok(())
    }

    /// Pull `amount` from `owner` into the vault and credit `key`.
    pub fn lock(&self, owner: Address, key: EscrowKey, amount: Amount) -> Result<(), EscrowError> {
        if amount == 0 {
            return Ok(());
        }
        let mut balances = self.balances.lock();
        let credited = balance_in(&balances, &key)
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;

        self.token
            .transfer_from(self.vault, owner, self.vault, amount)?;
        balances.insert(key, credited);

        debug!(owner = %owner, key = %key, amount, "Funds locked");
        Ok(())
    }

    /// Pay `amount` out of `key` to `to`.
    pub fn release(&self, key: EscrowKey, to: Address, amount: Amount) -> Result<(), EscrowError> {
        self.settle(key, &[Payout::new(to, amount)])
    }

    /// Pay several amounts out of `key`. Either every payout happens or none.
    pub fn settle(&self, key: EscrowKey, payouts: &[Payout]) -> Result<(), EscrowError> {
        let total = payouts
            .iter()
            .try_fold(0u128, |acc, p| acc.checked_add(p.amount))
            .ok_or(EscrowError::Overflow)?;
        if total == 0 {
            return Ok(());
        }
        if payouts.iter().any(|p| p.amount > 0 && p.to.is_zero()) {
            return Err(TokenError::ZeroAddress.into());
        }

        let mut balances = self.balances.lock();
        let available = balance_in(&balances, &key);
        if available < total {
            return Err(EscrowError::InsufficientEscrow {
                key,
                needed: total,
                available,
            });
        }
        let vault_balance = self.token.balance_of(self.vault);
        if vault_balance < total {
            warn!(key = %key, vault_balance, total, "Vault short of escrowed funds");
            return Err(TokenError::InsufficientBalance {
                owner: self.vault,
                needed: total,
                available: vault_balance,
            }
            .into());
        }

        for payout in payouts.iter().filter(|p| p.amount > 0) {
            self.token.transfer(self.vault, payout.to, payout.amount)?;
        }
        set_balance(&mut balances, key, available - total);

        debug!(key = %key, total, legs = payouts.len(), "Escrow settled");
        Ok(())
    }

    /// Reattribute `amount` from one sub-account to another. No tokens move.
    pub fn move_between(
        &self,
        from: EscrowKey,
        to: EscrowKey,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let mut balances = self.balances.lock();
        let available = balance_in(&balances, &from);
        if available < amount {
            return Err(EscrowError::InsufficientEscrow {
                key: from,
                needed: amount,
                available,
            });
        }
        let credited = balance_in(&balances, &to)
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;

        set_balance(&mut balances, from, available - amount);
        balances.insert(to, credited);

        debug!(from = %from, to = %to, amount, "Escrow reassigned");
        Ok(())
    }

    /// Apply every movement of `plan` or none of them.
    ///
    /// # Errors
    /// - `InsufficientEscrow` if any sub-account would go negative at any
    ///   point of the plan
    /// - token errors if the vault cannot fund the payouts
    pub fn execute(&self, plan: &EscrowPlan) -> Result<(), EscrowError> {
        if plan.is_empty() {
            return Ok(());
        }
        let payout_total = plan.payout_total().ok_or(EscrowError::Overflow)?;
        if plan
            .payouts
            .iter()
            .any(|(_, p)| p.amount > 0 && p.to.is_zero())
        {
            return Err(TokenError::ZeroAddress.into());
        }

        let mut balances = self.balances.lock();
        let mut working = balances.clone();
        for (from, to, amount) in &plan.reassignments {
            debit(&mut working, *from, *amount)?;
            let credited = balance_in(&working, to)
                .checked_add(*amount)
                .ok_or(EscrowError::Overflow)?;
            working.insert(*to, credited);
        }
        for (from, payout) in &plan.payouts {
            debit(&mut working, *from, payout.amount)?;
        }

        let vault_balance = self.token.balance_of(self.vault);
        if vault_balance < payout_total {
            warn!(vault_balance, payout_total, "Vault short of escrowed funds");
            return Err(TokenError::InsufficientBalance {
                owner: self.vault,
                needed: payout_total,
                available: vault_balance,
            }
            .into());
        }
        for (_, payout) in plan.payouts.iter().filter(|(_, p)| p.amount > 0) {
            self.token.transfer(self.vault, payout.to, payout.amount)?;
        }
        working.retain(|_, amount| *amount > 0);
        *balances = working;

        debug!(
            reassignments = plan.reassignments.len(),
            payouts = plan.payouts.len(),
            payout_total,
            "Escrow plan executed"
        );
        Ok(())
    }

    /// Current balance of one sub-account.
    pub fn balance(&self, key: &EscrowKey) -> Amount {
        balance_in(&self.balances.lock(), key)
    }

    /// Sum over all sub-accounts.
    pub fn total_escrowed(&self) -> Amount {
        self.balances.lock().values().sum()
    }

    /// Read-only handle for callers outside the owning service.
    pub fn view(&self) -> EscrowView<'_> {
        EscrowView { ledger: self }
    }

    /// True if the sub-accounts add up to the vault's token balance.
    pub fn check_conservation(&self) -> bool {
        let balances = self.balances.lock();
        let escrowed: Amount = balances.values().sum();
        let vault_balance = self.token.balance_of(self.vault);
        if escrowed != vault_balance {
            warn!(escrowed, vault_balance, "Escrow conservation violated");
            return false;
        }
        true
    }
}

/// Read-only view of an [`EscrowLedger`].
///
/// Services hand this out instead of the ledger itself, so funds can only
/// leave escrow through their settlement paths.
///
/// ```compile_fail
/// use dx_02_escrow_accounting::{EscrowKey, EscrowLedger, InMemoryToken};
/// use shared_types::{Address, OrderId};
/// use std::sync::Arc;
///
/// let token = Arc::new(InMemoryToken::new());
/// let ledger = EscrowLedger::new(Address([0xEE; 20]), token).unwrap();
/// let view = ledger.view();
/// view.release(EscrowKey::Order(OrderId(1)), Address([0x99; 20]), 1).unwrap();
/// ```
#[derive(Clone, Copy)]
pub struct EscrowView<'a> {
    ledger: &'a EscrowLedger,
}

impl EscrowView<'_> {
    /// Vault address.
    pub fn vault(&self) -> Address {
        self.ledger.vault
    }

    /// Current balance of one sub-account.
    pub fn balance(&self, key: &EscrowKey) -> Amount {
        self.ledger.balance(key)
    }

    /// Sum over all sub-accounts.
    pub fn total_escrowed(&self) -> Amount {
        self.ledger.total_escrowed()
    }

    /// True if the sub-accounts add up to the vault's token balance.
    pub fn check_conservation(&self) -> bool {
        self.ledger.check_conservation()
    }
}

fn balance_in(balances: &HashMap<EscrowKey, Amount>, key: &EscrowKey) -> Amount {
    balances.get(key).copied().unwrap_or(0)
}

fn debit(
    balances: &mut HashMap<EscrowKey, Amount>,
    key: EscrowKey,
    amount: Amount,
) -> Result<(), EscrowError> {
    let available = balance_in(balances, &key);
    if available < amount {
        return Err(EscrowError::InsufficientEscrow {
            key,
            needed: amount,
            available,
        });
    }
    set_balance(balances, key, available - amount);
    Ok(())
}

fn set_balance(balances: &mut HashMap<EscrowKey, Amount>, key: EscrowKey, amount: Amount) {
    if amount == 0 {
        balances.remove(&key);
    } else {
        balances.insert(key, amount);
    }
}
