//! # Outbound Ports
//!
//! Fungible token capability. Standard ledger semantics: every call either
//! applies fully or fails without effect.

use crate::domain::TokenError;
use shared_types::{Address, Amount};

/// Token capability consumed by the escrow ledger.
///
/// The acting address is passed explicitly (`from`, `spender`, `owner`).
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` from `owner` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Set `spender`'s allowance over `owner`'s tokens.
    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), TokenError>;

    /// Remaining allowance.
    fn allowance(&self, owner: Address, spender: Address) -> Amount;

    /// Token balance of `owner`.
    fn balance_of(&self, owner: Address) -> Amount;
}
