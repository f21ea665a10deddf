//! # Domain Invariants
//!
//! Rules every [`DataOrder`] must satisfy after each committed transition.

use super::errors::OrderError;
use super::order::DataOrder;

/// Upper bound of a notary's responses percentage.
pub const MAX_RESPONSES_PERCENTAGE: u8 = 100;

/// Invariant: responses percentage is within 0..=100.
pub fn invariant_percentage_in_range(percentage: u8) -> Result<(), OrderError> {
    if percentage > MAX_RESPONSES_PERCENTAGE {
        return Err(OrderError::PercentageOutOfRange(percentage));
    }
    Ok(())
}

/// Invariant: the escrow split accounts for every token still held.
pub fn invariant_escrow_balanced(order: &DataOrder) -> bool {
    order.escrow().is_balanced()
}

/// Invariant: a closed order holds nothing.
pub fn invariant_closed_order_drained(order: &DataOrder) -> bool {
    order.is_open() || order.escrow().balance() == 0
}

/// Invariant: committed funds equal the reservations of open responses.
///
/// Only meaningful while the order is open; closing sweeps commitments into
/// the refund.
pub fn invariant_commitments_match(order: &DataOrder) -> bool {
    if !order.is_open() {
        return order.escrow().committed == 0;
    }
    let reserved: u128 = order
        .responses()
        .filter(|r| !r.is_closed())
        .map(|r| r.committed_price + r.committed_fee)
        .sum();
    reserved == order.escrow().committed
}

/// Invariant: every response names an attached notary.
pub fn invariant_responses_have_notary(order: &DataOrder) -> bool {
    order
        .responses()
        .all(|r| order.notary_terms(&r.notary).is_some())
}
