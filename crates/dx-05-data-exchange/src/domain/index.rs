//! # Order Indices
//!
//! Secondary lookups over the order store. Updated only after an order
//! transaction commits, so a reader may briefly see an index lag behind the
//! order itself, never run ahead of it.

use shared_types::{Address, OrderId};
use std::collections::{BTreeSet, HashMap};

/// Buyer, seller and notary indices plus the open-order set.
#[derive(Debug, Default)]
pub struct OrderIndex {
    by_buyer: HashMap<Address, Vec<OrderId>>,
    by_seller: HashMap<Address, Vec<OrderId>>,
    by_notary: HashMap<Address, Vec<OrderId>>,
    open: BTreeSet<OrderId>,
}

impl OrderIndex {
    /// Record a newly created order.
    pub fn on_created(&mut self, order_id: OrderId, buyer: Address) {
        push_unique(self.by_buyer.entry(buyer).or_default(), order_id);
        self.open.insert(order_id);
    }

    /// Record a notary attachment.
    pub fn on_notary_added(&mut self, order_id: OrderId, notary: Address) {
        push_unique(self.by_notary.entry(notary).or_default(), order_id);
    }

    /// Record an admitted response.
    pub fn on_response_added(&mut self, order_id: OrderId, seller: Address) {
        push_unique(self.by_seller.entry(seller).or_default(), order_id);
    }

    /// Drop a closed order from the open set.
    pub fn on_closed(&mut self, order_id: OrderId) {
        self.open.remove(&order_id);
    }

    /// Orders created by `buyer`, oldest first.
    pub fn by_buyer(&self, buyer: &Address) -> Vec<OrderId> {
        self.by_buyer.get(buyer).cloned().unwrap_or_default()
    }

    /// Orders `seller` responded to.
    pub fn by_seller(&self, seller: &Address) -> Vec<OrderId> {
        self.by_seller.get(seller).cloned().unwrap_or_default()
    }

    /// Orders `notary` is attached to.
    pub fn by_notary(&self, notary: &Address) -> Vec<OrderId> {
        self.by_notary.get(notary).cloned().unwrap_or_default()
    }

    /// Open orders in id order.
    pub fn open(&self) -> Vec<OrderId> {
        self.open.iter().copied().collect()
    }

    /// Number of open orders.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

fn push_unique(ids: &mut Vec<OrderId>, id: OrderId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
