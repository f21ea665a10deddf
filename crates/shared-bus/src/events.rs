//! # Exchange Events
//!
//! Every state transition of the exchange emits one of these events. They
//! carry the identifying fields of the transition and are consumed by
//! off-chain watchers; no core logic depends on their delivery.

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Address, Amount, BatchIndex, Hash, OrderId, Timestamp};

/// All events that can be emitted by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    // =========================================================================
    // NOTARY REGISTRY
    // =========================================================================
    /// A notary profile was (re-)registered.
    NotaryRegistered {
        /// Notary address.
        notary: Address,
        /// Display name.
        name: String,
    },

    /// An active notary profile was updated.
    NotaryUpdated {
        /// Notary address.
        notary: Address,
    },

    /// A notary was unregistered.
    NotaryUnregistered {
        /// Notary address.
        notary: Address,
    },

    // =========================================================================
    // DATA ORDERS
    // =========================================================================
    /// A data order was created and funded.
    OrderCreated {
        /// Assigned order id.
        order_id: OrderId,
        /// Buyer address.
        buyer: Address,
        /// Price per data response.
        price: Amount,
        /// Initial audit budget escrowed with the order.
        audit_budget: Amount,
    },

    /// A notary was attached to an order.
    NotaryAdded {
        /// Order id.
        order_id: OrderId,
        /// Attached notary.
        notary: Address,
        /// Share of responses the notary audits.
        responses_percentage: u8,
        /// Fee per audited response.
        notarization_fee: Amount,
    },

    /// A seller's data response was admitted.
    DataAdded {
        /// Order id.
        order_id: OrderId,
        /// Seller address.
        seller: Address,
        /// Notary responsible for the response.
        notary: Address,
    },

    /// A data response was closed and settled.
    ResponseClosed {
        /// Order id.
        order_id: OrderId,
        /// Seller address.
        seller: Address,
        /// Whether the notary audited the data.
        was_audited: bool,
        /// Whether the data was judged valid.
        is_data_valid: bool,
    },

    /// An order was closed and its remaining escrow refunded.
    OrderClosed {
        /// Order id.
        order_id: OrderId,
        /// Amount refunded to the buyer.
        refund: Amount,
    },

    // =========================================================================
    // EXCHANGE ADMINISTRATION
    // =========================================================================
    /// The minimum audit budget for new orders changed.
    MinimumAuditBudgetChanged {
        /// New floor.
        value: Amount,
    },

    /// The pause flag changed.
    PauseChanged {
        /// True when mutating entry points are suspended.
        paused: bool,
    },

    /// Exchange ownership moved to a new address.
    OwnershipTransferred {
        /// Previous owner.
        previous: Address,
        /// New owner.
        new_owner: Address,
    },

    // =========================================================================
    // BATCH PAYMENT LEDGER
    // =========================================================================
    /// Tokens were deposited into a batch-ledger account.
    Deposit {
        /// Account credited.
        account_id: AccountId,
        /// Account owner.
        owner: Address,
        /// Deposited amount.
        amount: Amount,
    },

    /// A contiguous block of account slots was reserved.
    BulkRegistered {
        /// First reserved id.
        first_id: AccountId,
        /// Number of reserved ids.
        count: u64,
    },

    /// A bulk-registered slot was bound to its owner.
    SlotAssigned {
        /// Account id.
        account_id: AccountId,
        /// New owner.
        owner: Address,
    },

    /// A batch of payments was committed.
    BatchCommitted {
        /// Batch index.
        batch_index: BatchIndex,
        /// Paying account.
        payer_account: AccountId,
        /// Merkle root over the batch leaves.
        root: Hash,
        /// Sum of all leaf amounts.
        total: Amount,
        /// Number of leaves.
        leaves: u64,
        /// End of the challenge window.
        challenge_deadline: Timestamp,
    },

    /// A batch leaf was challenged.
    ChallengeRaised {
        /// Batch index.
        batch_index: BatchIndex,
        /// Disputed leaf.
        leaf_index: u64,
        /// Challenger address.
        challenger: Address,
    },

    /// A pending challenge was resolved.
    ChallengeResolved {
        /// Batch index.
        batch_index: BatchIndex,
        /// Disputed leaf.
        leaf_index: u64,
        /// True if the leaf was voided.
        upheld: bool,
    },

    /// A leaf payout was withdrawn.
    Withdrawal {
        /// Batch index.
        batch_index: BatchIndex,
        /// Withdrawn leaf.
        leaf_index: u64,
        /// Recipient account of the leaf.
        recipient: AccountId,
        /// Address that received the tokens.
        to: Address,
        /// Withdrawn amount.
        amount: Amount,
    },

    /// A batch was finalized and its unused bond returned.
    BatchFinalized {
        /// Batch index.
        batch_index: BatchIndex,
        /// Bond credited back to the payer account.
        returned_bond: Amount,
    },

    /// Unused account balance was withdrawn by its owner.
    BalanceWithdrawn {
        /// Account debited.
        account_id: AccountId,
        /// Receiving owner.
        to: Address,
        /// Withdrawn amount.
        amount: Amount,
    },
}

impl ExchangeEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NotaryRegistered { .. }
            | Self::NotaryUpdated { .. }
            | Self::NotaryUnregistered { .. } => EventTopic::Notaries,
            Self::OrderCreated { .. }
            | Self::NotaryAdded { .. }
            | Self::DataAdded { .. }
            | Self::ResponseClosed { .. }
            | Self::OrderClosed { .. } => EventTopic::Orders,
            Self::MinimumAuditBudgetChanged { .. }
            | Self::PauseChanged { .. }
            | Self::OwnershipTransferred { .. } => EventTopic::Administration,
            Self::Deposit { .. }
            | Self::BulkRegistered { .. }
            | Self::SlotAssigned { .. }
            | Self::BatchCommitted { .. }
            | Self::ChallengeRaised { .. }
            | Self::ChallengeResolved { .. }
            | Self::Withdrawal { .. }
            | Self::BatchFinalized { .. }
            | Self::BalanceWithdrawn { .. } => EventTopic::BatchLedger,
        }
    }

    /// Order this event belongs to, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::OrderCreated { order_id, .. }
            | Self::NotaryAdded { order_id, .. }
            | Self::DataAdded { order_id, .. }
            | Self::ResponseClosed { order_id, .. }
            | Self::OrderClosed { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }

    /// Short name used in log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotaryRegistered { .. } => "notary_registered",
            Self::NotaryUpdated { .. } => "notary_updated",
            Self::NotaryUnregistered { .. } => "notary_unregistered",
            Self::OrderCreated { .. } => "order_created",
            Self::NotaryAdded { .. } => "notary_added",
            Self::DataAdded { .. } => "data_added",
            Self::ResponseClosed { .. } => "response_closed",
            Self::OrderClosed { .. } => "order_closed",
            Self::MinimumAuditBudgetChanged { .. } => "minimum_audit_budget_changed",
            Self::PauseChanged { .. } => "pause_changed",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
            Self::Deposit { .. } => "deposit",
            Self::BulkRegistered { .. } => "bulk_registered",
            Self::SlotAssigned { .. } => "slot_assigned",
            Self::BatchCommitted { .. } => "batch_committed",
            Self::ChallengeRaised { .. } => "challenge_raised",
            Self::ChallengeResolved { .. } => "challenge_resolved",
            Self::Withdrawal { .. } => "withdrawal",
            Self::BatchFinalized { .. } => "batch_finalized",
            Self::BalanceWithdrawn { .. } => "balance_withdrawn",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Notary registry events.
    Notaries,
    /// Data order lifecycle events.
    Orders,
    /// Owner-only configuration events.
    Administration,
    /// Batch payment ledger events.
    BatchLedger,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Restrict to one order's events.
    pub order_id: Option<OrderId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            order_id: None,
        }
    }

    /// Create a filter for the events of one order.
    #[must_use]
    pub fn order(order_id: OrderId) -> Self {
        Self {
            topics: vec![EventTopic::Orders],
            order_id: Some(order_id),
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ExchangeEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let order_match = match self.order_id {
            None => true,
            Some(id) => event.order_id() == Some(id),
        };

        topic_match && order_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_created(id: u64) -> ExchangeEvent {
        ExchangeEvent::OrderCreated {
            order_id: OrderId(id),
            buyer: Address([0xAA; 20]),
            price: 20,
            audit_budget: 10,
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(order_created(1).topic(), EventTopic::Orders);
        let batch = ExchangeEvent::BatchFinalized {
            batch_index: BatchIndex(0),
            returned_bond: 10,
        };
        assert_eq!(batch.topic(), EventTopic::BatchLedger);
        assert_eq!(batch.name(), "batch_finalized");
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&order_created(1)));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Notaries]);
        assert!(!filter.matches(&order_created(1)));
        assert!(filter.matches(&ExchangeEvent::NotaryUpdated {
            notary: Address([0xCC; 20])
        }));
    }

    #[test]
    fn test_filter_by_order() {
        let filter = EventFilter::order(OrderId(2));
        assert!(filter.matches(&order_created(2)));
        assert!(!filter.matches(&order_created(3)));
        assert!(!filter.matches(&ExchangeEvent::PauseChanged { paused: true }));
    }

    #[test]
    fn test_event_json_roundtrip() {
        let event = order_created(9);
        let json = serde_json::to_string(&event).unwrap();
        let back: ExchangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
