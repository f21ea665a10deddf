//! # Event Choreography
//!
//! Every state transition emits one event. Watchers consume them from the
//! broadcast bus or from the JSON-lines audit log.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use dx_03_notarization::MessageSigner;
    use shared_bus::{
        EventFilter, EventSink, EventTopic, ExchangeEvent, InMemoryEventBus, JsonLinesEventLog,
    };
    use shared_types::{Address, BatchIndex};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn run_lifecycle(h: &ExchangeHarness) {
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);
        h.exchange
            .add_data_response(BUYER, id, h.response_request(&seller, id))
            .unwrap();
        h.exchange
            .close_data_response(BUYER, id, h.close_request(seller.address(), id, true, true))
            .unwrap();
        h.exchange.close_order(BUYER, id).unwrap();
    }

    fn names(events: &[ExchangeEvent]) -> Vec<&'static str> {
        events.iter().map(ExchangeEvent::name).collect()
    }

    #[tokio::test]
    async fn test_bus_delivers_order_events_in_order() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut orders = bus.subscribe(EventFilter::topics(vec![EventTopic::Orders]));
        let mut notaries = bus.subscribe(EventFilter::topics(vec![EventTopic::Notaries]));
        let h = ExchangeHarness::with_sink(Some(bus.clone() as Arc<dyn EventSink>));

        run_lifecycle(&h);

        let mut received = Vec::new();
        for _ in 0..5 {
            let event = timeout(Duration::from_secs(1), orders.recv())
                .await
                .expect("order event")
                .expect("bus open");
            received.push(event);
        }
        assert_eq!(
            names(&received),
            vec!["order_created", "notary_added", "data_added", "response_closed", "order_closed"]
        );
        assert!(matches!(
            received.last(),
            Some(ExchangeEvent::OrderClosed { refund: 5, .. })
        ));

        let registered = timeout(Duration::from_secs(1), notaries.recv())
            .await
            .expect("notary event")
            .expect("bus open");
        assert_eq!(registered.name(), "notary_registered");
        assert!(orders.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bus_filters_one_order() {
        let bus = Arc::new(InMemoryEventBus::new());
        let h = ExchangeHarness::with_sink(Some(bus.clone() as Arc<dyn EventSink>));
        let first = h.order(1, 1, 1);
        let mut watcher = bus.subscribe(EventFilter::order(first));

        let second = h.order(1, 1, 1);
        h.exchange.close_order(BUYER, second).unwrap();
        h.exchange.close_order(BUYER, first).unwrap();

        let event = timeout(Duration::from_secs(1), watcher.recv())
            .await
            .expect("event for first order")
            .expect("bus open");
        assert_eq!(event.order_id(), Some(first));
        assert_eq!(event.name(), "order_closed");
    }

    #[test]
    fn test_audit_log_matches_emitted_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let file_log = Arc::new(JsonLinesEventLog::open(&path).unwrap());
        let h = ExchangeHarness::with_sink(Some(file_log.clone() as Arc<dyn EventSink>));

        run_lifecycle(&h);

        let records = JsonLinesEventLog::read_all(&path).unwrap();
        let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (1..=records.len() as u64).collect::<Vec<_>>());
        let from_file: Vec<ExchangeEvent> = records.into_iter().map(|r| r.event).collect();
        assert_eq!(from_file, h.log.events());
        assert_eq!(from_file.first().map(ExchangeEvent::name), Some("notary_registered"));
    }

    #[test]
    fn test_audit_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let payer = Address([0xBA; 20]);

        {
            let file_log = Arc::new(JsonLinesEventLog::open(&path).unwrap());
            let h = LedgerHarness::with_sink(payer, Some(file_log as Arc<dyn EventSink>));
            h.ledger.deposit(payer, 50, None).unwrap();
        }

        let reopened = JsonLinesEventLog::open(&path).unwrap();
        reopened.emit(ExchangeEvent::BatchFinalized {
            batch_index: BatchIndex(0),
            returned_bond: 0,
        });

        let records = JsonLinesEventLog::read_all(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, 2);
        assert!(matches!(
            records[0].event,
            ExchangeEvent::Deposit { amount: 50, .. }
        ));
    }

    #[test]
    fn test_batch_lifecycle_events() {
        let payer = Address([0xBA; 20]);
        let h = LedgerHarness::new(payer);
        let account = h.ledger.deposit(payer, 100, None).unwrap();
        let ids = h.recipients(&[owner(0), owner(1)]);
        let batch = h
            .ledger
            .transfer(payer, account, BatchIndex(0), &payload(&ids, &[3, 4]), 0, 0)
            .unwrap();
        h.ledger.challenge(CHALLENGER, batch, 1, vec![]).unwrap();
        h.ledger.resolve_challenge(ADJUDICATOR, batch, 1, true).unwrap();
        h.clock.advance(PERIOD);
        let proof = h.ledger.merkle_proof(batch, 0).unwrap();
        h.ledger.withdraw(owner(0), batch, &proof, 0, ids[0]).unwrap();
        h.ledger.finalize_batch(batch).unwrap();

        assert_eq!(
            names(&h.log.events()),
            vec![
                "deposit",
                "bulk_registered",
                "slot_assigned",
                "slot_assigned",
                "batch_committed",
                "challenge_raised",
                "challenge_resolved",
                "withdrawal",
                "batch_finalized",
            ]
        );
        assert!(h.log.events().iter().all(|e| e.topic() == EventTopic::BatchLedger));
    }
}
