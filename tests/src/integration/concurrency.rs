//! # Concurrent Callers
//!
//! Services are shared across threads; each order, account and batch is
//! its own transaction scope.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use dx_03_notarization::MessageSigner;
    use rand::Rng;
    use shared_types::{AccountId, Address, Amount, ErrorKind, OrderId};
    use std::collections::BTreeSet;
    use std::thread;

    const THREADS: usize = 8;
    const PER_THREAD: usize = 10;

    #[test]
    fn test_parallel_order_creation_allocates_unique_ids() {
        let h = ExchangeHarness::new();

        let ids: Vec<OrderId> = thread::scope(|s| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        (0..PER_THREAD)
                            .map(|_| h.exchange.create_order(BUYER, params(5, 5)).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
        });

        let unique: BTreeSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), THREADS * PER_THREAD);
        assert_eq!(h.exchange.open_orders().len(), THREADS * PER_THREAD);
        assert_eq!(h.balance(BUYER), INITIAL - 10 * (THREADS * PER_THREAD) as Amount);
        assert!(h.exchange.escrow().check_conservation());
    }

    #[test]
    fn test_parallel_responses_on_one_order() {
        let h = ExchangeHarness::new();
        let id = h.order(4, 40, 1);
        let sellers: Vec<MessageSigner> = (0..THREADS).map(|_| MessageSigner::random()).collect();

        thread::scope(|s| {
            for seller in &sellers {
                let h = &h;
                s.spawn(move || {
                    let request = h.response_request(seller, id);
                    h.exchange.add_data_response(BUYER, id, request).unwrap();
                    h.exchange
                        .close_data_response(BUYER, id, h.close_request(seller.address(), id, true, true))
                        .unwrap();
                });
            }
        });

        let summary = h.exchange.escrow_summary(id).unwrap();
        assert_eq!(summary.committed, 0);
        assert_eq!(summary.paid_out, (4 + 1) * THREADS as Amount);
        assert_eq!(h.balance(h.notary.address()), THREADS as Amount);
        assert!(h.exchange.escrow().check_conservation());
    }

    #[test]
    fn test_racing_registrations_one_wins() {
        let payer = Address([0xBA; 20]);
        let h = LedgerHarness::new(payer);
        let offset = h.ledger.next_account_id();

        let results: Vec<_> = thread::scope(|s| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| h.ledger.bulk_register(REGISTRAR, 4, offset)))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
        assert_eq!(h.ledger.next_account_id(), AccountId(offset.0 + 4));
        assert_eq!(h.ledger.registrations().len(), 1);
    }

    #[test]
    fn test_parallel_withdrawals_drain_batch() {
        let payer = Address([0xBA; 20]);
        let h = LedgerHarness::new(payer);
        let account = h.ledger.deposit(payer, 900, None).unwrap();
        let owners: Vec<Address> = (0..16).map(owner).collect();
        let ids = h.recipients(&owners);
        let mut rng = rand::thread_rng();
        let amounts: Vec<Amount> = ids.iter().map(|_| rng.gen_range(1..50)).collect();
        let batch = h
            .ledger
            .transfer(payer, account, h.ledger.next_batch_index(), &payload(&ids, &amounts), 0, 0)
            .unwrap();
        h.clock.advance(PERIOD);

        thread::scope(|s| {
            for (leaf, owner) in owners.iter().enumerate() {
                let h = &h;
                let recipient = ids[leaf];
                s.spawn(move || {
                    let proof = h.ledger.merkle_proof(batch, leaf as u64).unwrap();
                    h.ledger
                        .withdraw(*owner, batch, &proof, leaf as u64, recipient)
                        .unwrap();
                    // A second attempt from the same thread always loses.
                    let again = h.ledger.withdraw(*owner, batch, &proof, leaf as u64, recipient);
                    assert_eq!(again.unwrap_err().kind(), ErrorKind::AlreadyWithdrawn);
                });
            }
        });

        for (owner, amount) in owners.iter().zip(&amounts) {
            assert_eq!(h.balance(*owner), *amount);
        }
        assert_eq!(h.ledger.batch(batch).unwrap().outstanding(), BOND);
        assert!(h.ledger.check_batch_escrow());
        assert!(h.ledger.escrow().check_conservation());
    }
}
