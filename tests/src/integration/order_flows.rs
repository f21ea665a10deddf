//! # Order Flows
//!
//! Registry, notarization, order state machine and escrow working together
//! through `DataExchange`.
//!
//! ```text
//! create_order ─► add_notary ─► add_data_response ─► close_data_response ─► close_order
//!     lock            verify          lock fresh            settle               refund
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use dx_03_notarization::{ConsentMessage, ConsentVerifier, MessageSigner, NotarizationService, Secp256k1Scheme};
    use dx_04_data_order::{OrderStatus, ResponseStatus};
    use proptest::prelude::*;
    use shared_types::{Address, Amount, ErrorKind, OrderId};

    // =========================================================================
    // MONEY
    // =========================================================================

    #[test]
    fn test_audited_valid_response_costs_price_plus_fee() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);

        h.exchange
            .add_data_response(BUYER, id, h.response_request(&seller, id))
            .unwrap();
        let summary = h.exchange.escrow_summary(id).unwrap();
        assert_eq!(summary.committed, 25);
        assert_eq!(summary.remaining_budget, 5);

        h.exchange
            .close_data_response(BUYER, id, h.close_request(seller.address(), id, true, true))
            .unwrap();
        assert_eq!(h.balance(seller.address()), 20);
        assert_eq!(h.balance(h.notary.address()), 5);

        assert_eq!(h.exchange.close_order(BUYER, id).unwrap(), 5);
        assert_eq!(h.balance(BUYER), INITIAL - 25);
        assert_eq!(h.exchange.escrowed(id), 0);
        assert!(h.exchange.escrow().check_conservation());
    }

    #[test]
    fn test_invalid_data_refunds_price() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);

        h.exchange
            .add_data_response(BUYER, id, h.response_request(&seller, id))
            .unwrap();
        h.exchange
            .close_data_response(
                h.notary.address(),
                id,
                h.close_request(seller.address(), id, true, false),
            )
            .unwrap();

        assert_eq!(h.balance(seller.address()), 0);
        assert_eq!(h.balance(h.notary.address()), 5);
        h.exchange.close_order(BUYER, id).unwrap();
        assert_eq!(h.balance(BUYER), INITIAL - 5);
    }

    #[test]
    fn test_unaudited_response_returns_fee_to_budget() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);

        h.exchange
            .add_data_response(BUYER, id, h.response_request(&seller, id))
            .unwrap();
        h.exchange
            .close_data_response(BUYER, id, h.close_request(seller.address(), id, false, true))
            .unwrap();

        assert_eq!(h.balance(h.notary.address()), 0);
        assert_eq!(h.exchange.escrow_summary(id).unwrap().remaining_budget, 10);
        assert_eq!(h.exchange.close_order(BUYER, id).unwrap(), 10);
        assert_eq!(h.balance(BUYER), INITIAL - 20);
    }

    #[test]
    fn test_second_response_pulls_fresh_price() {
        let h = ExchangeHarness::new();
        let first = MessageSigner::random();
        let second = MessageSigner::random();
        let id = h.order(20, 10, 5);

        h.exchange
            .add_data_response(BUYER, id, h.response_request(&first, id))
            .unwrap();
        h.exchange
            .add_data_response(BUYER, id, h.response_request(&second, id))
            .unwrap();

        // 30 at creation, 20 fresh for the second price; both fees fit the budget.
        assert_eq!(h.balance(BUYER), INITIAL - 50);
        assert_eq!(h.exchange.escrowed(id), 50);

        for seller in [&first, &second] {
            h.exchange
                .close_data_response(BUYER, id, h.close_request(seller.address(), id, true, true))
                .unwrap();
        }
        assert_eq!(h.exchange.close_order(BUYER, id).unwrap(), 0);
        assert_eq!(h.balance(BUYER), INITIAL - 50);
        assert_eq!(h.balance(h.notary.address()), 10);
    }

    #[test]
    fn test_conservation_through_lifecycle() {
        let h = ExchangeHarness::new();
        let sellers: Vec<_> = (0..3).map(|_| MessageSigner::random()).collect();
        let id = h.order(15, 12, 4);
        let created = h.exchange.escrow_summary(id).unwrap().total_locked;
        assert_eq!(created, 27);

        for (i, seller) in sellers.iter().enumerate() {
            h.exchange
                .add_data_response(BUYER, id, h.response_request(seller, id))
                .unwrap();
            let s = h.exchange.escrow_summary(id).unwrap();
            assert_eq!(s.escrow_balance, h.exchange.escrowed(id));
            assert_eq!(s.total_locked, s.escrow_balance + s.paid_out + s.refunded, "after response {i}");
        }
        h.exchange
            .close_data_response(BUYER, id, h.close_request(sellers[0].address(), id, true, true))
            .unwrap();
        h.exchange
            .close_data_response(BUYER, id, h.close_request(sellers[1].address(), id, false, false))
            .unwrap();

        let refund = h.exchange.close_order(BUYER, id).unwrap();
        let s = h.exchange.escrow_summary(id).unwrap();
        assert_eq!(s.escrow_balance, 0);
        assert!(refund <= s.refunded);
        assert_eq!(s.paid_out + s.refunded, s.total_locked);
        assert_eq!(h.balance(BUYER) + s.paid_out, INITIAL);
        assert!(h.exchange.escrow().check_conservation());
    }

    // =========================================================================
    // IDEMPOTENCE OF FAILURE
    // =========================================================================

    #[test]
    fn test_response_closed_twice() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);
        h.exchange
            .add_data_response(BUYER, id, h.response_request(&seller, id))
            .unwrap();
        let close = h.close_request(seller.address(), id, true, true);
        h.exchange.close_data_response(BUYER, id, close.clone()).unwrap();

        let before = (h.balance(seller.address()), h.balance(h.notary.address()), h.exchange.escrowed(id));
        let err = h.exchange.close_data_response(BUYER, id, close).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyClosed);
        let after = (h.balance(seller.address()), h.balance(h.notary.address()), h.exchange.escrowed(id));
        assert_eq!(before, after);
    }

    #[test]
    fn test_order_closed_twice() {
        let h = ExchangeHarness::new();
        let id = h.order(20, 10, 5);
        h.exchange.close_order(OWNER, id).unwrap();
        let err = h.exchange.close_order(BUYER, id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyClosed);
        assert_eq!(h.balance(BUYER), INITIAL);
    }

    #[test]
    fn test_percentage_bounds() {
        let h = ExchangeHarness::new();
        for (percentage, ok) in [(0u8, true), (100, true), (101, false), (255, false)] {
            let id = h.exchange.create_order(BUYER, params(1, 1)).unwrap();
            let result = h.exchange.add_notary(BUYER, id, h.notary_request(id, percentage, 1));
            match result {
                Ok(()) => assert!(ok, "{percentage} accepted"),
                Err(e) => {
                    assert!(!ok, "{percentage} rejected");
                    assert_eq!(e.kind(), ErrorKind::InvalidRange);
                    assert!(h.exchange.notaries_of(id).is_empty());
                }
            }
        }
    }

    #[test]
    fn test_wrong_caller_changes_nothing() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);
        let stranger = Address([0x99; 20]);

        let err = h
            .exchange
            .add_data_response(stranger, id, h.response_request(&seller, id))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = h.exchange.close_order(stranger, id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(h.exchange.escrowed(id), 30);
        assert!(h.exchange.get_data_response(id, &seller.address()).is_none());
    }

    // =========================================================================
    // DANGLING RESPONSES
    // =========================================================================

    /// Closing an order with an open response sweeps its escrow to the buyer.
    /// The response itself can never be settled afterwards.
    #[test]
    fn test_dangling_response_stays_unsettled() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let id = h.order(20, 10, 5);
        h.exchange
            .add_data_response(BUYER, id, h.response_request(&seller, id))
            .unwrap();

        assert_eq!(h.exchange.close_order(BUYER, id).unwrap(), 30);
        assert_eq!(h.balance(BUYER), INITIAL);
        let order = h.exchange.get_order(id).unwrap();
        assert_eq!(order.status(), OrderStatus::Closed);
        assert_eq!(order.dangling_responses(), vec![seller.address()]);

        let err = h
            .exchange
            .close_data_response(BUYER, id, h.close_request(seller.address(), id, true, true))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let response = h.exchange.get_data_response(id, &seller.address()).unwrap();
        assert_eq!(response.status, ResponseStatus::Submitted);
        assert_eq!(h.balance(seller.address()), 0);
    }

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    fn data_message(order: u64, seller: Address, notary: Address, data_hash: [u8; 32]) -> ConsentMessage {
        ConsentMessage::DataResponse {
            order_id: OrderId(order),
            seller,
            notary,
            data_hash,
        }
    }

    #[test]
    fn test_signature_recovers_seller() {
        let verifier = NotarizationService::new(Secp256k1Scheme);
        let seller = MessageSigner::random();
        let notary = Address([0x0A; 20]);
        let message = data_message(7, seller.address(), notary, [0xDA; 32]);
        let signature = seller.sign(&message).unwrap();

        assert_eq!(verifier.recover_signer(&message, &signature).unwrap(), seller.address());
        assert!(verifier.verify_consent(&message, &signature, seller.address()).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_tuple_mutation_rejected(field in 0usize..4, byte in 0usize..20, flip in 1u8..=255) {
            let verifier = NotarizationService::new(Secp256k1Scheme);
            let seller = MessageSigner::random();
            let notary = Address([0x0A; 20]);
            let data_hash = [0xDA; 32];
            let signature = seller.sign(&data_message(7, seller.address(), notary, data_hash)).unwrap();

            let mutated = match field {
                0 => data_message(7 ^ u64::from(flip), seller.address(), notary, data_hash),
                1 => {
                    let mut other = seller.address();
                    other.0[byte] ^= flip;
                    data_message(7, other, notary, data_hash)
                }
                2 => {
                    let mut other = notary;
                    other.0[byte] ^= flip;
                    data_message(7, seller.address(), other, data_hash)
                }
                _ => {
                    let mut other = data_hash;
                    other[byte] ^= flip;
                    data_message(7, seller.address(), notary, other)
                }
            };
            let err = verifier.verify_consent(&mutated, &signature, seller.address()).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidSignature);
        }
    }

    #[test]
    fn test_response_consent_bound_to_order() {
        let h = ExchangeHarness::new();
        let seller = MessageSigner::random();
        let first = h.order(20, 10, 5);
        let second = h.order(20, 10, 5);

        // Signed for the first order, replayed on the second.
        let replay = h.response_request(&seller, first);
        let err = h.exchange.add_data_response(BUYER, second, replay).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn test_budget_floor_applies_to_new_orders_only() {
        let h = ExchangeHarness::new();
        let old = h.exchange.create_order(BUYER, params(5, 1)).unwrap();
        h.exchange.set_minimum_audit_budget(OWNER, 10).unwrap();

        let err = h.exchange.create_order(BUYER, params(5, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRange);
        assert_eq!(h.exchange.escrowed(old), 6);
        let refund: Amount = h.exchange.close_order(BUYER, old).unwrap();
        assert_eq!(refund, 6);
    }
}
