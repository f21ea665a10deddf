//! # Batch Settlement Scenarios
//!
//! Deposit, bulk registration, payload commit, challenge and withdrawal
//! through `BatchLedger`.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use dx_06_batch_payments::{
        BatchLedger, ChallengeOutcome, LeafStatus, SiblingPosition, OPERATOR_FEE_ACCOUNT,
    };
    use proptest::prelude::*;
    use shared_types::{AccountId, Address, Amount, BatchIndex, ErrorKind};

    const PAYER: Address = Address([0xBA; 20]);

    fn total_supply_held(h: &LedgerHarness, holders: &[Address]) -> Amount {
        holders.iter().map(|a| h.balance(*a)).sum::<Amount>() + h.balance(LEDGER)
    }

    fn commit(h: &LedgerHarness, payer: AccountId, ids: &[AccountId], amounts: &[Amount]) -> BatchIndex {
        h.ledger
            .transfer(PAYER, payer, h.ledger.next_batch_index(), &payload(ids, amounts), 0, 0)
            .unwrap()
    }

    fn withdraw(ledger: &BatchLedger, owner: Address, batch: BatchIndex, leaf: u64, recipient: AccountId) -> Result<Amount, ErrorKind> {
        let proof = ledger.merkle_proof(batch, leaf).ok_or(ErrorKind::NotFound)?;
        ledger
            .withdraw(owner, batch, &proof, leaf, recipient)
            .map_err(|e| e.kind())
    }

    // =========================================================================
    // CHALLENGE WINDOW
    // =========================================================================

    #[test]
    fn test_upheld_challenge_voids_one_leaf() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 200, None).unwrap();
        let owners = [owner(0), owner(1), owner(2)];
        let ids = h.recipients(&owners);
        let batch = commit(&h, payer, &ids, &[10, 20, 30]);
        assert_eq!(h.ledger.account(payer).unwrap().balance, 200 - 60 - BOND);

        h.clock.advance(PERIOD / 2);
        h.ledger
            .challenge(CHALLENGER, batch, 1, b"seller 1 never delivered".to_vec())
            .unwrap();
        h.ledger.resolve_challenge(ADJUDICATOR, batch, 1, true).unwrap();
        assert_eq!(
            h.ledger.challenge_of(batch, 1).unwrap().outcome,
            ChallengeOutcome::Upheld
        );
        // Bond back plus the payer's bond as compensation.
        assert_eq!(h.balance(CHALLENGER), INITIAL + BOND);
        assert_eq!(h.ledger.account(payer).unwrap().balance, 200 - 60 - BOND + 20);

        // Nothing is withdrawable inside the window.
        assert_eq!(withdraw(&h.ledger, owner(0), batch, 0, ids[0]), Err(ErrorKind::NotYetWithdrawable));

        h.clock.advance(PERIOD);
        assert_eq!(withdraw(&h.ledger, owner(0), batch, 0, ids[0]), Ok(10));
        assert_eq!(withdraw(&h.ledger, owner(2), batch, 2, ids[2]), Ok(30));
        assert_eq!(withdraw(&h.ledger, owner(1), batch, 1, ids[1]), Err(ErrorKind::InvalidState));
        assert_eq!(h.balance(owner(1)), 0);

        let snapshot = h.ledger.batch(batch).unwrap();
        assert_eq!(
            snapshot.leaf_status,
            vec![LeafStatus::Withdrawn, LeafStatus::Voided, LeafStatus::Withdrawn]
        );
        assert_eq!(h.ledger.finalize_batch(batch).unwrap(), 0);
        assert_eq!(h.ledger.escrow().balance(&dx_02_escrow_accounting::EscrowKey::Batch(batch)), 0);

        h.ledger.withdraw_balance(PAYER, payer, 150).unwrap();
        assert_eq!(h.balance(PAYER), INITIAL - 50);
        let mut holders = vec![PAYER, CHALLENGER];
        holders.extend(owners);
        assert_eq!(total_supply_held(&h, &holders), h.token.total_supply());
        assert!(h.ledger.escrow().check_conservation());
    }

    #[test]
    fn test_challenge_after_deadline_rejected() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 100, None).unwrap();
        let ids = h.recipients(&[owner(0)]);
        let batch = commit(&h, payer, &ids, &[5]);

        h.clock.advance(PERIOD);
        let err = h.ledger.challenge(CHALLENGER, batch, 0, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(h.balance(CHALLENGER), INITIAL);
        assert_eq!(withdraw(&h.ledger, owner(0), batch, 0, ids[0]), Ok(5));
    }

    #[test]
    fn test_rejected_challenge_pays_payer() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 100, None).unwrap();
        let ids = h.recipients(&[owner(0), owner(1)]);
        let batch = commit(&h, payer, &ids, &[5, 6]);

        h.ledger.challenge(CHALLENGER, batch, 0, vec![1]).unwrap();
        h.clock.advance(PERIOD);
        // Pending challenge blocks the leaf and finalization, not the other leaf.
        assert_eq!(withdraw(&h.ledger, owner(0), batch, 0, ids[0]), Err(ErrorKind::NotYetWithdrawable));
        assert_eq!(withdraw(&h.ledger, owner(1), batch, 1, ids[1]), Ok(6));
        assert_eq!(h.ledger.finalize_batch(batch).unwrap_err().kind(), ErrorKind::InvalidState);

        h.ledger.resolve_challenge(ADJUDICATOR, batch, 0, false).unwrap();
        assert_eq!(h.balance(CHALLENGER), INITIAL - BOND);
        assert_eq!(withdraw(&h.ledger, owner(0), batch, 0, ids[0]), Ok(5));
        assert_eq!(h.ledger.finalize_batch(batch).unwrap(), BOND);
        assert_eq!(h.ledger.account(payer).unwrap().balance, 100 - 11 + BOND);
    }

    // =========================================================================
    // PROOFS
    // =========================================================================

    #[test]
    fn test_leaf_withdrawn_once() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 100, None).unwrap();
        let ids = h.recipients(&[owner(0), owner(1), owner(2)]);
        let batch = commit(&h, payer, &ids, &[1, 2, 3]);
        h.clock.advance(PERIOD);

        assert_eq!(withdraw(&h.ledger, owner(1), batch, 1, ids[1]), Ok(2));
        assert_eq!(withdraw(&h.ledger, owner(1), batch, 1, ids[1]), Err(ErrorKind::AlreadyWithdrawn));
        assert_eq!(h.balance(owner(1)), 2);
    }

    #[test]
    fn test_fee_reaches_operator() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 100, None).unwrap();
        let ids = h.recipients(&[owner(0)]);
        h.ledger
            .transfer(PAYER, payer, BatchIndex(0), &payload(&ids, &[40]), 7, 0xFEE)
            .unwrap();

        assert_eq!(h.ledger.batch(BatchIndex(0)).unwrap().metadata, 0xFEE);
        assert_eq!(h.ledger.account(OPERATOR_FEE_ACCOUNT).unwrap().balance, 7);
        h.ledger
            .withdraw_balance(OPERATOR, OPERATOR_FEE_ACCOUNT, 7)
            .unwrap();
        assert_eq!(h.balance(OPERATOR), 7);
    }

    #[test]
    fn test_many_leaves_all_provable() {
        let h = LedgerHarness::new(PAYER);
        h.token.mint(PAYER, 10_000).unwrap();
        let payer = h.ledger.deposit(PAYER, 2_000, None).unwrap();
        let count = 1_500u64;
        let registration = h
            .ledger
            .bulk_register(REGISTRAR, count, h.ledger.next_account_id())
            .unwrap();
        let ids: Vec<AccountId> = (0..count).map(|i| AccountId(registration.first_id.0 + i)).collect();
        let amounts = vec![Amount::from(1u8); count as usize];
        let batch = commit(&h, payer, &ids, &amounts);

        let snapshot = h.ledger.batch(batch).unwrap();
        assert_eq!(snapshot.leaf_count(), count);
        for leaf in [0, 1, 1_023, 1_024, count - 1] {
            let proof = h.ledger.merkle_proof(batch, leaf).unwrap();
            assert_eq!(proof.path.len(), 11);
            assert_eq!(proof.amount, 1);
        }
        assert!(h.ledger.merkle_proof(batch, count).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_mutated_proof_rejected(
            n in 1usize..9,
            pick in any::<prop::sample::Index>(),
            level in any::<prop::sample::Index>(),
            byte in 0usize..32,
            flip in 1u8..=255,
        ) {
            let h = LedgerHarness::new(PAYER);
            let payer = h.ledger.deposit(PAYER, 500, None).unwrap();
            let owners: Vec<Address> = (0..n as u8).map(owner).collect();
            let ids = h.recipients(&owners);
            let amounts: Vec<Amount> = (1..=n as u128).collect();
            let batch = commit(&h, payer, &ids, &amounts);
            h.clock.advance(PERIOD);

            let leaf = pick.index(n);
            let mut proof = h.ledger.merkle_proof(batch, leaf as u64).unwrap();
            let at = level.index(proof.path.len());
            proof.path[at].hash[byte] ^= flip;
            let err = h.ledger.withdraw(owners[leaf], batch, &proof, leaf as u64, ids[leaf]).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidProof);

            let mut swapped = h.ledger.merkle_proof(batch, leaf as u64).unwrap();
            swapped.path[0].position = match swapped.path[0].position {
                SiblingPosition::Left => SiblingPosition::Right,
                SiblingPosition::Right => SiblingPosition::Left,
            };
            let err = h.ledger.withdraw(owners[leaf], batch, &swapped, leaf as u64, ids[leaf]).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidProof);

            // The untouched proof still pays.
            let proof = h.ledger.merkle_proof(batch, leaf as u64).unwrap();
            prop_assert_eq!(h.ledger.withdraw(owners[leaf], batch, &proof, leaf as u64, ids[leaf]).unwrap(), amounts[leaf]);
        }
    }

    // =========================================================================
    // PAYLOADS AND BALANCES
    // =========================================================================

    #[test]
    fn test_rejected_transfer_leaves_ledger_unchanged() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 50, None).unwrap();
        let ids = h.recipients(&[owner(0), owner(1)]);

        let cases: Vec<(Vec<u8>, ErrorKind)> = vec![
            (payload(&ids, &[30, 30]), ErrorKind::InsufficientBalance),
            // Same recipient twice: second delta is zero.
            (vec![0x02, ids[1].0 as u8, 0x01, 0x00, 0x01], ErrorKind::MalformedPayload),
            // Declares three payouts, carries two.
            (vec![0x03, ids[0].0 as u8, 0x01, 0x01, 0x01], ErrorKind::MalformedPayload),
            (vec![], ErrorKind::MalformedPayload),
        ];
        for (bytes, kind) in cases {
            let err = h
                .ledger
                .transfer(PAYER, payer, BatchIndex(0), &bytes, 0, 0)
                .unwrap_err();
            assert_eq!(err.kind(), kind);
        }
        assert_eq!(h.ledger.account(payer).unwrap().balance, 50);
        assert_eq!(h.ledger.next_batch_index(), BatchIndex(0));
        assert!(h.ledger.batch(BatchIndex(0)).is_none());
    }

    #[test]
    fn test_stale_batch_index_rejected() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 100, None).unwrap();
        let ids = h.recipients(&[owner(0)]);
        commit(&h, payer, &ids, &[1]);

        let err = h
            .ledger
            .transfer(PAYER, payer, BatchIndex(0), &payload(&ids, &[1]), 0, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(h.ledger.next_batch_index(), BatchIndex(1));
    }

    #[test]
    fn test_deposit_extends_only_own_account() {
        let h = LedgerHarness::new(PAYER);
        let payer = h.ledger.deposit(PAYER, 100, None).unwrap();
        assert_eq!(h.ledger.deposit(PAYER, 20, Some(payer)).unwrap(), payer);
        assert_eq!(h.ledger.account(payer).unwrap().balance, 120);

        let err = h.ledger.deposit(CHALLENGER, 20, Some(payer)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(h.balance(CHALLENGER), INITIAL);
    }
}
