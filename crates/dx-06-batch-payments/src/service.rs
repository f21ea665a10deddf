//! # Batch Ledger Service
//!
//! ## Fund Flow
//!
//! ```text
//! payer ──deposit──► account ──transfer──► batch (payouts + bond)
//!                       │                     │
//!                       └──fee──► operator    ├──withdraw──► recipient owner
//!                                             ├──upheld────► payer account (+ bond to challenger)
//!                                             └──finalize──► payer account (unused bond)
//! ```
//!
//! Account balances live in the escrow ledger, one sub-account per account.
//! Multi-leg movements go through a single `EscrowPlan` so they apply
//! completely or not at all.

use crate::domain::{
    leaf_hash, payload, AccountSnapshot, Batch, BatchAccount, BatchError, BulkRegistration,
    Challenge, ChallengeOutcome, LeafStatus, PayoutTree, WithdrawalProof,
};
use dx_02_escrow_accounting::{EscrowKey, EscrowLedger, EscrowPlan, EscrowView, TokenLedger};
use dx_telemetry::{log_event, ExchangeConfig};
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventSink, ExchangeEvent};
use shared_types::{AccountId, Address, AggregateStore, Amount, BatchIndex, TimeSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Account that collects batch fees. Owned by the operator.
pub const OPERATOR_FEE_ACCOUNT: AccountId = AccountId(0);

const COMPONENT: &str = "batch_ledger";

/// Collaborators injected into the ledger.
pub struct LedgerDependencies {
    /// Address of the ledger. Escrowed tokens are held here.
    pub address: Address,
    /// Token capability.
    pub token: Arc<dyn TokenLedger>,
    /// Event sink.
    pub events: Arc<dyn EventSink>,
    /// Clock.
    pub clock: Arc<dyn TimeSource>,
}

/// Roles of the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerRoles {
    /// Owner of the fee account.
    pub operator: Address,
    /// Decides challenges.
    pub adjudicator: Address,
}

/// The batch payment ledger.
pub struct BatchLedger {
    roles: LedgerRoles,
    challenge_period: u64,
    challenge_bond: Amount,
    max_leaves: u64,
    accounts: AggregateStore<AccountId, BatchAccount>,
    next_account_id: Mutex<u64>,
    registrations: RwLock<Vec<BulkRegistration>>,
    batches: AggregateStore<BatchIndex, Batch>,
    next_batch: Mutex<u64>,
    escrow: EscrowLedger,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn TimeSource>,
}

impl BatchLedger {
    /// Create a ledger. Opens the operator's fee account as account 0.
    pub fn new(
        deps: LedgerDependencies,
        roles: LedgerRoles,
        config: &ExchangeConfig,
    ) -> Result<Self, BatchError> {
        if roles.operator.is_zero() || roles.adjudicator.is_zero() {
            return Err(BatchError::InvalidConstructorArgs("zero role address"));
        }
        config
            .validate()
            .map_err(|_| BatchError::InvalidConstructorArgs("invalid configuration"))?;
        let escrow = EscrowLedger::new(deps.address, deps.token)
            .map_err(|_| BatchError::InvalidConstructorArgs("invalid vault"))?;

        let accounts = AggregateStore::new();
        accounts.insert(
            OPERATOR_FEE_ACCOUNT,
            BatchAccount::owned(OPERATOR_FEE_ACCOUNT, roles.operator, deps.clock.now()),
        )?;

        log_event!(
            info,
            COMPONENT,
            "Batch ledger created",
            ledger = %deps.address,
            operator = %roles.operator,
            challenge_period = config.challenge_period_secs
        );

        Ok(Self {
            roles,
            challenge_period: config.challenge_period_secs,
            challenge_bond: config.challenge_bond,
            max_leaves: config.max_batch_leaves,
            accounts,
            next_account_id: Mutex::new(OPERATOR_FEE_ACCOUNT.0 + 1),
            registrations: RwLock::new(Vec::new()),
            batches: AggregateStore::new(),
            next_batch: Mutex::new(0),
            escrow,
            events: deps.events,
            clock: deps.clock,
        })
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Lock `amount` from `payer` into a new account (`hint == None`) or
    /// into an account the payer owns.
    pub fn deposit(
        &self,
        payer: Address,
        amount: Amount,
        hint: Option<AccountId>,
    ) -> Result<AccountId, BatchError> {
        if payer.is_zero() {
            return Err(BatchError::ZeroAddress);
        }
        if amount == 0 {
            return Err(BatchError::ZeroAmount);
        }

        let account_id = match hint {
            None => {
                // The id is only consumed once the funds are in escrow.
                let mut next_id = self.next_account_id.lock();
                let id = AccountId(*next_id);
                self.escrow.ensure_can_lock(payer, amount)?;
                self.escrow
                    .lock(payer, EscrowKey::BatchAccount(id), amount)?;
                self.accounts
                    .insert(id, BatchAccount::owned(id, payer, self.clock.now()))?;
                *next_id += 1;
                id
            }
            Some(id) => {
                self.accounts.transaction(&id, |account| {
                    if !account.is_owned_by(payer) {
                        warn!(payer = %payer, account = %id, "Deposit into foreign account rejected");
                        return Err(BatchError::Unauthorized(payer));
                    }
                    self.escrow
                        .lock(payer, EscrowKey::BatchAccount(id), amount)?;
                    account.version += 1;
                    Ok(())
                })?;
                id
            }
        };

        log_event!(info, COMPONENT, "Deposit", account = %account_id, owner = %payer, amount);
        self.events.emit(ExchangeEvent::Deposit {
            account_id,
            owner: payer,
            amount,
        });
        Ok(account_id)
    }

    /// Reserve `count` sequential unowned account slots starting at
    /// `start_offset`, which must be the next free id.
    pub fn bulk_register(
        &self,
        registrar: Address,
        count: u64,
        start_offset: AccountId,
    ) -> Result<BulkRegistration, BatchError> {
        if registrar.is_zero() {
            return Err(BatchError::ZeroAddress);
        }
        if count == 0 {
            return Err(BatchError::ZeroAmount);
        }
        if count > self.max_leaves {
            return Err(BatchError::RegistrationTooLarge {
                count,
                max: self.max_leaves,
            });
        }
        let end = start_offset.0.checked_add(count).ok_or(BatchError::Overflow)?;

        {
            let mut next_id = self.next_account_id.lock();
            if *next_id != start_offset.0 {
                return Err(BatchError::OffsetMismatch {
                    expected: AccountId(*next_id),
                    actual: start_offset,
                });
            }
            *next_id = end;
        }

        let now = self.clock.now();
        let registration = {
            let mut registrations = self.registrations.write();
            let registration = BulkRegistration {
                id: registrations.len() as u64,
                registrar,
                first_id: start_offset,
                count,
                registered_at: now,
            };
            registrations.push(registration.clone());
            registration
        };
        for id in start_offset.0..end {
            let id = AccountId(id);
            self.accounts
                .insert(id, BatchAccount::slot(id, registrar, registration.id, now))?;
        }

        log_event!(
            info,
            COMPONENT,
            "Bulk registration",
            registrar = %registrar,
            first_id = %start_offset,
            count
        );
        self.events.emit(ExchangeEvent::BulkRegistered {
            first_id: start_offset,
            count,
        });
        Ok(registration)
    }

    /// Bind an owner to a bulk slot. Only the slot's registrar may do so,
    /// and only once.
    pub fn assign_slot(
        &self,
        registrar: Address,
        account_id: AccountId,
        owner: Address,
    ) -> Result<(), BatchError> {
        if owner.is_zero() {
            return Err(BatchError::ZeroAddress);
        }
        self.accounts.transaction(&account_id, |account| {
            match account.registrar {
                None => return Err(BatchError::NotASlot(account_id)),
                Some(r) if r != registrar => return Err(BatchError::Unauthorized(registrar)),
                Some(_) => {}
            }
            if account.owner.is_some() {
                return Err(BatchError::SlotAlreadyAssigned(account_id));
            }
            account.owner = Some(owner);
            account.version += 1;
            Ok(())
        })?;

        debug!(account = %account_id, owner = %owner, "Slot assigned");
        self.events.emit(ExchangeEvent::SlotAssigned { account_id, owner });
        Ok(())
    }

    /// Pay unused account balance back to its owner.
    pub fn withdraw_balance(
        &self,
        owner: Address,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<(), BatchError> {
        if amount == 0 {
            return Err(BatchError::ZeroAmount);
        }
        self.accounts.transaction(&account_id, |account| {
            if !account.is_owned_by(owner) {
                return Err(BatchError::Unauthorized(owner));
            }
            let available = self.escrow.balance(&EscrowKey::BatchAccount(account_id));
            if available < amount {
                return Err(BatchError::InsufficientBalance {
                    account: account_id,
                    needed: amount,
                    available,
                });
            }
            self.escrow
                .release(EscrowKey::BatchAccount(account_id), owner, amount)?;
            account.version += 1;
            Ok(())
        })?;

        log_event!(info, COMPONENT, "Balance withdrawn", account = %account_id, amount);
        self.events.emit(ExchangeEvent::BalanceWithdrawn {
            account_id,
            to: owner,
            amount,
        });
        Ok(())
    }

    // =========================================================================
    // BATCHES
    // =========================================================================

    /// Commit a batch of payouts from `payer_account`.
    ///
    /// Debits `total + fee + challenge_bond`. `fee` goes to the operator's
    /// fee account, `metadata` is recorded as is.
    pub fn transfer(
        &self,
        caller: Address,
        payer_account: AccountId,
        expected_batch_index: BatchIndex,
        payload_bytes: &[u8],
        fee: Amount,
        metadata: u64,
    ) -> Result<BatchIndex, BatchError> {
        let entries = payload::decode(payload_bytes, self.max_leaves)?;
        if let Some(unknown) = entries
            .iter()
            .find(|e| !self.accounts.contains(&e.recipient))
        {
            return Err(BatchError::UnknownRecipient(unknown.recipient));
        }

        let total = entries
            .iter()
            .try_fold(0u128, |acc, e| acc.checked_add(e.amount))
            .ok_or(BatchError::Overflow)?;
        let debit = total
            .checked_add(fee)
            .and_then(|v| v.checked_add(self.challenge_bond))
            .ok_or(BatchError::Overflow)?;
        let tree = PayoutTree::build(&entries);
        let root = tree.root();
        let leaves = entries.len();

        let batch = self.accounts.transaction(&payer_account, |account| {
            if !account.is_owned_by(caller) {
                warn!(caller = %caller, account = %payer_account, "Transfer from foreign account rejected");
                return Err(BatchError::Unauthorized(caller));
            }
            let available = self.escrow.balance(&EscrowKey::BatchAccount(payer_account));
            if available < debit {
                return Err(BatchError::InsufficientBalance {
                    account: payer_account,
                    needed: debit,
                    available,
                });
            }

            let mut next = self.next_batch.lock();
            if *next != expected_batch_index.0 {
                return Err(BatchError::BatchIndexMismatch {
                    expected: BatchIndex(*next),
                    actual: expected_batch_index,
                });
            }
            let index = BatchIndex(*next);
            let now = self.clock.now();

            let plan = EscrowPlan::new()
                .reassign(
                    EscrowKey::BatchAccount(payer_account),
                    EscrowKey::Batch(index),
                    total + self.challenge_bond,
                )
                .reassign(
                    EscrowKey::BatchAccount(payer_account),
                    EscrowKey::BatchAccount(OPERATOR_FEE_ACCOUNT),
                    fee,
                );
            self.escrow.execute(&plan)?;

            let batch = Batch {
                index,
                payer_account,
                root,
                committed_at: now,
                challenge_deadline: now.saturating_add(self.challenge_period),
                finalized: false,
                total,
                fee,
                metadata,
                bond: self.challenge_bond,
                withdrawn_total: 0,
                voided_total: 0,
                entries: Arc::new(entries),
                tree: Arc::new(tree),
                leaf_status: vec![LeafStatus::Committed; leaves],
                challenges: BTreeMap::new(),
            };
            self.batches.insert(index, batch.clone())?;
            *next += 1;
            account.version += 1;
            Ok(batch)
        })?;

        log_event!(
            info,
            COMPONENT,
            "Batch committed",
            batch_index = %batch.index,
            payer = %payer_account,
            leaves,
            total,
            fee
        );
        self.events.emit(ExchangeEvent::BatchCommitted {
            batch_index: batch.index,
            payer_account,
            root,
            total,
            leaves: leaves as u64,
            challenge_deadline: batch.challenge_deadline,
        });
        Ok(batch.index)
    }

    /// Dispute one leaf before the challenge deadline. The challenger posts
    /// the challenge bond.
    pub fn challenge(
        &self,
        challenger: Address,
        batch_index: BatchIndex,
        leaf_index: u64,
        evidence: Vec<u8>,
    ) -> Result<(), BatchError> {
        if challenger.is_zero() {
            return Err(BatchError::ZeroAddress);
        }
        let now = self.clock.now();

        self.batches.transaction(&batch_index, |batch| {
            if batch.entry(leaf_index).is_none() {
                return Err(BatchError::LeafNotFound {
                    batch_index,
                    leaf_index,
                });
            }
            if !batch.in_challenge_window(now) {
                return Err(BatchError::ChallengeWindowClosed {
                    batch_index,
                    deadline: batch.challenge_deadline,
                });
            }
            if batch.challenges.contains_key(&leaf_index) {
                return Err(BatchError::ChallengeExists {
                    batch_index,
                    leaf_index,
                });
            }

            self.escrow.lock(
                challenger,
                EscrowKey::ChallengeBond(batch_index, leaf_index),
                self.challenge_bond,
            )?;
            batch.challenges.insert(
                leaf_index,
                Challenge {
                    batch_index,
                    leaf_index,
                    challenger,
                    evidence,
                    bond: self.challenge_bond,
                    outcome: ChallengeOutcome::Pending,
                    raised_at: now,
                    resolved_at: None,
                },
            );
            Ok(())
        })?;

        log_event!(
            info,
            COMPONENT,
            "Challenge raised",
            batch_index = %batch_index,
            leaf_index,
            challenger = %challenger
        );
        self.events.emit(ExchangeEvent::ChallengeRaised {
            batch_index,
            leaf_index,
            challenger,
        });
        Ok(())
    }

    /// Decide a pending challenge. Adjudicator only.
    ///
    /// Upheld: the leaf is voided, its amount returns to the payer account,
    /// the challenger gets the bond back plus compensation out of the
    /// payer's batch bond. Rejected: the challenger's bond goes to the payer
    /// account.
    pub fn resolve_challenge(
        &self,
        adjudicator: Address,
        batch_index: BatchIndex,
        leaf_index: u64,
        upheld: bool,
    ) -> Result<(), BatchError> {
        if adjudicator != self.roles.adjudicator {
            warn!(caller = %adjudicator, "Challenge resolution by non-adjudicator rejected");
            return Err(BatchError::Unauthorized(adjudicator));
        }
        let now = self.clock.now();

        self.batches.transaction(&batch_index, |batch| {
            let (challenger, bond) = match batch.challenges.get(&leaf_index) {
                None => {
                    return Err(BatchError::ChallengeNotFound {
                        batch_index,
                        leaf_index,
                    })
                }
                Some(c) if !c.is_pending() => {
                    return Err(BatchError::ChallengeAlreadyResolved {
                        batch_index,
                        leaf_index,
                    })
                }
                Some(c) => (c.challenger, c.bond),
            };
            let amount = batch
                .entry(leaf_index)
                .map(|e| e.amount)
                .ok_or(BatchError::LeafNotFound {
                    batch_index,
                    leaf_index,
                })?;
            let batch_key = EscrowKey::Batch(batch_index);
            let bond_key = EscrowKey::ChallengeBond(batch_index, leaf_index);
            let payer_key = EscrowKey::BatchAccount(batch.payer_account);

            let outcome = if upheld {
                let compensation = batch.bond.min(bond);
                let plan = EscrowPlan::new()
                    .reassign(batch_key, payer_key, amount)
                    .pay(bond_key, challenger, bond)
                    .pay(batch_key, challenger, compensation);
                self.escrow.execute(&plan)?;

                batch.bond -= compensation;
                batch.voided_total += amount;
                if let Some(status) = batch.status_mut(leaf_index) {
                    *status = LeafStatus::Voided;
                }
                ChallengeOutcome::Upheld
            } else {
                let plan = EscrowPlan::new().reassign(bond_key, payer_key, bond);
                self.escrow.execute(&plan)?;
                ChallengeOutcome::Rejected
            };

            if let Some(challenge) = batch.challenges.get_mut(&leaf_index) {
                challenge.outcome = outcome;
                challenge.resolved_at = Some(now);
            }
            Ok(())
        })?;

        log_event!(
            info,
            COMPONENT,
            "Challenge resolved",
            batch_index = %batch_index,
            leaf_index,
            upheld
        );
        self.events.emit(ExchangeEvent::ChallengeResolved {
            batch_index,
            leaf_index,
            upheld,
        });
        Ok(())
    }

    /// Pay leaf `leaf_index` of a batch to the owner of `recipient`.
    ///
    /// Returns the amount paid.
    pub fn withdraw(
        &self,
        caller: Address,
        batch_index: BatchIndex,
        proof: &WithdrawalProof,
        leaf_index: u64,
        recipient: AccountId,
    ) -> Result<Amount, BatchError> {
        let account = self
            .accounts
            .get(&recipient)
            .ok_or(BatchError::AccountNotFound(recipient))?;
        if !account.is_owned_by(caller) {
            warn!(caller = %caller, account = %recipient, "Withdrawal for foreign account rejected");
            return Err(BatchError::Unauthorized(caller));
        }
        let now = self.clock.now();

        let amount = self.batches.transaction(&batch_index, |batch| {
            let status = batch.status(leaf_index).ok_or(BatchError::LeafNotFound {
                batch_index,
                leaf_index,
            })?;
            if batch.in_challenge_window(now) {
                return Err(BatchError::NotYetWithdrawable {
                    batch_index,
                    deadline: batch.challenge_deadline,
                });
            }
            if batch
                .challenges
                .get(&leaf_index)
                .is_some_and(Challenge::is_pending)
            {
                return Err(BatchError::ChallengePending {
                    batch_index,
                    leaf_index,
                });
            }
            match status {
                LeafStatus::Voided => {
                    return Err(BatchError::LeafVoided {
                        batch_index,
                        leaf_index,
                    })
                }
                LeafStatus::Withdrawn => {
                    return Err(BatchError::AlreadyWithdrawn {
                        batch_index,
                        leaf_index,
                    })
                }
                LeafStatus::Committed => {}
            }

            let leaf = leaf_hash(recipient, proof.amount);
            if !PayoutTree::verify(&leaf, leaf_index, &proof.path, &batch.root) {
                warn!(batch_index = %batch_index, leaf_index, "Invalid withdrawal proof");
                return Err(BatchError::InvalidProof {
                    batch_index,
                    leaf_index,
                });
            }

            self.escrow
                .release(EscrowKey::Batch(batch_index), caller, proof.amount)?;
            batch.withdrawn_total += proof.amount;
            if let Some(status) = batch.status_mut(leaf_index) {
                *status = LeafStatus::Withdrawn;
            }
            Ok(proof.amount)
        })?;

        log_event!(
            info,
            COMPONENT,
            "Withdrawal",
            batch_index = %batch_index,
            leaf_index,
            recipient = %recipient,
            amount
        );
        self.events.emit(ExchangeEvent::Withdrawal {
            batch_index,
            leaf_index,
            recipient,
            to: caller,
            amount,
        });
        Ok(amount)
    }

    /// Return the payer's unused bond once the window closed with no
    /// pending challenges. Returns the bond returned.
    pub fn finalize_batch(&self, batch_index: BatchIndex) -> Result<Amount, BatchError> {
        let now = self.clock.now();

        let returned = self.batches.transaction(&batch_index, |batch| {
            if batch.finalized {
                return Err(BatchError::AlreadyFinalized(batch_index));
            }
            if batch.in_challenge_window(now) {
                return Err(BatchError::NotFinalizable {
                    batch_index,
                    reason: "challenge window open",
                });
            }
            if batch.pending_challenges() > 0 {
                return Err(BatchError::NotFinalizable {
                    batch_index,
                    reason: "pending challenges",
                });
            }

            let returned = batch.bond;
            let plan = EscrowPlan::new().reassign(
                EscrowKey::Batch(batch_index),
                EscrowKey::BatchAccount(batch.payer_account),
                returned,
            );
            self.escrow.execute(&plan)?;
            batch.bond = 0;
            batch.finalized = true;
            Ok(returned)
        })?;

        log_event!(info, COMPONENT, "Batch finalized", batch_index = %batch_index, returned);
        self.events.emit(ExchangeEvent::BatchFinalized {
            batch_index,
            returned_bond: returned,
        });
        Ok(returned)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Account with its escrowed balance.
    pub fn account(&self, account_id: AccountId) -> Option<AccountSnapshot> {
        let account = self.accounts.get(&account_id)?;
        Some(AccountSnapshot {
            id: account.id,
            owner: account.owner,
            balance: self.escrow.balance(&EscrowKey::BatchAccount(account_id)),
            version: account.version,
        })
    }

    /// Snapshot of a batch.
    pub fn batch(&self, batch_index: BatchIndex) -> Option<Batch> {
        self.batches.get(&batch_index)
    }

    /// Challenge on a leaf.
    pub fn challenge_of(&self, batch_index: BatchIndex, leaf_index: u64) -> Option<Challenge> {
        self.batches
            .get(&batch_index)
            .and_then(|b| b.challenges.get(&leaf_index).cloned())
    }

    /// Proof a recipient presents to withdraw a leaf.
    pub fn merkle_proof(&self, batch_index: BatchIndex, leaf_index: u64) -> Option<WithdrawalProof> {
        self.batches.get(&batch_index)?.proof(leaf_index)
    }

    /// All bulk registrations, oldest first.
    pub fn registrations(&self) -> Vec<BulkRegistration> {
        self.registrations.read().clone()
    }

    /// Index the next batch will get.
    pub fn next_batch_index(&self) -> BatchIndex {
        BatchIndex(*self.next_batch.lock())
    }

    /// Id the next account will get.
    pub fn next_account_id(&self) -> AccountId {
        AccountId(*self.next_account_id.lock())
    }

    /// Ledger roles.
    pub fn roles(&self) -> LedgerRoles {
        self.roles
    }

    /// Read-only view of the escrow holding account and batch funds.
    pub fn escrow(&self) -> EscrowView<'_> {
        self.escrow.view()
    }

    /// True if every batch's escrow matches its outstanding payouts and bond.
    pub fn check_batch_escrow(&self) -> bool {
        self.batches
            .collect_where(|_| true)
            .iter()
            .all(|b| self.escrow.balance(&EscrowKey::Batch(b.index)) == b.outstanding())
    }
}
