//! Builders shared by the integration scenarios.

use dx_01_notary_registry::NotaryDetails;
use dx_02_escrow_accounting::{InMemoryToken, TokenLedger};
use dx_03_notarization::{MessageSigner, NotarizationService, Secp256k1Scheme};
use dx_04_data_order::OrderParams;
use dx_05_data_exchange::{
    AddNotaryRequest, CloseResponseRequest, DataExchange, DataResponseRequest,
    ExchangeDependencies,
};
use dx_06_batch_payments::{
    encode_payload, BatchLedger, LedgerDependencies, LedgerRoles, PayoutEntry,
};
use dx_telemetry::ExchangeConfig;
use shared_bus::{AppendOnlyEventLog, EventSink, FanOutSink};
use shared_types::{AccountId, Address, Amount, ManualTimeSource, OrderId};
use std::sync::Arc;

pub const EXCHANGE: Address = Address([0xEE; 20]);
pub const LEDGER: Address = Address([0x1E; 20]);
pub const OWNER: Address = Address([0x01; 20]);
pub const BUYER: Address = Address([0xB1; 20]);
pub const OPERATOR: Address = Address([0x0F; 20]);
pub const ADJUDICATOR: Address = Address([0xAD; 20]);
pub const CHALLENGER: Address = Address([0xC4; 20]);
pub const REGISTRAR: Address = Address([0x2E; 20]);
pub const INITIAL: Amount = 1_000;
pub const GENESIS: u64 = 1_700_000_000;

// =============================================================================
// EXCHANGE
// =============================================================================

/// A running exchange with one registered notary and a funded buyer.
pub struct ExchangeHarness {
    pub exchange: DataExchange,
    pub token: Arc<InMemoryToken>,
    pub log: Arc<AppendOnlyEventLog>,
    pub clock: Arc<ManualTimeSource>,
    pub notary: MessageSigner,
}

impl ExchangeHarness {
    pub fn new() -> Self {
        Self::with_sink(None)
    }

    /// Events go to the harness log and to `extra` if given.
    pub fn with_sink(extra: Option<Arc<dyn EventSink>>) -> Self {
        let token = Arc::new(InMemoryToken::new());
        token.mint(BUYER, INITIAL).unwrap();
        token.approve(BUYER, EXCHANGE, Amount::MAX).unwrap();

        let clock = Arc::new(ManualTimeSource::new(GENESIS));
        let log = Arc::new(AppendOnlyEventLog::with_clock(clock.clone()));
        let mut sink = FanOutSink::new().with(log.clone());
        if let Some(extra) = extra {
            sink = sink.with(extra);
        }

        let exchange = DataExchange::new(
            ExchangeDependencies {
                address: EXCHANGE,
                token: token.clone(),
                verifier: Arc::new(NotarizationService::new(Secp256k1Scheme)),
                events: Arc::new(sink),
                clock: clock.clone(),
            },
            OWNER,
            &ExchangeConfig::default(),
        )
        .unwrap();

        let notary = MessageSigner::random();
        exchange
            .register_notary(
                OWNER,
                notary.address(),
                NotaryDetails::new("Audit Co", "https://audit.example", "audit-pk"),
            )
            .unwrap();

        Self {
            exchange,
            token,
            log,
            clock,
            notary,
        }
    }

    pub fn balance(&self, who: Address) -> Amount {
        self.token.balance_of(who)
    }

    /// Order with the harness notary attached at 30%.
    pub fn order(&self, price: Amount, budget: Amount, fee: Amount) -> OrderId {
        let id = self.exchange.create_order(BUYER, params(price, budget)).unwrap();
        self.exchange
            .add_notary(BUYER, id, self.notary_request(id, 30, fee))
            .unwrap();
        id
    }

    pub fn notary_request(&self, order_id: OrderId, percentage: u8, fee: Amount) -> AddNotaryRequest {
        let mut request = AddNotaryRequest {
            notary: self.notary.address(),
            responses_percentage: percentage,
            notarization_fee: fee,
            terms_of_service_hash: [0x70; 32],
            signature: vec![],
        };
        request.signature = self.notary.sign(&request.consent(order_id)).unwrap();
        request
    }

    pub fn response_request(&self, seller: &MessageSigner, order_id: OrderId) -> DataResponseRequest {
        let mut request = DataResponseRequest {
            seller: seller.address(),
            notary: self.notary.address(),
            data_hash: [0xDA; 32],
            signature: vec![],
        };
        request.signature = seller.sign(&request.consent(order_id)).unwrap();
        request
    }

    pub fn close_request(
        &self,
        seller: Address,
        order_id: OrderId,
        audited: bool,
        valid: bool,
    ) -> CloseResponseRequest {
        let mut request = CloseResponseRequest {
            seller,
            was_audited: audited,
            is_data_valid: valid,
            signature: vec![],
        };
        request.signature = self.notary.sign(&request.consent(order_id)).unwrap();
        request
    }
}

impl Default for ExchangeHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn params(price: Amount, budget: Amount) -> OrderParams {
    OrderParams {
        price,
        initial_audit_budget: budget,
        terms_hash: [0x7E; 32],
        buyer_url: "https://buyer.example".to_string(),
        buyer_public_key: "buyer-pk".to_string(),
    }
}

// =============================================================================
// BATCH LEDGER
// =============================================================================

pub const PERIOD: u64 = 3_600;
pub const BOND: Amount = 10;

/// A batch ledger with a funded payer and challenger.
pub struct LedgerHarness {
    pub ledger: BatchLedger,
    pub token: Arc<InMemoryToken>,
    pub log: Arc<AppendOnlyEventLog>,
    pub clock: Arc<ManualTimeSource>,
}

impl LedgerHarness {
    pub fn new(payer: Address) -> Self {
        Self::with_sink(payer, None)
    }

    pub fn with_sink(payer: Address, extra: Option<Arc<dyn EventSink>>) -> Self {
        let token = Arc::new(InMemoryToken::new());
        for who in [payer, CHALLENGER] {
            token.mint(who, INITIAL).unwrap();
            token.approve(who, LEDGER, Amount::MAX).unwrap();
        }
        let clock = Arc::new(ManualTimeSource::new(GENESIS));
        let log = Arc::new(AppendOnlyEventLog::with_clock(clock.clone()));
        let mut sink = FanOutSink::new().with(log.clone());
        if let Some(extra) = extra {
            sink = sink.with(extra);
        }

        let config = ExchangeConfig {
            challenge_period_secs: PERIOD,
            challenge_bond: BOND,
            ..ExchangeConfig::default()
        };
        let ledger = BatchLedger::new(
            LedgerDependencies {
                address: LEDGER,
                token: token.clone(),
                events: Arc::new(sink),
                clock: clock.clone(),
            },
            LedgerRoles {
                operator: OPERATOR,
                adjudicator: ADJUDICATOR,
            },
            &config,
        )
        .unwrap();

        Self {
            ledger,
            token,
            log,
            clock,
        }
    }

    pub fn balance(&self, who: Address) -> Amount {
        self.token.balance_of(who)
    }

    /// Bulk-register one slot per owner and assign it.
    pub fn recipients(&self, owners: &[Address]) -> Vec<AccountId> {
        let registration = self
            .ledger
            .bulk_register(REGISTRAR, owners.len() as u64, self.ledger.next_account_id())
            .unwrap();
        owners
            .iter()
            .enumerate()
            .map(|(i, owner)| {
                let id = AccountId(registration.first_id.0 + i as u64);
                self.ledger.assign_slot(REGISTRAR, id, *owner).unwrap();
                id
            })
            .collect()
    }
}

/// Payload paying `amounts[i]` to `ids[i]`. Ids must be ascending.
pub fn payload(ids: &[AccountId], amounts: &[Amount]) -> Vec<u8> {
    let entries: Vec<PayoutEntry> = ids
        .iter()
        .zip(amounts)
        .map(|(id, amount)| PayoutEntry::new(id.0, *amount))
        .collect();
    encode_payload(&entries).unwrap()
}

/// Distinct recipient owner addresses.
pub fn owner(i: u8) -> Address {
    Address([0x50 + i; 20])
}
