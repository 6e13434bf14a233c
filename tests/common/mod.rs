#![allow(dead_code)]

use async_trait::async_trait;
use paycode::application::cards::CardService;
use paycode::application::credential::CredentialTokenizer;
use paycode::application::engine::{NewCharge, PaymentEngine, StatusChange, TargetStatus};
use paycode::application::notifier::Notifier;
use paycode::domain::card::Card;
use paycode::domain::ports::{
    MessageBus, MessageBusBox, SubscriptionBox, TransactionStore, TransactionStoreBox,
};
use paycode::domain::role::Role;
use paycode::domain::transaction::{Transaction, TransactionFilter, TransactionPatch};
use paycode::error::{PaymentError, Result};
use paycode::infrastructure::auth::AllowAllPasswords;
use paycode::infrastructure::bus::InMemoryBus;
use paycode::infrastructure::clock::ManualClock;
use paycode::infrastructure::in_memory::{InMemoryCardStore, InMemoryTransactionStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const TEST_KEY: &str = "integration-test-key";

/// The whole service wired with in-memory collaborators and a manual clock.
pub struct Harness {
    pub engine: Arc<PaymentEngine>,
    pub cards: CardService,
    pub bus: InMemoryBus,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_wait_timeout(Duration::from_secs(5))
    }

    pub fn with_wait_timeout(wait_timeout: Duration) -> Self {
        Self::with_collaborators(Box::new(InMemoryTransactionStore::new()), None, wait_timeout)
    }

    /// Swaps in the given transaction store, and the given bus instead of the
    /// harness's own `InMemoryBus` when one is passed.
    pub fn with_collaborators(
        transactions: TransactionStoreBox,
        bus_override: Option<MessageBusBox>,
        wait_timeout: Duration,
    ) -> Self {
        let clock = Arc::new(ManualClock::default());
        let card_store = Arc::new(InMemoryCardStore::new());
        let bus = InMemoryBus::new();
        let engine_bus = bus_override.unwrap_or_else(|| Box::new(bus.clone()));

        let engine = PaymentEngine::new(
            transactions,
            card_store.clone(),
            Box::new(AllowAllPasswords),
            CredentialTokenizer::new(TEST_KEY, 5, clock.clone()).unwrap(),
            Notifier::new(engine_bus, wait_timeout),
            clock.clone(),
        );

        Self {
            engine: Arc::new(engine),
            cards: CardService::new(card_store, clock.clone()),
            bus,
            clock,
        }
    }

    pub async fn charge(&self, tenant: &str, client: &str, amount: Decimal) -> Transaction {
        let credential = self.engine.tokenizer().encode(client).unwrap();
        self.engine
            .create(NewCharge {
                tenant_id: tenant.to_string(),
                credential,
                amount,
                currency: "USD".to_string(),
                detail: "integration".to_string(),
            })
            .await
            .unwrap()
            .transaction
    }

    pub async fn card(&self, client: &str, number: &str) -> Card {
        self.cards.create(client, Role::Client, number).await.unwrap()
    }

    /// Resolves once a waiter is attached to `topic`.
    pub async fn until_subscribed(&self, topic: &str) {
        while self.bus.subscriber_count(topic) == 0 {
            tokio::task::yield_now().await;
        }
    }
}

pub fn confirm(tx: &Transaction, client: &str, card: &str) -> StatusChange {
    StatusChange {
        transaction_id: tx.id.clone(),
        client_id: client.to_string(),
        target: Some(TargetStatus::Confirmed),
        card_id: Some(card.to_string()),
        payment_password: Some("123456".to_string()),
    }
}

pub fn abort(tx: &Transaction, client: &str) -> StatusChange {
    StatusChange {
        transaction_id: tx.id.clone(),
        client_id: client.to_string(),
        target: Some(TargetStatus::Aborted),
        ..StatusChange::default()
    }
}

/// A bus whose broker is unreachable.
pub struct DownBus;

#[async_trait]
impl MessageBus for DownBus {
    async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<()> {
        Err(PaymentError::internal("bus down"))
    }

    async fn subscribe_once(&self, _topic: &str) -> Result<SubscriptionBox> {
        Err(PaymentError::internal("bus down"))
    }
}

/// An in-memory transaction store whose writes start failing on demand.
/// Clones share rows and the failure switch.
#[derive(Clone, Default)]
pub struct FlakyTransactionStore {
    inner: InMemoryTransactionStore,
    writes_down: Arc<AtomicBool>,
}

impl FlakyTransactionStore {
    pub fn fail_writes(&self) {
        self.writes_down.store(true, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<()> {
        if self.writes_down.load(Ordering::SeqCst) {
            return Err(PaymentError::internal("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for FlakyTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        self.check_writes()?;
        self.inner.insert(tx).await
    }

    async fn select_one(&self, filter: &TransactionFilter) -> Result<Option<Transaction>> {
        self.inner.select_one(filter).await
    }

    async fn select_many(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.inner.select_many(filter).await
    }

    async fn update_fields(
        &self,
        filter: &TransactionFilter,
        patch: &TransactionPatch,
    ) -> Result<u64> {
        self.check_writes()?;
        self.inner.update_fields(filter, patch).await
    }
}
