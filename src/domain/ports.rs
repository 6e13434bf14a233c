use super::card::{Card, CardFilter, CreditDetails};
use super::transaction::{Transaction, TransactionFilter, TransactionPatch};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Transactions are never deleted; a terminal row stays for history.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, tx: Transaction) -> Result<()>;
    async fn select_one(&self, filter: &TransactionFilter) -> Result<Option<Transaction>>;
    async fn select_many(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
    /// Applies `patch` to every row matching `filter`, returning the rows affected.
    async fn update_fields(&self, filter: &TransactionFilter, patch: &TransactionPatch)
    -> Result<u64>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    async fn insert(&self, card: Card) -> Result<()>;
    async fn select_one(&self, filter: &CardFilter) -> Result<Option<Card>>;
    async fn select_many(&self, filter: &CardFilter) -> Result<Vec<Card>>;
    async fn update_fields(
        &self,
        filter: &CardFilter,
        details: &CreditDetails,
        at: DateTime<Utc>,
    ) -> Result<u64>;
    async fn soft_delete(&self, filter: &CardFilter, at: DateTime<Utc>) -> Result<u64>;
}

/// Fire-and-forget topic bus. Messages published with nobody subscribed are dropped.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
    async fn subscribe_once(&self, topic: &str) -> Result<SubscriptionBox>;
}

/// A live subscription. Dropping it detaches from the topic.
#[async_trait]
pub trait Subscription: Send {
    async fn next_message(&mut self, timeout: Duration) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait PaymentPasswordChecker: Send + Sync {
    async fn check_payment_password(&self, client_id: &str, password: &str) -> Result<bool>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type CardStoreRef = Arc<dyn CardStore>;
pub type MessageBusBox = Box<dyn MessageBus>;
pub type SubscriptionBox = Box<dyn Subscription>;
pub type PasswordCheckerBox = Box<dyn PaymentPasswordChecker>;
pub type ClockRef = Arc<dyn Clock>;
