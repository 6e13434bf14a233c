use crate::domain::card::{Card, CardFilter, CreditDetails};
use crate::domain::ports::{CardStore, TransactionStore};
use crate::domain::transaction::{Transaction, TransactionFilter, TransactionPatch};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for transactions.
///
/// Uses `Arc<RwLock<HashMap<String, Transaction>>>` so clones share the same rows.
/// Each update runs under the write lock, which gives single-row atomicity.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        match transactions.entry(tx.id.clone()) {
            Entry::Occupied(_) => Err(PaymentError::internal(format!(
                "Transaction {} already exists",
                tx.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(())
            }
        }
    }

    async fn select_one(&self, filter: &TransactionFilter) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        if let Some(id) = &filter.id {
            return Ok(transactions.get(id).filter(|tx| filter.matches(tx)).cloned());
        }
        Ok(transactions.values().find(|tx| filter.matches(tx)).cloned())
    }

    async fn select_many(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut matched: Vec<Transaction> = transactions
            .values()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn update_fields(
        &self,
        filter: &TransactionFilter,
        patch: &TransactionPatch,
    ) -> Result<u64> {
        let mut transactions = self.transactions.write().await;
        let mut affected = 0;
        for tx in transactions.values_mut().filter(|tx| filter.matches(tx)) {
            patch.apply_to(tx);
            affected += 1;
        }
        Ok(affected)
    }
}

/// A thread-safe in-memory store for cards. Deletes are soft.
#[derive(Default, Clone)]
pub struct InMemoryCardStore {
    cards: Arc<RwLock<HashMap<String, Card>>>,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn insert(&self, card: Card) -> Result<()> {
        let mut cards = self.cards.write().await;
        match cards.entry(card.id.clone()) {
            Entry::Occupied(_) => Err(PaymentError::internal(format!(
                "Card {} already exists",
                card.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(card);
                Ok(())
            }
        }
    }

    async fn select_one(&self, filter: &CardFilter) -> Result<Option<Card>> {
        let cards = self.cards.read().await;
        if let Some(id) = &filter.id {
            return Ok(cards.get(id).filter(|card| filter.matches(card)).cloned());
        }
        Ok(cards.values().find(|card| filter.matches(card)).cloned())
    }

    async fn select_many(&self, filter: &CardFilter) -> Result<Vec<Card>> {
        let cards = self.cards.read().await;
        let mut matched: Vec<Card> = cards
            .values()
            .filter(|card| filter.matches(card))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn update_fields(
        &self,
        filter: &CardFilter,
        details: &CreditDetails,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut cards = self.cards.write().await;
        let mut affected = 0;
        for card in cards.values_mut().filter(|card| filter.matches(card)) {
            card.set_credit_details(details.clone(), at)?;
            affected += 1;
        }
        Ok(affected)
    }

    async fn soft_delete(&self, filter: &CardFilter, at: DateTime<Utc>) -> Result<u64> {
        let mut cards = self.cards.write().await;
        let mut affected = 0;
        for card in cards.values_mut().filter(|card| filter.matches(card)) {
            card.deleted_at = Some(at);
            card.updated_at = at;
            affected += 1;
        }
        Ok(affected)
    }
}
