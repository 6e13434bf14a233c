use crate::domain::card::{Card, CardFilter, CreditDetails};
use crate::domain::ports::{CardStore, TransactionStore};
use crate::domain::transaction::{Transaction, TransactionFilter, TransactionPatch};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing transactions.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for storing cards.
pub const CF_CARDS: &str = "cards";

/// A persistent store implementation using RocksDB.
///
/// Transactions and cards live in separate Column Families, keyed by id, with
/// JSON values. Read-modify-write updates are serialized through a single
/// writer lock so an update never interleaves with another on the same handle.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("transactions" and "cards") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let cf_cards = ColumnFamilyDescriptor::new(CF_CARDS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions, cf_cards])?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(&cf, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn exists(&self, cf_name: &str, key: &str) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_pinned_cf(&cf, key.as_bytes())?.is_some())
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::internal(format!("{} column family not found", name)))
    }

    fn transactions_matching(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = match &filter.id {
            Some(id) => self
                .get_json::<Transaction>(CF_TRANSACTIONS, id)?
                .into_iter()
                .collect(),
            None => self.scan(CF_TRANSACTIONS)?,
        };
        rows.retain(|tx| filter.matches(tx));
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn cards_matching(&self, filter: &CardFilter) -> Result<Vec<Card>> {
        let mut rows: Vec<Card> = match &filter.id {
            Some(id) => self.get_json::<Card>(CF_CARDS, id)?.into_iter().collect(),
            None => self.scan(CF_CARDS)?,
        };
        rows.retain(|card| filter.matches(card));
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let _guard = self.writer.lock().await;
        if self.exists(CF_TRANSACTIONS, &tx.id)? {
            return Err(PaymentError::internal(format!(
                "Transaction {} already exists",
                tx.id
            )));
        }
        self.put_json(CF_TRANSACTIONS, &tx.id, &tx)
    }

    async fn select_one(&self, filter: &TransactionFilter) -> Result<Option<Transaction>> {
        Ok(self.transactions_matching(filter)?.into_iter().next())
    }

    async fn select_many(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.transactions_matching(filter)
    }

    async fn update_fields(
        &self,
        filter: &TransactionFilter,
        patch: &TransactionPatch,
    ) -> Result<u64> {
        let _guard = self.writer.lock().await;
        let mut affected = 0;
        for mut tx in self.transactions_matching(filter)? {
            patch.apply_to(&mut tx);
            self.put_json(CF_TRANSACTIONS, &tx.id, &tx)?;
            affected += 1;
        }
        Ok(affected)
    }
}

#[async_trait]
impl CardStore for RocksDBStore {
    async fn insert(&self, card: Card) -> Result<()> {
        let _guard = self.writer.lock().await;
        if self.exists(CF_CARDS, &card.id)? {
            return Err(PaymentError::internal(format!(
                "Card {} already exists",
                card.id
            )));
        }
        self.put_json(CF_CARDS, &card.id, &card)
    }

    async fn select_one(&self, filter: &CardFilter) -> Result<Option<Card>> {
        Ok(self.cards_matching(filter)?.into_iter().next())
    }

    async fn select_many(&self, filter: &CardFilter) -> Result<Vec<Card>> {
        self.cards_matching(filter)
    }

    async fn update_fields(
        &self,
        filter: &CardFilter,
        details: &CreditDetails,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let _guard = self.writer.lock().await;
        let mut affected = 0;
        for mut card in self.cards_matching(filter)? {
            card.set_credit_details(details.clone(), at)?;
            self.put_json(CF_CARDS, &card.id, &card)?;
            affected += 1;
        }
        Ok(affected)
    }

    async fn soft_delete(&self, filter: &CardFilter, at: DateTime<Utc>) -> Result<u64> {
        let _guard = self.writer.lock().await;
        let mut affected = 0;
        for mut card in self.cards_matching(filter)? {
            card.deleted_at = Some(at);
            card.updated_at = at;
            self.put_json(CF_CARDS, &card.id, &card)?;
            affected += 1;
        }
        Ok(affected)
    }
}
