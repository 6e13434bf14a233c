use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One output line: a transaction with its ids replaced by whatever the caller
/// wants to show (script labels during replay, stored ids otherwise).
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TransactionRow {
    pub transaction: String,
    pub client: String,
    pub tenant: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub card: Option<String>,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction: tx.id.clone(),
            client: tx.client_id.clone(),
            tenant: tx.tenant_id.clone(),
            amount: tx.amount.value().normalize(),
            currency: tx.currency.clone(),
            status: tx.status,
            card: tx.card_ref.clone(),
        }
    }
}

pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header and every row, then flushes.
    pub fn write_rows(&mut self, rows: impl IntoIterator<Item = TransactionRow>) -> Result<()> {
        let mut wrote_any = false;
        for row in rows {
            self.writer.serialize(row)?;
            wrote_any = true;
        }
        if !wrote_any {
            self.writer.write_record([
                "transaction",
                "client",
                "tenant",
                "amount",
                "currency",
                "status",
                "card",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
