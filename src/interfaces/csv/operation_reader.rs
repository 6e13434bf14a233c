use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Register a card: `actor` owns it, `target` is the number.
    Card,
    /// Charge a client: `actor` is the tenant, `target` the client.
    Charge,
    /// Confirm a charge: `actor` is the client, `target` the card label.
    Confirm,
    Abort,
    Close,
}

/// One row of a replay script.
///
/// `ref` is a script-local label for the card or transaction the row creates or
/// acts on; the runner maps labels to generated ids.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OperationKind,
    pub actor: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// Reads replay operations from a CSV source.
///
/// Fields are trimmed and trailing optional columns may be omitted.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes operations so scripts are streamed, not loaded whole.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
