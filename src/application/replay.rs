use crate::application::cards::CardService;
use crate::application::engine::{NewCharge, PaymentEngine, StatusChange, TargetStatus};
use crate::domain::role::Role;
use crate::error::{PaymentError, Result};
use crate::interfaces::csv::operation_reader::{Operation, OperationKind};
use crate::interfaces::csv::transaction_writer::TransactionRow;
use std::collections::HashMap;
use tracing::warn;

struct ScriptedCharge {
    label: String,
    id: String,
    tenant: String,
}

/// Drives the card service and the payment engine from script operations.
///
/// Scripts name cards and transactions by labels; the runner keeps the mapping
/// to generated ids and issues a fresh credential for every charge, standing in
/// for the payer's device.
pub struct ScriptRunner {
    engine: PaymentEngine,
    cards: CardService,
    card_ids: HashMap<String, String>,
    charges: Vec<ScriptedCharge>,
}

impl ScriptRunner {
    pub fn new(engine: PaymentEngine, cards: CardService) -> Self {
        Self {
            engine,
            cards,
            card_ids: HashMap::new(),
            charges: Vec::new(),
        }
    }

    pub async fn process(&mut self, op: Operation) -> Result<()> {
        match op.op {
            OperationKind::Card => {
                if self.card_ids.contains_key(&op.reference) {
                    return Err(duplicate_label(&op.reference));
                }
                let number = required(op.target.as_deref(), "target")?;
                let card = self.cards.create(&op.actor, Role::Client, number).await?;
                self.card_ids.insert(op.reference, card.id);
            }
            OperationKind::Charge => {
                if self.charges.iter().any(|c| c.label == op.reference) {
                    return Err(duplicate_label(&op.reference));
                }
                let client = required(op.target.as_deref(), "target")?;
                let amount = op
                    .amount
                    .ok_or_else(|| PaymentError::ValidationError("Missing amount".to_string()))?;
                let credential = self.engine.tokenizer().encode(client)?;

                let transition = self
                    .engine
                    .create(NewCharge {
                        tenant_id: op.actor.clone(),
                        credential,
                        amount,
                        currency: op.currency.unwrap_or_default(),
                        detail: String::new(),
                    })
                    .await?;
                if let Some(err) = transition.notify_error() {
                    warn!(label = %op.reference, error = %err, "Charge created without notification");
                }
                self.charges.push(ScriptedCharge {
                    label: op.reference,
                    id: transition.transaction.id,
                    tenant: op.actor,
                });
            }
            OperationKind::Confirm | OperationKind::Abort | OperationKind::Close => {
                let transaction_id = self.transaction_id(&op.reference)?.to_string();
                let target = match op.op {
                    OperationKind::Confirm => Some(TargetStatus::Confirmed),
                    OperationKind::Abort => Some(TargetStatus::Aborted),
                    _ => None,
                };
                // Unknown card labels pass through as ids and fail the ownership check.
                let card_id = op.target.as_deref().map(|label| {
                    self.card_ids
                        .get(label)
                        .cloned()
                        .unwrap_or_else(|| label.to_string())
                });

                let transition = self
                    .engine
                    .update(StatusChange {
                        transaction_id,
                        client_id: op.actor,
                        target,
                        card_id,
                        payment_password: None,
                    })
                    .await?;
                if let Some(err) = transition.notify_error() {
                    warn!(label = %op.reference, error = %err, "Transition applied without notification");
                }
            }
        }
        Ok(())
    }

    /// Final state of every scripted charge, in script order, with ids shown as labels.
    pub async fn into_results(self) -> Result<Vec<TransactionRow>> {
        let card_labels: HashMap<&str, &str> = self
            .card_ids
            .iter()
            .map(|(label, id)| (id.as_str(), label.as_str()))
            .collect();

        let mut rows = Vec::with_capacity(self.charges.len());
        for charge in &self.charges {
            let tx = self.engine.get(&charge.id, &charge.tenant, Role::Tenant).await?;
            let mut row = TransactionRow::from(&tx);
            row.transaction = charge.label.clone();
            row.card = tx
                .card_ref
                .as_deref()
                .map(|id| card_labels.get(id).copied().unwrap_or(id).to_string());
            rows.push(row);
        }
        Ok(rows)
    }

    fn transaction_id(&self, label: &str) -> Result<&str> {
        self.charges
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.id.as_str())
            .ok_or_else(|| PaymentError::NotFoundError(format!("Transaction label '{}'", label)))
    }
}

fn required<'a>(value: Option<&'a str>, column: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PaymentError::ValidationError(format!("Missing {}", column)))
}

fn duplicate_label(label: &str) -> PaymentError {
    PaymentError::ValidationError(format!("Label '{}' is already in use", label))
}
