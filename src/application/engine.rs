use crate::application::credential::CredentialTokenizer;
use crate::application::notifier::{Notification, Notifier};
use crate::domain::card::CardFilter;
use crate::domain::ports::{CardStoreRef, ClockRef, PasswordCheckerBox, TransactionStoreBox};
use crate::domain::role::Role;
use crate::domain::transaction::{
    Amount, Transaction, TransactionFilter, TransactionPatch, TransactionStatus,
};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A tenant's request to charge whoever presented `credential`.
#[derive(Debug, Clone)]
pub struct NewCharge {
    pub tenant_id: String,
    pub credential: String,
    pub amount: Decimal,
    pub currency: String,
    pub detail: String,
}

/// Statuses a client may ask for explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Confirmed,
    Aborted,
}

impl From<TargetStatus> for TransactionStatus {
    fn from(target: TargetStatus) -> Self {
        match target {
            TargetStatus::Confirmed => TransactionStatus::Confirmed,
            TargetStatus::Aborted => TransactionStatus::Aborted,
        }
    }
}

/// A client's request to move one of their transactions.
///
/// With no `target` the transaction is closed.
#[derive(Debug, Clone, Default)]
pub struct StatusChange {
    pub transaction_id: String,
    pub client_id: String,
    pub target: Option<TargetStatus>,
    pub card_id: Option<String>,
    pub payment_password: Option<String>,
}

/// A committed state change and what happened to its event.
#[derive(Debug)]
pub struct Transition {
    pub transaction: Transaction,
    pub notification: Notification,
}

impl Transition {
    /// The publish error, when the transition went through but its event did not.
    pub fn notify_error(&self) -> Option<&PaymentError> {
        match &self.notification {
            Notification::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// The transaction state machine.
///
/// `PaymentEngine` resolves payer credentials, enforces the transition rules,
/// persists each change through the transaction store, and then publishes the
/// new snapshot to the counterpart. Validation and authorization run before any
/// write, so a rejected request leaves the store untouched.
///
/// There is no optimistic concurrency control: two concurrent updates of the
/// same transaction race and the later write wins.
pub struct PaymentEngine {
    transactions: TransactionStoreBox,
    cards: CardStoreRef,
    passwords: PasswordCheckerBox,
    tokenizer: CredentialTokenizer,
    notifier: Notifier,
    clock: ClockRef,
}

impl PaymentEngine {
    pub fn new(
        transactions: TransactionStoreBox,
        cards: CardStoreRef,
        passwords: PasswordCheckerBox,
        tokenizer: CredentialTokenizer,
        notifier: Notifier,
        clock: ClockRef,
    ) -> Self {
        Self {
            transactions,
            cards,
            passwords,
            tokenizer,
            notifier,
            clock,
        }
    }

    pub fn tokenizer(&self) -> &CredentialTokenizer {
        &self.tokenizer
    }

    /// Opens a `CREATED` transaction against the client behind the credential
    /// and tells that client about it.
    pub async fn create(&self, charge: NewCharge) -> Result<Transition> {
        let client_id = self.tokenizer.decode(&charge.credential).map_err(|err| {
            warn!(tenant = %charge.tenant_id, error = %err, "Rejected payment credential");
            PaymentError::from(err)
        })?;

        let amount = Amount::new(charge.amount)?;
        let tx = Transaction::new(
            client_id,
            charge.tenant_id,
            amount,
            &charge.currency,
            charge.detail,
            self.clock.now(),
        )?;

        self.transactions.insert(tx.clone()).await?;
        info!(
            transaction = %tx.id,
            client = %tx.client_id,
            tenant = %tx.tenant_id,
            amount = %tx.amount.value(),
            currency = %tx.currency,
            "Transaction created"
        );

        let notification = self.notifier.publish(&tx).await;
        Ok(Transition {
            transaction: tx,
            notification,
        })
    }

    /// Applies a client's confirm, abort, or close to one of their transactions.
    ///
    /// Confirming requires the payment password to check out and a live card
    /// owned by the same client. The returned snapshot is the row as this call
    /// wrote it.
    pub async fn update(&self, change: StatusChange) -> Result<Transition> {
        let status = change
            .target
            .map(TransactionStatus::from)
            .unwrap_or(TransactionStatus::Closed);
        let filter = TransactionFilter::by_id(&change.transaction_id)
            .visible_to(&change.client_id, Role::Client);

        let mut tx = self.transactions.select_one(&filter).await?.ok_or_else(|| {
            PaymentError::NotFoundError(format!("Transaction {}", change.transaction_id))
        })?;
        if tx.status.is_terminal() || tx.status == status {
            return Err(PaymentError::ValidationError(format!(
                "Transaction {} is already {}",
                tx.id, tx.status
            )));
        }

        let mut patch = TransactionPatch::new(status, self.clock.now());
        if status == TransactionStatus::Confirmed {
            patch.card_ref = Some(self.authorize_confirmation(&change).await?);
        }

        let affected = self.transactions.update_fields(&filter, &patch).await?;
        if affected == 0 {
            return Err(PaymentError::NotFoundError(format!(
                "Transaction {}",
                change.transaction_id
            )));
        }
        let previous = tx.status;
        patch.apply_to(&mut tx);
        info!(
            transaction = %tx.id,
            from = %previous,
            to = %tx.status,
            "Transaction updated"
        );

        let notification = self.notifier.publish(&tx).await;
        Ok(Transition {
            transaction: tx,
            notification,
        })
    }

    async fn authorize_confirmation(&self, change: &StatusChange) -> Result<String> {
        let password = change.payment_password.as_deref().unwrap_or_default();
        if !self
            .passwords
            .check_payment_password(&change.client_id, password)
            .await?
        {
            warn!(
                transaction = %change.transaction_id,
                client = %change.client_id,
                "Payment password rejected"
            );
            return Err(PaymentError::AuthorizationError(
                "Payment password rejected".to_string(),
            ));
        }

        let Some(card_id) = change.card_id.as_deref() else {
            return Err(PaymentError::AuthorizationError(
                "A card is required to confirm".to_string(),
            ));
        };
        let owned = CardFilter::by_id(card_id).owned_by(&change.client_id, Role::Client);
        if self.cards.select_one(&owned).await?.is_none() {
            warn!(
                transaction = %change.transaction_id,
                client = %change.client_id,
                card = %card_id,
                "Card is not owned by the confirming client"
            );
            return Err(PaymentError::AuthorizationError(format!(
                "Card {} does not belong to client {}",
                card_id, change.client_id
            )));
        }
        Ok(card_id.to_string())
    }

    pub async fn get(&self, transaction_id: &str, requester_id: &str, role: Role) -> Result<Transaction> {
        let filter = TransactionFilter::by_id(transaction_id).visible_to(requester_id, role);
        self.transactions
            .select_one(&filter)
            .await?
            .ok_or_else(|| PaymentError::NotFoundError(format!("Transaction {}", transaction_id)))
    }

    pub async fn list(&self, requester_id: &str, role: Role) -> Result<Vec<Transaction>> {
        self.transactions
            .select_many(&TransactionFilter::for_requester(requester_id, role))
            .await
    }

    /// Long-polls for the next snapshot addressed to `subscriber_id`.
    pub async fn wait(
        &self,
        subscriber_id: &str,
        role: Role,
        cancel: &CancellationToken,
    ) -> Result<Transaction> {
        self.notifier.wait(subscriber_id, role, cancel).await
    }
}
