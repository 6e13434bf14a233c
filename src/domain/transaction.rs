use super::role::Role;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A strictly positive monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pre,
    Created,
    Confirmed,
    Aborted,
    Closed,
    Invalid,
}

impl TransactionStatus {
    /// No transition is defined out of these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Aborted | TransactionStatus::Closed | TransactionStatus::Invalid
        )
    }

    /// The party that must hear about a transaction entering this state, if any.
    pub fn audience(&self) -> Option<Role> {
        match self {
            TransactionStatus::Pre | TransactionStatus::Created => Some(Role::Client),
            TransactionStatus::Confirmed | TransactionStatus::Aborted => Some(Role::Tenant),
            TransactionStatus::Closed | TransactionStatus::Invalid => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pre => "PRE",
            TransactionStatus::Created => "CREATED",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Aborted => "ABORTED",
            TransactionStatus::Closed => "CLOSED",
            TransactionStatus::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A charge raised by a tenant against a client.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: String,
    pub client_id: String,
    pub tenant_id: String,
    pub amount: Amount,
    pub currency: String,
    pub status: TransactionStatus,
    pub card_ref: Option<String>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Opens a transaction in the `CREATED` state with a fresh id.
    pub fn new(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        amount: Amount,
        currency: &str,
        detail: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        let tenant_id = tenant_id.into();
        if tenant_id.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Tenant must not be empty".to_string(),
            ));
        }
        if client_id.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Client must not be empty".to_string(),
            ));
        }
        let currency = currency.trim();
        if currency.is_empty() {
            return Err(PaymentError::ValidationError(
                "Currency must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            client_id,
            tenant_id,
            amount,
            currency: currency.to_string(),
            status: TransactionStatus::Created,
            card_ref: None,
            detail: detail.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// The party addressed by a notification for the current status.
    pub fn counterpart(&self) -> Option<(Role, &str)> {
        self.status.audience().map(|role| match role {
            Role::Client => (role, self.client_id.as_str()),
            Role::Tenant => (role, self.tenant_id.as_str()),
        })
    }
}

/// Conjunctive equality filter over transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub id: Option<String>,
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Everything visible to `requester_id` acting as `role`.
    pub fn for_requester(requester_id: impl Into<String>, role: Role) -> Self {
        Self::default().visible_to(requester_id, role)
    }

    pub fn visible_to(mut self, requester_id: impl Into<String>, role: Role) -> Self {
        match role {
            Role::Client => self.client_id = Some(requester_id.into()),
            Role::Tenant => self.tenant_id = Some(requester_id.into()),
        }
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.id.as_ref().is_none_or(|id| *id == tx.id)
            && self.client_id.as_ref().is_none_or(|c| *c == tx.client_id)
            && self.tenant_id.as_ref().is_none_or(|t| *t == tx.tenant_id)
            && self.status.is_none_or(|s| s == tx.status)
    }
}

/// The fields an update is allowed to touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPatch {
    pub status: TransactionStatus,
    pub card_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionPatch {
    pub fn new(status: TransactionStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status,
            card_ref: None,
            updated_at,
        }
    }

    /// A `None` card leaves the stored reference untouched.
    pub fn apply_to(&self, tx: &mut Transaction) {
        tx.status = self.status;
        if let Some(card) = &self.card_ref {
            tx.card_ref = Some(card.clone());
        }
        tx.updated_at = self.updated_at;
    }
}
