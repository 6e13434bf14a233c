use super::role::Role;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment network a card number belongs to.
///
/// Derived from digit length and numeric prefix only. No checksum is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    DinersClub,
    AmericanExpress,
    Jcb,
    Visa,
    MasterCard,
    UnionPay,
    /// Any 14 to 19 digit number that no branded rule claims.
    Debit,
}

impl NetworkType {
    /// Classifies a raw card number, returning `None` when it is invalid.
    ///
    /// Surrounding whitespace and interior spaces are ignored. Length buckets are
    /// evaluated in a fixed order and each bucket only consults its own prefixes.
    pub fn classify(raw: &str) -> Option<Self> {
        let number = normalize_card_number(raw);
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let len = number.len();
        // Every branded bucket is at least 14 digits long, so six digits exist.
        let prefix = || -> u32 { number[..6].parse().unwrap_or_default() };

        match len {
            14 => {
                let p = prefix();
                if matches!(p, 300000..=305999 | 309500..=309599 | 360000..=369999 | 380000..=389999)
                {
                    return Some(NetworkType::DinersClub);
                }
            }
            15 => {
                if matches!(prefix(), 340000..=349999 | 370000..=379999) {
                    return Some(NetworkType::AmericanExpress);
                }
            }
            16 => {
                let p = prefix();
                if (352800..=358999).contains(&p) {
                    return Some(NetworkType::Jcb);
                }
                if number.starts_with('4') {
                    return Some(NetworkType::Visa);
                }
                if (510000..=559999).contains(&p) {
                    return Some(NetworkType::MasterCard);
                }
                if (622126..=622925).contains(&p) {
                    return Some(NetworkType::UnionPay);
                }
            }
            _ => {}
        }

        if len > 13 && len < 20 {
            Some(NetworkType::Debit)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::DinersClub => "diners_club",
            NetworkType::AmericanExpress => "american_express",
            NetworkType::Jcb => "jcb",
            NetworkType::Visa => "visa",
            NetworkType::MasterCard => "master_card",
            NetworkType::UnionPay => "union_pay",
            NetworkType::Debit => "debit",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trims the input and removes interior spaces.
pub fn normalize_card_number(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ' ').collect()
}

/// Credit-only fields that may be attached to a branded card once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditDetails {
    pub holder: String,
    pub expiration: String,
    pub cvv: String,
}

/// A stored payment instrument owned by a client or a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub owner_id: String,
    pub owner_role: Role,
    pub number: String,
    pub network: NetworkType,
    pub holder: Option<String>,
    pub expiration: Option<String>,
    pub cvv: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Builds a new card, deriving its network from the number.
    pub fn new(
        owner_id: impl Into<String>,
        owner_role: Role,
        raw_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let owner_id = owner_id.into();
        if owner_id.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Card owner must not be empty".to_string(),
            ));
        }

        let number = normalize_card_number(raw_number);
        let network = NetworkType::classify(&number).ok_or_else(|| {
            PaymentError::ValidationError("Invalid card number".to_string())
        })?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            owner_role,
            number,
            network,
            holder: None,
            expiration: None,
            cvv: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn has_credit_details(&self) -> bool {
        self.holder.is_some() || self.expiration.is_some() || self.cvv.is_some()
    }

    /// Attaches holder, expiration and CVV. Allowed once, and never on debit cards.
    pub fn set_credit_details(&mut self, details: CreditDetails, now: DateTime<Utc>) -> Result<()> {
        if self.network == NetworkType::Debit {
            return Err(PaymentError::ValidationError(
                "Debit cards do not carry credit details".to_string(),
            ));
        }
        if self.has_credit_details() {
            return Err(PaymentError::ValidationError(
                "Credit details are already set".to_string(),
            ));
        }

        self.holder = Some(details.holder);
        self.expiration = Some(details.expiration);
        self.cvv = Some(details.cvv);
        self.updated_at = now;
        Ok(())
    }
}

/// Conjunctive equality filter over cards. Soft-deleted cards never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub owner_role: Option<Role>,
}

impl CardFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_owner(owner_id: impl Into<String>, owner_role: Role) -> Self {
        Self::default().owned_by(owner_id, owner_role)
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>, owner_role: Role) -> Self {
        self.owner_id = Some(owner_id.into());
        self.owner_role = Some(owner_role);
        self
    }

    pub fn matches(&self, card: &Card) -> bool {
        !card.is_deleted()
            && self.id.as_ref().is_none_or(|id| *id == card.id)
            && self.owner_id.as_ref().is_none_or(|owner| *owner == card.owner_id)
            && self.owner_role.is_none_or(|role| role == card.owner_role)
    }
}
