use crate::error::CredentialError;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static CLAIMS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.+)@@(\d+)$").expect("claims pattern is a valid regex")
});

/// What a credential asserts once decrypted: who presented it and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

impl CredentialClaims {
    pub fn new(subject: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            expires_at,
        }
    }

    /// `<subject>@@<unix seconds>`
    pub fn to_plaintext(&self) -> String {
        format!("{}@@{}", self.subject, self.expires_at.timestamp())
    }

    /// A credential is usable strictly before its expiry second.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at.timestamp()
    }
}

impl FromStr for CredentialClaims {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = CLAIMS_PATTERN
            .captures(s)
            .ok_or_else(|| CredentialError::Malformed("unrecognised payload".to_string()))?;

        let subject = captures[1].to_string();
        let seconds: i64 = captures[2]
            .parse()
            .map_err(|_| CredentialError::Malformed("expiry out of range".to_string()))?;
        let expires_at = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| CredentialError::Malformed("expiry out of range".to_string()))?;

        Ok(Self {
            subject,
            expires_at,
        })
    }
}
