use crate::config::CredentialSettings;
use crate::domain::credential::CredentialClaims;
use crate::domain::ports::ClockRef;
use crate::error::{CredentialError, PaymentError, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::TimeDelta;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

/// Marker every issued credential starts with.
pub const CREDENTIAL_SCHEME: &str = "paycode://";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Turns a client id into a short-lived bearer credential and back.
///
/// Credentials are `paycode://` followed by `base64(nonce || ciphertext || tag)`,
/// where the plaintext is `<subject>@@<expiry unix seconds>` sealed with
/// AES-256-GCM under a key stretched from the configured key material.
/// Decoding does not consume the credential.
#[derive(Clone)]
pub struct CredentialTokenizer {
    cipher: Aes256Gcm,
    lifetime: TimeDelta,
    clock: ClockRef,
}

impl CredentialTokenizer {
    pub fn new(key_material: &str, lifetime_minutes: u32, clock: ClockRef) -> Result<Self> {
        if key_material.is_empty() {
            return Err(PaymentError::ValidationError(
                "Credential key must not be empty".to_string(),
            ));
        }
        if lifetime_minutes == 0 {
            return Err(PaymentError::ValidationError(
                "Credential lifetime must be at least one minute".to_string(),
            ));
        }

        let key = Sha256::digest(key_material.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| PaymentError::internal(format!("AES-GCM key: {e}")))?;

        Ok(Self {
            cipher,
            lifetime: TimeDelta::minutes(i64::from(lifetime_minutes)),
            clock,
        })
    }

    pub fn from_settings(settings: &CredentialSettings, clock: ClockRef) -> Result<Self> {
        Self::new(
            settings.key.expose_secret(),
            settings.lifetime_minutes,
            clock,
        )
    }

    /// Issues a credential for `subject` valid for the configured lifetime.
    pub fn encode(&self, subject: &str) -> Result<String> {
        if subject.is_empty() {
            return Err(PaymentError::ValidationError(
                "Credential subject must not be empty".to_string(),
            ));
        }

        let claims = CredentialClaims::new(subject, self.clock.now() + self.lifetime);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, claims.to_plaintext().as_bytes())
            .map_err(|e| PaymentError::internal(format!("AES-GCM encrypt: {e}")))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(format!("{}{}", CREDENTIAL_SCHEME, STANDARD.encode(sealed)))
    }

    /// Resolves a credential back to the subject it was issued for.
    pub fn decode(&self, credential: &str) -> std::result::Result<String, CredentialError> {
        self.decode_claims(credential).map(|claims| claims.subject)
    }

    pub fn decode_claims(
        &self,
        credential: &str,
    ) -> std::result::Result<CredentialClaims, CredentialError> {
        let encoded = credential
            .strip_prefix(CREDENTIAL_SCHEME)
            .ok_or_else(|| CredentialError::Malformed("missing scheme".to_string()))?;

        let sealed = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CredentialError::Malformed(format!("base64 decode: {e}")))?;
        if sealed.len() < NONCE_LEN + TAG_LEN + 1 {
            return Err(CredentialError::Malformed("payload too short".to_string()));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::Malformed("decryption failed".to_string()))?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| CredentialError::Malformed("payload is not UTF-8".to_string()))?;

        let claims: CredentialClaims = plaintext.parse()?;
        if claims.is_expired_at(self.clock.now()) {
            return Err(CredentialError::Expired {
                expired_at: claims.expires_at,
            });
        }

        Ok(claims)
    }
}
