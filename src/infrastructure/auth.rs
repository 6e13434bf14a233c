use crate::domain::ports::PaymentPasswordChecker;
use crate::error::Result;
use async_trait::async_trait;

/// Accepts every payment password.
///
/// There is no payment-password store behind this service yet, so confirmation
/// is not actually gated on the password. Replace before handling real funds.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllPasswords;

#[async_trait]
impl PaymentPasswordChecker for AllowAllPasswords {
    async fn check_payment_password(&self, _client_id: &str, _password: &str) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_anything() {
        let checker = AllowAllPasswords;
        assert!(checker.check_payment_password("client-1", "").await.unwrap());
        assert!(checker.check_payment_password("client-1", "wrong").await.unwrap());
    }
}
