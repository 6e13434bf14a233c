use crate::error::Result;
use config::{Config, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Development-only key. Override with `PAYCODE__CREDENTIAL__KEY` anywhere real.
pub const DEFAULT_CREDENTIAL_KEY: &str = "paycode-development-key";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub credential: CredentialSettings,
    pub notification: NotificationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialSettings {
    /// Minutes a freshly issued credential stays valid.
    pub lifetime_minutes: u32,
    pub key: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub wait_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl NotificationSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl Settings {
    /// Layers defaults, an optional config file and `PAYCODE__*` environment variables.
    ///
    /// Without an explicit path, `paycode.toml` in the working directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("credential.lifetime_minutes", 5)?
            .set_default("credential.key", DEFAULT_CREDENTIAL_KEY)?
            .set_default("notification.wait_timeout_secs", 30)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("paycode").required(false)),
        };

        let config = builder
            .add_source(Environment::with_prefix("PAYCODE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential: CredentialSettings {
                lifetime_minutes: 5,
                key: Secret::new(DEFAULT_CREDENTIAL_KEY.to_string()),
            },
            notification: NotificationSettings {
                wait_timeout_secs: 30,
            },
            log: LogSettings {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}
