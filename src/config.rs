use secrecy::SecretString;

use vend_payments::{classify_secret_key, KeyMode};

/// Process configuration, read from the environment at startup.
pub struct Config {
    pub openai_api_key: SecretString,
    pub openai_model: Option<String>,
    pub stripe_secret_key: SecretString,
    pub stripe_key_mode: KeyMode,
    pub stripe_webhook_secret: SecretString,
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("STRIPE_SECRET_KEY has an unrecognized prefix")]
    UnrecognizedKeyPrefix,
    #[error("PORT is not a valid port number: {0}")]
    BadPort(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = required("OPENAI_API_KEY")?;
        let stripe_secret_key = required_raw("STRIPE_SECRET_KEY")?;
        let stripe_webhook_secret = required("STRIPE_WEBHOOK_SECRET")?;

        let stripe_key_mode =
            classify_secret_key(&stripe_secret_key).ok_or(ConfigError::UnrecognizedKeyPrefix)?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::BadPort(raw))?,
            Err(_) => 8000,
        };

        Ok(Self {
            openai_api_key,
            openai_model: std::env::var("OPENAI_MODEL").ok(),
            stripe_secret_key: SecretString::from(stripe_secret_key),
            stripe_key_mode,
            stripe_webhook_secret,
            port,
        })
    }
}

fn required_raw(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn required(name: &'static str) -> Result<SecretString, ConfigError> {
    required_raw(name).map(SecretString::from)
}
