//! Publisher configuration

use crate::{PublisherError, Result};
use secp256k1::SecretKey;
use std::time::Duration;
use url::Url;

/// Default NanoStore service URL
pub const DEFAULT_NANOSTORE_URL: &str = "https://nanostore.babbage.systems";

/// Default transaction backend used when paying with a private key
pub const DEFAULT_DOJO_URL: &str = "https://dojo.babbage.systems";

/// Default local wallet endpoint used when no private key is configured
pub const DEFAULT_WALLET_URL: &str = "http://localhost:3301";

/// Environment variable holding the NanoStore URL
pub const ENV_NANOSTORE_URL: &str = "NANOSTORE_URL";
/// Environment variable holding the client private key (hex)
pub const ENV_CLIENT_PRIVATE_KEY: &str = "NANOSTORE_CLIENT_PRIVATE_KEY";
/// Environment variable holding the wallet backend URL
pub const ENV_WALLET_URL: &str = "NANOSTORE_WALLET_URL";

/// Configuration shared by every publisher operation.
///
/// A `Config` never changes after construction: the `with_*` methods consume
/// the value and return a new one.
#[derive(Clone)]
pub struct Config {
    nanostore_url: String,
    client_private_key: Option<SecretKey>,
    wallet_url: Option<String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("nanostore_url", &self.nanostore_url)
            .field(
                "client_private_key",
                &self.client_private_key.map(|_| "<redacted>"),
            )
            .field("wallet_url", &self.wallet_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Create a config for the given NanoStore URL
    pub fn new(nanostore_url: &str) -> Result<Self> {
        Ok(Self {
            nanostore_url: parse_service_url(nanostore_url, "NanoStore URL")?,
            client_private_key: None,
            wallet_url: None,
            timeout: None,
        })
    }

    /// Build a config from `NANOSTORE_URL`, `NANOSTORE_CLIENT_PRIVATE_KEY`
    /// and `NANOSTORE_WALLET_URL`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_NANOSTORE_URL)
            .unwrap_or_else(|_| DEFAULT_NANOSTORE_URL.to_string());
        let mut config = Self::new(&url)?;

        if let Ok(key) = std::env::var(ENV_CLIENT_PRIVATE_KEY) {
            config = config.with_client_private_key(&key)?;
        }
        if let Ok(wallet_url) = std::env::var(ENV_WALLET_URL) {
            config = config.with_wallet_url(&wallet_url)?;
        }

        Ok(config)
    }

    /// Use a private key for request signing and direct payments
    pub fn with_client_private_key(mut self, private_key_hex: &str) -> Result<Self> {
        let trimmed = private_key_hex.trim().trim_start_matches("0x");
        if trimmed.len() != 64 {
            return Err(PublisherError::invalid_config(
                "Client private key must be 64 hex characters",
            ));
        }
        let bytes = hex::decode(trimmed)
            .map_err(|_| PublisherError::invalid_config("Invalid hex in client private key"))?;
        let key = SecretKey::from_slice(&bytes)
            .map_err(|_| PublisherError::invalid_config("Client private key is out of range"))?;

        self.client_private_key = Some(key);
        Ok(self)
    }

    /// Set the wallet backend URL (a dojo with a private key, a local wallet otherwise)
    pub fn with_wallet_url(mut self, wallet_url: &str) -> Result<Self> {
        self.wallet_url = Some(parse_service_url(wallet_url, "wallet URL")?);
        Ok(self)
    }

    /// Set a request timeout. No timeout is applied unless one is set here.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        parse_service_url(&self.nanostore_url, "NanoStore URL")?;
        if let Some(wallet_url) = &self.wallet_url {
            parse_service_url(wallet_url, "wallet URL")?;
        }
        Ok(())
    }

    /// NanoStore URL without a trailing slash
    pub fn nanostore_url(&self) -> &str {
        &self.nanostore_url
    }

    /// The configured client key, if any
    pub fn client_private_key(&self) -> Option<&SecretKey> {
        self.client_private_key.as_ref()
    }

    /// Whether payments are made with a locally held key
    pub fn has_client_private_key(&self) -> bool {
        self.client_private_key.is_some()
    }

    /// Wallet backend URL, falling back to the default for the payment path
    pub fn wallet_url(&self) -> &str {
        match &self.wallet_url {
            Some(url) => url,
            None if self.has_client_private_key() => DEFAULT_DOJO_URL,
            None => DEFAULT_WALLET_URL,
        }
    }

    /// Request timeout, if one was configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nanostore_url: DEFAULT_NANOSTORE_URL.to_string(),
            client_private_key: None,
            wallet_url: None,
            timeout: None,
        }
    }
}

/// Check that `value` is an http(s) URL with a host and return it without
/// a trailing slash.
fn parse_service_url(value: &str, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(PublisherError::invalid_config(format!("{} cannot be empty", what)));
    }

    let url = Url::parse(value.trim())
        .map_err(|e| PublisherError::invalid_config(format!("Invalid {}: {}", what, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(PublisherError::invalid_config(format!(
            "{} must start with http:// or https://",
            what
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(PublisherError::invalid_config(format!("{} has no host", what)));
    }

    Ok(value.trim().trim_end_matches('/').to_string())
}
