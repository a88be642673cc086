//! NanoStore publisher client

use crate::config::Config;
use crate::locator::{ContentHasher, UhrpHasher};
use crate::transport::{AuthenticatedTransport, SignedHttpTransport};
use crate::wallet::{KeyWallet, PaymentWallet, RemoteWallet};
use crate::{PublisherError, Result};
use reqwest::Client;
use std::sync::Arc;

/// Client for invoicing, paying for and uploading hosted files.
///
/// Cloning is cheap; clones share the HTTP connection pool and collaborators.
#[derive(Clone)]
pub struct NanoStoreClient {
    pub(crate) config: Config,
    pub(crate) http: Client,
    pub(crate) transport: Arc<dyn AuthenticatedTransport>,
    pub(crate) wallet: Arc<dyn PaymentWallet>,
    pub(crate) hasher: Arc<dyn ContentHasher>,
}

impl std::fmt::Debug for NanoStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NanoStoreClient")
            .field("config", &self.config)
            .field("transport", &"<transport>")
            .field("wallet", &"<wallet>")
            .field("hasher", &"<hasher>")
            .finish()
    }
}

impl NanoStoreClient {
    /// Create a client with the default collaborators for `config`
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a client with custom collaborators
    pub fn builder(config: Config) -> NanoStoreClientBuilder {
        NanoStoreClientBuilder::new(config)
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// URL of a storage service endpoint
    pub(crate) fn service_url(&self, path: &str) -> String {
        format!("{}{}", self.config.nanostore_url(), path)
    }
}

/// Builder for [`NanoStoreClient`]
pub struct NanoStoreClientBuilder {
    config: Config,
    http: Option<Client>,
    transport: Option<Arc<dyn AuthenticatedTransport>>,
    wallet: Option<Arc<dyn PaymentWallet>>,
    hasher: Option<Arc<dyn ContentHasher>>,
}

impl NanoStoreClientBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            transport: None,
            wallet: None,
            hasher: None,
        }
    }

    /// Use an existing HTTP client
    pub fn http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Replace the authenticated transport
    pub fn transport(mut self, transport: Arc<dyn AuthenticatedTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the payment wallet
    pub fn wallet(mut self, wallet: Arc<dyn PaymentWallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Replace the content hasher
    pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Build the client, filling in defaults from the config
    pub fn build(self) -> Result<NanoStoreClient> {
        self.config.validate()?;

        let http = match self.http {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.config.timeout() {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|e| {
                    PublisherError::client_initialization(format!(
                        "Failed to create HTTP client: {}",
                        e
                    ))
                })?
            }
        };

        let transport: Arc<dyn AuthenticatedTransport> = self.transport.unwrap_or_else(|| {
            Arc::new(SignedHttpTransport::new(
                http.clone(),
                self.config.client_private_key().copied(),
            ))
        });

        let wallet: Arc<dyn PaymentWallet> = match (self.wallet, self.config.client_private_key()) {
            (Some(wallet), _) => wallet,
            (None, Some(key)) => Arc::new(KeyWallet::new(
                *key,
                self.config.wallet_url(),
                transport.clone(),
            )),
            (None, None) => Arc::new(RemoteWallet::new(http.clone(), self.config.wallet_url())),
        };

        let hasher: Arc<dyn ContentHasher> = self.hasher.unwrap_or_else(|| Arc::new(UhrpHasher));

        Ok(NanoStoreClient {
            config: self.config,
            http,
            transport,
            wallet,
            hasher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let client = NanoStoreClient::new(Config::default()).unwrap();
        assert_eq!(
            client.service_url("/invoice"),
            "https://nanostore.babbage.systems/invoice"
        );
    }

    #[test]
    fn test_client_with_timeout_and_key() {
        let config = Config::new("https://nanostore.example.com/")
            .unwrap()
            .with_client_private_key(
                "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
            )
            .unwrap()
            .with_timeout(Duration::from_secs(5));

        let client = NanoStoreClient::new(config).unwrap();
        assert_eq!(client.service_url("/pay"), "https://nanostore.example.com/pay");
        assert!(client.config().has_client_private_key());
        assert!(!format!("{:?}", client).contains("1234567890abcdef"));
    }
}
