//! Wallets that derive payment keys and build payment transactions
//!
//! [`KeyWallet`] derives payment keys locally with the client key, but the
//! dojo backend it talks to selects inputs, builds and signs the payment
//! transaction; the key only authenticates that request. [`RemoteWallet`] delegates both operations to a wallet service
//! that holds the keys itself.

use crate::crypto::{derivation, parse_public_key, public_key_hex};
use crate::transport::AuthenticatedTransport;
use crate::types::{PaymentOutput, ServiceFailure, SignedPayment};
use crate::{PublisherError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Label attached to hosting payment actions
pub const PAYMENT_LABEL: &str = "nanostore";

/// Topic attached to hosting payment actions
pub const PAYMENT_TOPIC: &str = "UHRP";

/// Default description of a hosting payment
pub const DEFAULT_ACTION_DESCRIPTION: &str = "Payment for file hosting";

/// Transaction a wallet is asked to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAction {
    pub outputs: Vec<PaymentOutput>,
    pub description: String,
}

impl PaymentAction {
    /// Action paying a single output
    pub fn single(output: PaymentOutput, description: impl Into<String>) -> Self {
        Self {
            outputs: vec![output],
            description: description.into(),
        }
    }
}

/// Source of payment keys and signed payment transactions
#[async_trait]
pub trait PaymentWallet: Send + Sync {
    /// One-time public key (compressed hex) for paying `counterparty`
    async fn derive_payment_key(
        &self,
        counterparty: &str,
        derivation_prefix: &str,
        derivation_suffix: &str,
    ) -> Result<String>;

    /// Obtain a signed transaction paying the action's outputs
    async fn create_payment(&self, action: &PaymentAction) -> Result<SignedPayment>;
}

/// Wallet holding the client private key.
///
/// Key derivation is local. Payment transactions are built and signed by the
/// dojo backend; the key signs only the `X-Authrite` request headers.
#[derive(Clone)]
pub struct KeyWallet {
    key: SecretKey,
    dojo_url: String,
    transport: Arc<dyn AuthenticatedTransport>,
}

impl std::fmt::Debug for KeyWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyWallet")
            .field("identity_key", &public_key_hex(&self.key))
            .field("dojo_url", &self.dojo_url)
            .finish()
    }
}

impl KeyWallet {
    /// Create a wallet; transactions are requested from `dojo_url` through `transport`
    pub fn new(
        key: SecretKey,
        dojo_url: impl Into<String>,
        transport: Arc<dyn AuthenticatedTransport>,
    ) -> Self {
        Self {
            key,
            dojo_url: dojo_url.into(),
            transport,
        }
    }

    /// Identity public key of this wallet, compressed hex
    pub fn identity_key(&self) -> String {
        public_key_hex(&self.key)
    }
}

#[async_trait]
impl PaymentWallet for KeyWallet {
    async fn derive_payment_key(
        &self,
        counterparty: &str,
        derivation_prefix: &str,
        derivation_suffix: &str,
    ) -> Result<String> {
        let recipient = parse_public_key(counterparty)?;
        let invoice = derivation::invoice_number(derivation_prefix, derivation_suffix);
        let derived = derivation::derive_child_public_key(&self.key, &recipient, &invoice)?;
        Ok(hex::encode(derived.serialize()))
    }

    /// Ask the dojo to fund, build and sign a transaction with the outputs
    async fn create_payment(&self, action: &PaymentAction) -> Result<SignedPayment> {
        let url = format!("{}/getTransactionWithOutputs", self.dojo_url);
        let body = json!({
            "outputs": action.outputs,
            "note": action.description,
        });

        debug!(url = %url, outputs = action.outputs.len(), "Requesting payment transaction");
        let response = self
            .transport
            .create_signed_request(&url, &body)
            .await
            .map_err(PublisherError::create_payment_failed_with)?;

        signed_payment_from_response(response)
    }
}

/// Wallet service reached over HTTP
#[derive(Debug, Clone)]
pub struct RemoteWallet {
    client: Client,
    url: String,
}

impl RemoteWallet {
    /// Create a client for the wallet at `url`
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Base URL of the wallet service
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.url, path))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) if status.is_success() => Ok(value),
            Ok(value) if ServiceFailure::from_response(&value).is_some() => Ok(value),
            // Some wallets answer with a bare key
            Err(_) if status.is_success() => Ok(Value::String(text.trim().to_string())),
            _ => Err(PublisherError::HttpStatus {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}

#[async_trait]
impl PaymentWallet for RemoteWallet {
    async fn derive_payment_key(
        &self,
        counterparty: &str,
        derivation_prefix: &str,
        derivation_suffix: &str,
    ) -> Result<String> {
        let body = json!({
            "protocolID": [derivation::PAYMENT_SECURITY_LEVEL, derivation::PAYMENT_PROTOCOL_ID],
            "keyID": derivation::key_id(derivation_prefix, derivation_suffix),
            "counterparty": counterparty,
        });

        let response = self
            .post("/v1/getPublicKey", &body)
            .await
            .map_err(|e| PublisherError::derive_public_key_failed(e.to_string()))?;

        if let Some(failure) = ServiceFailure::from_response(&response) {
            return Err(PublisherError::derive_public_key_failed(
                failure
                    .description
                    .unwrap_or_else(|| "Wallet refused to derive a key".to_string()),
            ));
        }

        let key = match &response {
            Value::String(key) => key.as_str(),
            other => other
                .get("publicKey")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    PublisherError::derive_public_key_failed("Wallet response has no publicKey")
                })?,
        };
        // Reject garbage before it reaches the script builder
        parse_public_key(key)?;
        Ok(key.to_string())
    }

    async fn create_payment(&self, action: &PaymentAction) -> Result<SignedPayment> {
        let body = json!({
            "outputs": action.outputs,
            "description": action.description,
            "labels": [PAYMENT_LABEL],
            "topics": [PAYMENT_TOPIC],
        });

        debug!(wallet = %self.url, outputs = action.outputs.len(), "Creating payment action");
        let response = self
            .post("/v1/createAction", &body)
            .await
            .map_err(PublisherError::create_payment_failed_with)?;

        signed_payment_from_response(response)
    }
}

fn signed_payment_from_response(response: Value) -> Result<SignedPayment> {
    if let Some(failure) = ServiceFailure::from_response(&response) {
        let description = failure
            .description
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(PublisherError::create_payment_failed(match failure.code {
            Some(code) => format!("{} ({})", description, code),
            None => description,
        }));
    }

    let payment: SignedPayment = serde_json::from_value(response)
        .map_err(|e| PublisherError::create_payment_failed_with(e.into()))?;
    if payment.raw_tx.trim().is_empty() {
        return Err(PublisherError::create_payment_failed(
            "Wallet returned an empty transaction",
        ));
    }
    Ok(payment)
}
