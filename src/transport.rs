//! Authenticated JSON transport to the storage service and wallets

use crate::crypto::{nonce, public_key_hex, signature};
use crate::types::STATUS_ERROR;
use crate::{PublisherError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use secp256k1::SecretKey;
use serde_json::Value;
use tracing::debug;

/// Protocol version header value
pub const AUTHRITE_VERSION: &str = "0.1";

pub const HEADER_AUTHRITE: &str = "X-Authrite";
pub const HEADER_IDENTITY_KEY: &str = "X-Authrite-Identity-Key";
pub const HEADER_NONCE: &str = "X-Authrite-Nonce";
pub const HEADER_SIGNATURE: &str = "X-Authrite-Signature";

/// Sends JSON requests that the receiver can attribute to the caller
#[async_trait]
pub trait AuthenticatedTransport: Send + Sync {
    /// POST `body` to `url` and return the decoded JSON response.
    ///
    /// Error responses that carry `status: "error"` are returned as `Ok` so
    /// callers can classify them.
    async fn create_signed_request(&self, url: &str, body: &Value) -> Result<Value>;
}

/// [`AuthenticatedTransport`] over HTTP, signing with the client key when present
#[derive(Clone)]
pub struct SignedHttpTransport {
    client: Client,
    signing_key: Option<SecretKey>,
}

impl std::fmt::Debug for SignedHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedHttpTransport")
            .field("signed", &self.signing_key.is_some())
            .finish()
    }
}

impl SignedHttpTransport {
    /// Create a transport; requests are unsigned when `signing_key` is `None`
    pub fn new(client: Client, signing_key: Option<SecretKey>) -> Self {
        Self {
            client,
            signing_key,
        }
    }

    /// Whether requests carry signature headers
    pub fn is_signed(&self) -> bool {
        self.signing_key.is_some()
    }
}

#[async_trait]
impl AuthenticatedTransport for SignedHttpTransport {
    async fn create_signed_request(&self, url: &str, body: &Value) -> Result<Value> {
        let payload = serde_json::to_vec(body)?;
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(key) = &self.signing_key {
            let nonce = nonce::random_bytes(32)?;
            let signature = signature::sign_request(key, &nonce, &payload)?;
            request = request
                .header(HEADER_AUTHRITE, AUTHRITE_VERSION)
                .header(HEADER_IDENTITY_KEY, public_key_hex(key))
                .header(HEADER_NONCE, general_purpose::STANDARD.encode(&nonce))
                .header(HEADER_SIGNATURE, signature);
        }

        debug!(url, signed = self.is_signed(), "Sending request");
        let response = request.body(payload).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Service errors arrive with non-2xx statuses too
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                if value.get("status").and_then(Value::as_str) == Some(STATUS_ERROR) {
                    return Ok(value);
                }
            }
            return Err(PublisherError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_KEY: &str = "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    fn key() -> SecretKey {
        SecretKey::from_slice(&hex::decode(TEST_KEY).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_signed_request_carries_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoice")
            .match_header(HEADER_AUTHRITE, AUTHRITE_VERSION)
            .match_header(HEADER_IDENTITY_KEY, public_key_hex(&key()).as_str())
            .match_header(HEADER_NONCE, mockito::Matcher::Any)
            .match_header(HEADER_SIGNATURE, mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        let transport = SignedHttpTransport::new(Client::new(), Some(key()));
        let response = transport
            .create_signed_request(&format!("{}/invoice", server.url()), &json!({"a": 1}))
            .await
            .unwrap();

        assert_eq!(response["status"], "success");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unsigned_request_has_no_signature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoice")
            .match_header(HEADER_SIGNATURE, mockito::Matcher::Missing)
            .match_body(mockito::Matcher::Json(json!({"fileSize": 10})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let transport = SignedHttpTransport::new(Client::new(), None);
        transport
            .create_signed_request(&format!("{}/invoice", server.url()), &json!({"fileSize": 10}))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_bodies() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/service-error")
            .with_status(400)
            .with_body(r#"{"status":"error","code":"ERR_X","description":"nope"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/gateway")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let transport = SignedHttpTransport::new(Client::new(), None);
        let service = transport
            .create_signed_request(&format!("{}/service-error", server.url()), &json!({}))
            .await
            .unwrap();
        assert_eq!(service["code"], "ERR_X");

        let error = transport
            .create_signed_request(&format!("{}/gateway", server.url()), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(error, PublisherError::HttpStatus { status: 502, .. }));
    }
}
