//! Paying for hosting contracts
//!
//! [`NanoStoreClient::pay`] derives the payment output, has the wallet build
//! the transaction and submits it. [`NanoStoreClient::submit_payment`] covers
//! callers that build the transaction themselves from
//! [`NanoStoreClient::derive_payment_info`].

use crate::client::NanoStoreClient;
use crate::crypto::{nonce, script};
use crate::types::{
    PayRequest, PaymentInfo, PaymentOutput, PaymentResult, ServiceFailure, SignedPayment,
    PAYMENT_BASKET, PAYMENT_DESCRIPTION,
};
use crate::wallet::{PaymentAction, DEFAULT_ACTION_DESCRIPTION};
use crate::{PublisherError, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Code reported when the service rejects a payment without one
pub const DEFAULT_PAYMENT_ERROR_CODE: &str = "ERR_PAYMENT_FAILED";

/// Description reported when the service rejects a payment without one
pub const DEFAULT_PAYMENT_ERROR_DESCRIPTION: &str = "Payment failed due to an unknown error.";

/// Parameters of [`NanoStoreClient::pay`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayParams {
    /// Order reference from the invoice
    pub order_id: String,
    /// Identity key of the host
    pub recipient_public_key: String,
    /// Satoshis to pay
    pub amount: u64,
    /// Description handed to the wallet
    pub description: Option<String>,
}

impl PayParams {
    pub fn new(
        order_id: impl Into<String>,
        recipient_public_key: impl Into<String>,
        amount: u64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            recipient_public_key: recipient_public_key.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Parameters of [`NanoStoreClient::submit_payment`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPaymentParams {
    pub order_id: String,
    pub amount: u64,
    /// Transaction envelope containing the payment output
    pub payment: Option<SignedPayment>,
    /// Index of the payment output in the transaction
    pub vout: u32,
    pub derivation_prefix: String,
    pub derivation_suffix: String,
}

impl NanoStoreClient {
    /// Derive a fresh output paying `amount` satoshis to `recipient_public_key`.
    ///
    /// Every call draws new derivation nonces, so the output script differs
    /// between calls with the same arguments.
    pub async fn derive_payment_info(
        &self,
        recipient_public_key: &str,
        amount: u64,
    ) -> Result<PaymentInfo> {
        if recipient_public_key.trim().is_empty() {
            return Err(PublisherError::InvalidRecipientKey);
        }
        if amount == 0 {
            return Err(PublisherError::InvalidAmount);
        }

        let derivation_prefix = nonce::derivation_nonce()?;
        let derivation_suffix = nonce::derivation_nonce()?;

        let derived_public_key = self
            .wallet
            .derive_payment_key(recipient_public_key, &derivation_prefix, &derivation_suffix)
            .await
            .map_err(|e| match e {
                PublisherError::DerivePublicKeyFailed { .. } => e,
                other => PublisherError::derive_public_key_failed(other.to_string()),
            })?;

        let script = script::p2pkh_script_hex(&derived_public_key)?;
        debug!(amount, "Derived payment output");

        Ok(PaymentInfo {
            derivation_prefix,
            derivation_suffix,
            derived_public_key,
            output: PaymentOutput {
                script,
                satoshis: amount,
                basket: PAYMENT_BASKET.to_string(),
                description: PAYMENT_DESCRIPTION.to_string(),
            },
        })
    }

    /// Pay an invoice with the configured wallet and collect upload credentials
    pub async fn pay(&self, params: PayParams) -> Result<PaymentResult> {
        if params.amount == 0 {
            return Err(PublisherError::InvalidAmount);
        }
        if params.order_id.trim().is_empty() {
            return Err(PublisherError::InvalidOrderId);
        }
        if params.recipient_public_key.trim().is_empty() {
            return Err(PublisherError::InvalidRecipientKey);
        }

        let info = self
            .derive_payment_info(&params.recipient_public_key, params.amount)
            .await
            .map_err(PublisherError::derive_payment_info_failed)?;

        let action = PaymentAction::single(
            info.output.clone(),
            params
                .description
                .as_deref()
                .unwrap_or(DEFAULT_ACTION_DESCRIPTION),
        );
        let payment = self.wallet.create_payment(&action).await.map_err(|e| match e {
            PublisherError::CreatePaymentFailed { .. } => e,
            other => PublisherError::create_payment_failed_with(other),
        })?;
        debug!(order_id = %params.order_id, "Payment transaction created");

        let request = PayRequest::new(
            params.order_id,
            payment,
            0,
            params.amount,
            info.derivation_prefix,
            info.derivation_suffix,
        );
        self.notify_payment(&request).await
    }

    /// Submit a payment transaction the caller built around an output from
    /// [`derive_payment_info`](Self::derive_payment_info).
    pub async fn submit_payment(&self, params: SubmitPaymentParams) -> Result<PaymentResult> {
        if params.amount == 0 {
            return Err(PublisherError::InvalidAmount);
        }
        if params.order_id.trim().is_empty() {
            return Err(PublisherError::InvalidOrderId);
        }
        let payment = params
            .payment
            .ok_or_else(|| PublisherError::invalid_payment("Payment envelope is required"))?;
        if payment.raw_tx.trim().is_empty() {
            return Err(PublisherError::invalid_payment("rawTx is empty"));
        }
        if params.derivation_prefix.trim().is_empty() {
            return Err(PublisherError::InvalidDerivationPrefix);
        }
        if params.derivation_suffix.trim().is_empty() {
            return Err(PublisherError::InvalidDerivationSuffix);
        }

        let request = PayRequest::new(
            params.order_id,
            payment,
            params.vout,
            params.amount,
            params.derivation_prefix,
            params.derivation_suffix,
        );
        self.notify_payment(&request).await
    }

    async fn notify_payment(&self, request: &PayRequest) -> Result<PaymentResult> {
        let body = serde_json::to_value(request)?;
        let response = self
            .transport
            .create_signed_request(&self.service_url("/pay"), &body)
            .await
            .map_err(PublisherError::pay_request_failed)?;

        let result = parse_payment_result(response)?;
        info!(order_id = %request.order_id, "Payment accepted");
        Ok(result)
    }
}

fn parse_payment_result(response: Value) -> Result<PaymentResult> {
    if let Some(failure) = ServiceFailure::from_response(&response) {
        return Err(PublisherError::SubmitPaymentFailed {
            code: failure
                .code
                .unwrap_or_else(|| DEFAULT_PAYMENT_ERROR_CODE.to_string()),
            description: failure
                .description
                .unwrap_or_else(|| DEFAULT_PAYMENT_ERROR_DESCRIPTION.to_string()),
        });
    }

    serde_json::from_value(response).map_err(|e| PublisherError::pay_request_failed(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payment_result() {
        let result = parse_payment_result(json!({
            "uploadURL": "https://upload.example.com/abc",
            "publicURL": "https://cdn.example.com/abc",
            "status": "success"
        }))
        .unwrap();
        assert_eq!(result.upload_url, "https://upload.example.com/abc");
    }

    #[test]
    fn test_parse_payment_error_defaults() {
        let error = parse_payment_result(json!({"status": "error"})).unwrap_err();
        assert_eq!(error.code(), "ERR_SUBMIT_PAYMENT");
        assert_eq!(error.service_code(), Some(DEFAULT_PAYMENT_ERROR_CODE));
        assert!(error.to_string().contains(DEFAULT_PAYMENT_ERROR_DESCRIPTION));
    }

    #[test]
    fn test_parse_payment_missing_fields() {
        let error = parse_payment_result(json!({"status": "success"})).unwrap_err();
        assert_eq!(error.code(), "ERR_PAY_REQUEST");
    }
}
