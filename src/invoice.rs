//! Hosting invoices

use crate::client::NanoStoreClient;
use crate::types::{Invoice, InvoiceRequest, ServiceFailure};
use crate::{PublisherError, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Code reported when the service flags an error without one
pub const DEFAULT_INVOICE_ERROR_CODE: &str = "ERR_INVOICE_ERROR";

/// Description reported when the service flags an error without one
pub const DEFAULT_INVOICE_ERROR_DESCRIPTION: &str = "Unknown error in invoice response";

impl NanoStoreClient {
    /// Ask the storage service for an invoice to host `file_size` bytes for
    /// `retention_period` minutes.
    pub async fn invoice(&self, file_size: u64, retention_period: u64) -> Result<Invoice> {
        if file_size == 0 {
            return Err(PublisherError::InvalidFileSize);
        }
        if retention_period == 0 {
            return Err(PublisherError::InvalidRetentionPeriod);
        }

        let request = InvoiceRequest {
            file_size,
            retention_period,
        };
        debug!(file_size, retention_period, "Requesting invoice");

        let response = self
            .transport
            .create_signed_request(&self.service_url("/invoice"), &serde_json::to_value(&request)?)
            .await
            .map_err(PublisherError::invoice_request_failed)?;

        let invoice = parse_invoice(response)?;
        info!(
            order_id = %invoice.order_id,
            amount = invoice.amount,
            "Invoice received"
        );
        Ok(invoice)
    }
}

fn parse_invoice(response: Value) -> Result<Invoice> {
    if !response.is_object() {
        return Err(PublisherError::invoice_response_format(
            "Invoice response is not an object",
        ));
    }

    if let Some(failure) = ServiceFailure::from_response(&response) {
        return Err(PublisherError::InvoiceServiceError {
            code: failure
                .code
                .unwrap_or_else(|| DEFAULT_INVOICE_ERROR_CODE.to_string()),
            description: failure
                .description
                .unwrap_or_else(|| DEFAULT_INVOICE_ERROR_DESCRIPTION.to_string()),
        });
    }

    serde_json::from_value(response)
        .map_err(|e| PublisherError::invoice_response_format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_invoice() {
        let invoice = parse_invoice(json!({
            "ORDER_ID": "order-1",
            "identityKey": "02abc",
            "amount": 500,
            "publicURL": "https://cdn.example.com/x",
            "status": "success"
        }))
        .unwrap();
        assert_eq!(invoice.amount, 500);
    }

    #[test]
    fn test_parse_invoice_error_defaults() {
        let error = parse_invoice(json!({"status": "error"})).unwrap_err();
        assert_eq!(error.service_code(), Some(DEFAULT_INVOICE_ERROR_CODE));
        assert_eq!(error.to_string(), DEFAULT_INVOICE_ERROR_DESCRIPTION);
    }

    #[test]
    fn test_parse_invoice_rejects_non_objects() {
        for value in [json!(null), json!("text"), json!([1, 2])] {
            let error = parse_invoice(value).unwrap_err();
            assert_eq!(error.code(), "ERR_INVOICE_RESPONSE_FORMAT");
        }

        let error = parse_invoice(json!({"ORDER_ID": "x"})).unwrap_err();
        assert_eq!(error.code(), "ERR_INVOICE_RESPONSE_FORMAT");
    }
}
