//! Wire types for the NanoStore hosting protocol

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Basket label attached to hosting payment outputs
pub const PAYMENT_BASKET: &str = "nanostore";

/// Description attached to hosting payment outputs
pub const PAYMENT_DESCRIPTION: &str = "Payment for file hosting";

/// Status reported by successful operations
pub const STATUS_SUCCESS: &str = "success";

/// Status the service uses to signal a failure
pub const STATUS_ERROR: &str = "error";

/// Body of `POST /invoice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    /// Size of the file to host, in bytes
    #[serde(rename = "fileSize")]
    pub file_size: u64,
    /// Hosting duration, in minutes
    #[serde(rename = "retentionPeriod")]
    pub retention_period: u64,
}

/// Invoice for a hosting contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Order reference to quote when paying
    #[serde(rename = "ORDER_ID", alias = "orderId")]
    pub order_id: String,
    /// Identity key of the host receiving the payment
    #[serde(rename = "identityKey", alias = "recipientPublicKey")]
    pub identity_key: String,
    /// Price in satoshis
    pub amount: u64,
    /// URL the file will be served from once uploaded
    #[serde(rename = "publicURL")]
    pub public_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Output that pays for a hosting contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutput {
    /// Locking script, hex encoded
    pub script: String,
    pub satoshis: u64,
    pub basket: String,
    pub description: String,
}

/// Everything needed to pay an invoice and later prove the payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub derivation_prefix: String,
    pub derivation_suffix: String,
    /// One-time key the output is locked to
    pub derived_public_key: String,
    pub output: PaymentOutput,
}

/// Transaction envelope produced by a wallet.
///
/// The envelope is opaque here: `rawTx` may be a legacy or Extended Format
/// transaction, and every field is passed through to the storage service
/// untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignedPayment {
    #[serde(default)]
    pub inputs: Value,
    #[serde(rename = "mapiResponses", default)]
    pub mapi_responses: Value,
    #[serde(rename = "rawTx")]
    pub raw_tx: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignedPayment {
    /// Create an envelope around a raw transaction
    pub fn new(raw_tx: impl Into<String>) -> Self {
        Self {
            inputs: Value::Object(Map::new()),
            mapi_responses: Value::Array(Vec::new()),
            raw_tx: raw_tx.into(),
            extra: Map::new(),
        }
    }

    /// Set the inputs the wallet reported
    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the merchant API responses
    pub fn with_mapi_responses(mut self, mapi_responses: Value) -> Self {
        self.mapi_responses = mapi_responses;
        self
    }
}

/// Output of the submitted transaction that pays the invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidOutput {
    pub vout: u32,
    pub satoshis: u64,
    pub derivation_suffix: String,
}

/// Transaction part of the `POST /pay` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayTransaction {
    #[serde(flatten)]
    pub payment: SignedPayment,
    pub outputs: Vec<PaidOutput>,
}

/// Body of `POST /pay`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRequest {
    #[serde(rename = "derivationPrefix")]
    pub derivation_prefix: String,
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub transaction: PayTransaction,
}

impl PayRequest {
    /// Build a pay request for a single paid output
    pub fn new(
        order_id: impl Into<String>,
        mut payment: SignedPayment,
        vout: u32,
        satoshis: u64,
        derivation_prefix: impl Into<String>,
        derivation_suffix: impl Into<String>,
    ) -> Self {
        // The service reads the paid outputs from our own list only.
        payment.extra.remove("outputs");

        Self {
            derivation_prefix: derivation_prefix.into(),
            order_id: order_id.into(),
            transaction: PayTransaction {
                payment,
                outputs: vec![PaidOutput {
                    vout,
                    satoshis,
                    derivation_suffix: derivation_suffix.into(),
                }],
            },
        }
    }
}

/// Upload credentials returned after a successful payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    #[serde(rename = "publicURL")]
    pub public_url: String,
    #[serde(default)]
    pub status: String,
}

/// Outcome of a completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub published: bool,
    #[serde(rename = "publicURL")]
    pub public_url: String,
    /// UHRP URL of the uploaded content
    pub hash: String,
    pub status: String,
}

impl UploadResult {
    /// A successful upload result
    pub fn success(public_url: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            published: true,
            public_url: public_url.into(),
            hash: hash.into(),
            status: STATUS_SUCCESS.to_string(),
        }
    }
}

/// Transfer progress reported while uploading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes handed to the transport so far
    pub loaded: u64,
    /// Total bytes to send
    pub total: u64,
}

impl UploadProgress {
    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f64 / self.total as f64
        }
    }
}

/// Type alias for upload progress callbacks
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Error shape the service and wallets use: `{status: "error", description, code}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl ServiceFailure {
    /// Extract the failure from a response body, if it reports one
    pub fn from_response(value: &Value) -> Option<Self> {
        if value.get("status").and_then(Value::as_str) != Some(STATUS_ERROR) {
            return None;
        }

        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            code: field("code"),
            description: field("description"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoice_accepts_both_field_spellings() {
        let upper: Invoice = serde_json::from_value(json!({
            "ORDER_ID": "order-1",
            "identityKey": "02abc",
            "amount": 1000,
            "publicURL": "https://cdn.example.com/file",
            "status": "success"
        }))
        .unwrap();
        let camel: Invoice = serde_json::from_value(json!({
            "orderId": "order-1",
            "recipientPublicKey": "02abc",
            "amount": 1000,
            "publicURL": "https://cdn.example.com/file",
            "status": "success"
        }))
        .unwrap();

        assert_eq!(upper, camel);
        assert_eq!(upper.order_id, "order-1");
        assert_eq!(upper.identity_key, "02abc");
    }

    #[test]
    fn test_invoice_rejects_fractional_and_negative_amounts() {
        for amount in [json!(-1), json!(1.5)] {
            let result: std::result::Result<Invoice, _> = serde_json::from_value(json!({
                "ORDER_ID": "order-1",
                "identityKey": "02abc",
                "amount": amount,
                "publicURL": "https://cdn.example.com/file"
            }));
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_pay_request_shape() {
        let mut payment = SignedPayment::new("0100")
            .with_inputs(json!({"abcd": {"rawTx": "00"}}))
            .with_mapi_responses(json!([{"payload": "p", "signature": "s", "publicKey": "k"}]));
        payment.extra.insert("txid".to_string(), json!("abcd"));
        payment.extra.insert("outputs".to_string(), json!([{"vout": 9}]));

        let request = PayRequest::new("order-1", payment, 0, 1000, "prefix==", "suffix==");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "derivationPrefix": "prefix==",
                "orderID": "order-1",
                "transaction": {
                    "inputs": {"abcd": {"rawTx": "00"}},
                    "mapiResponses": [{"payload": "p", "signature": "s", "publicKey": "k"}],
                    "rawTx": "0100",
                    "txid": "abcd",
                    "outputs": [{"vout": 0, "satoshis": 1000, "derivationSuffix": "suffix=="}]
                }
            })
        );
    }

    #[test]
    fn test_service_failure_detection() {
        let failure = ServiceFailure::from_response(&json!({
            "status": "error",
            "code": "ERR_BAD",
            "description": "Bad things"
        }))
        .unwrap();
        assert_eq!(failure.code.as_deref(), Some("ERR_BAD"));
        assert_eq!(failure.description.as_deref(), Some("Bad things"));

        assert!(ServiceFailure::from_response(&json!({"status": "success"})).is_none());
        assert!(ServiceFailure::from_response(&json!("plain")).is_none());
    }

    #[test]
    fn test_progress_fraction() {
        let progress = UploadProgress { loaded: 256, total: 1024 };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
        assert_eq!(UploadProgress { loaded: 0, total: 0 }.fraction(), 1.0);
    }
}
