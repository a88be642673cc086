//! Error types for the NanoStore publisher

use thiserror::Error;

/// Result type alias for publisher operations
pub type Result<T> = std::result::Result<T, PublisherError>;

/// Broad classification of a [`PublisherError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller input rejected before any network call
    InvalidInput,
    /// The storage service or wallet answered with an error status
    RemoteService,
    /// Network, HTTP or decoding failure
    Transport,
    /// The file representation cannot be read
    UnsupportedFileType,
    /// Randomness, key or script failure
    Crypto,
    /// Anything else
    Internal,
}

/// Main error type for publisher operations
#[derive(Error, Debug)]
pub enum PublisherError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status without a service error body
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Base64 decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decoding error
    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// HTTP client or collaborator could not be constructed
    #[error("Failed to initialize client: {message}")]
    ClientInitialization { message: String },

    #[error("Invalid file size")]
    InvalidFileSize,

    #[error("Invalid retention period")]
    InvalidRetentionPeriod,

    #[error("Invalid amount. Must be a positive integer.")]
    InvalidAmount,

    #[error("Invalid order ID. Must be a non-empty string.")]
    InvalidOrderId,

    #[error("Invalid recipient public key")]
    InvalidRecipientKey,

    /// The payment envelope is missing or has no raw transaction
    #[error("Invalid payment: {message}")]
    InvalidPayment { message: String },

    #[error("Invalid derivation prefix. Must be a non-empty string.")]
    InvalidDerivationPrefix,

    #[error("Invalid derivation suffix. Must be a non-empty string.")]
    InvalidDerivationSuffix,

    /// The invoice request did not reach the service or its answer was unreadable
    #[error("Failed to retrieve invoice: {source}")]
    InvoiceRequestFailed {
        #[source]
        source: Box<PublisherError>,
    },

    /// The invoice response is not a usable invoice
    #[error("Invalid invoice response format: {message}")]
    InvoiceResponseFormat { message: String },

    /// The storage service refused to issue an invoice
    #[error("{description}")]
    InvoiceServiceError { code: String, description: String },

    /// The operating system randomness source failed
    #[error("Cryptographic failure: {message}")]
    CryptoFailure { message: String },

    #[error("Failed to derive public key: {message}")]
    DerivePublicKeyFailed { message: String },

    #[error("Failed to create output script: {message}")]
    CreateScriptFailed { message: String },

    #[error("Failed to derive payment info: {source}")]
    DerivePaymentInfoFailed {
        #[source]
        source: Box<PublisherError>,
    },

    /// The wallet could not build the payment transaction
    #[error("Failed to create payment: {message}")]
    CreatePaymentFailed {
        message: String,
        #[source]
        source: Option<Box<PublisherError>>,
    },

    /// The pay request did not reach the service or its answer was unreadable
    #[error("Failed to complete pay request: {source}")]
    PayRequestFailed {
        #[source]
        source: Box<PublisherError>,
    },

    /// The storage service rejected the submitted payment
    #[error("Failed to submit payment: {description}")]
    SubmitPaymentFailed { code: String, description: String },

    #[error("Missing required parameters: {message}")]
    MissingRequiredParameters { message: String },

    #[error("Unsupported file type: {message}")]
    UnsupportedFileType { message: String },

    #[error("File upload failed: {source}")]
    UploadFailed {
        #[source]
        source: Box<PublisherError>,
    },

    #[error("File is required for upload.")]
    FileRequired,

    #[error("Retention period must be specified.")]
    RetentionPeriodRequired,

    /// A publish stage failed; `message` is the original error text
    #[error("Failed to publish file {file_name}: {message}")]
    PublishFileFailed {
        file_name: String,
        message: String,
        #[source]
        source: Box<PublisherError>,
    },

    /// Unexpected error
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl PublisherError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "ERR_JSON",
            Self::Http(_) => "ERR_HTTP",
            Self::HttpStatus { .. } => "ERR_HTTP_STATUS",
            Self::Base64(_) => "ERR_BASE64",
            Self::Hex(_) => "ERR_HEX",
            Self::Io(_) => "ERR_IO",
            Self::InvalidConfig { .. } => "ERR_INVALID_CONFIG",
            Self::ClientInitialization { .. } => "ERR_CLIENT_INITIALIZATION",
            Self::InvalidFileSize => "ERR_INVALID_FILE_SIZE",
            Self::InvalidRetentionPeriod => "ERR_INVALID_RETENTION_PERIOD",
            Self::InvalidAmount => "ERR_INVALID_AMOUNT",
            Self::InvalidOrderId => "ERR_INVALID_ORDER_ID",
            Self::InvalidRecipientKey => "ERR_INVALID_PUBLIC_KEY",
            Self::InvalidPayment { .. } => "ERR_INVALID_PAYMENT",
            Self::InvalidDerivationPrefix => "ERR_INVALID_DERIVATION_PREFIX",
            Self::InvalidDerivationSuffix => "ERR_INVALID_DERIVATION_SUFFIX",
            Self::InvoiceRequestFailed { .. } => "ERR_INVOICE_REQUEST",
            Self::InvoiceResponseFormat { .. } => "ERR_INVOICE_RESPONSE_FORMAT",
            Self::InvoiceServiceError { .. } => "ERR_INVOICE_ERROR",
            Self::CryptoFailure { .. } => "ERR_CRYPTO",
            Self::DerivePublicKeyFailed { .. } => "ERR_DERIVE_PUBLIC_KEY",
            Self::CreateScriptFailed { .. } => "ERR_CREATE_SCRIPT",
            Self::DerivePaymentInfoFailed { .. } => "ERR_DERIVE_PAYMENT_INFO",
            Self::CreatePaymentFailed { .. } => "ERR_CREATE_PAYMENT",
            Self::PayRequestFailed { .. } => "ERR_PAY_REQUEST",
            Self::SubmitPaymentFailed { .. } => "ERR_SUBMIT_PAYMENT",
            Self::MissingRequiredParameters { .. } => "ERR_MISSING_PARAMETERS",
            Self::UnsupportedFileType { .. } => "ERR_INVALID_FILE_TYPE",
            Self::UploadFailed { .. } => "ERR_UPLOAD_FAILED",
            Self::FileRequired => "ERR_UI_FILE_MISSING",
            Self::RetentionPeriodRequired => "ERR_UI_HOST_DURATION_MISSING",
            Self::PublishFileFailed { .. } => "ERR_PUBLISH_FILE_FAILED",
            Self::Unexpected { .. } => "ERR_UNEXPECTED",
        }
    }

    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidFileSize
            | Self::InvalidRetentionPeriod
            | Self::InvalidAmount
            | Self::InvalidOrderId
            | Self::InvalidRecipientKey
            | Self::InvalidPayment { .. }
            | Self::InvalidDerivationPrefix
            | Self::InvalidDerivationSuffix
            | Self::MissingRequiredParameters { .. }
            | Self::FileRequired
            | Self::RetentionPeriodRequired => ErrorCategory::InvalidInput,
            Self::InvoiceServiceError { .. }
            | Self::SubmitPaymentFailed { .. }
            | Self::CreatePaymentFailed { .. } => ErrorCategory::RemoteService,
            Self::Json(_)
            | Self::Http(_)
            | Self::HttpStatus { .. }
            | Self::Io(_)
            | Self::InvoiceRequestFailed { .. }
            | Self::InvoiceResponseFormat { .. }
            | Self::PayRequestFailed { .. }
            | Self::UploadFailed { .. } => ErrorCategory::Transport,
            Self::UnsupportedFileType { .. } => ErrorCategory::UnsupportedFileType,
            Self::Base64(_)
            | Self::Hex(_)
            | Self::CryptoFailure { .. }
            | Self::DerivePublicKeyFailed { .. }
            | Self::CreateScriptFailed { .. }
            | Self::DerivePaymentInfoFailed { .. } => ErrorCategory::Crypto,
            Self::ClientInitialization { .. }
            | Self::PublishFileFailed { .. }
            | Self::Unexpected { .. } => ErrorCategory::Internal,
        }
    }

    /// Code supplied by the remote service, if it supplied one.
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::InvoiceServiceError { code, .. } | Self::SubmitPaymentFailed { code, .. } => {
                Some(code)
            }
            _ => None,
        }
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a client initialization error
    pub fn client_initialization(message: impl Into<String>) -> Self {
        Self::ClientInitialization {
            message: message.into(),
        }
    }

    /// Create an invalid payment error
    pub fn invalid_payment(message: impl Into<String>) -> Self {
        Self::InvalidPayment {
            message: message.into(),
        }
    }

    /// Wrap a transport failure of the invoice request
    pub fn invoice_request_failed(source: PublisherError) -> Self {
        Self::InvoiceRequestFailed {
            source: Box::new(source),
        }
    }

    /// Create an invoice response format error
    pub fn invoice_response_format(message: impl Into<String>) -> Self {
        Self::InvoiceResponseFormat {
            message: message.into(),
        }
    }

    /// Create a crypto failure
    pub fn crypto_failure(message: impl Into<String>) -> Self {
        Self::CryptoFailure {
            message: message.into(),
        }
    }

    /// Create a public key derivation error
    pub fn derive_public_key_failed(message: impl Into<String>) -> Self {
        Self::DerivePublicKeyFailed {
            message: message.into(),
        }
    }

    /// Create a script construction error
    pub fn create_script_failed(message: impl Into<String>) -> Self {
        Self::CreateScriptFailed {
            message: message.into(),
        }
    }

    /// Wrap a payment info derivation failure
    pub fn derive_payment_info_failed(source: PublisherError) -> Self {
        Self::DerivePaymentInfoFailed {
            source: Box::new(source),
        }
    }

    /// Create a payment creation error reported by the wallet
    pub fn create_payment_failed(message: impl Into<String>) -> Self {
        Self::CreatePaymentFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a failure raised while the wallet built the payment
    pub fn create_payment_failed_with(source: PublisherError) -> Self {
        Self::CreatePaymentFailed {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap a transport failure of the pay request
    pub fn pay_request_failed(source: PublisherError) -> Self {
        Self::PayRequestFailed {
            source: Box::new(source),
        }
    }

    /// Create a missing parameters error
    pub fn missing_parameters(message: impl Into<String>) -> Self {
        Self::MissingRequiredParameters {
            message: message.into(),
        }
    }

    /// Create an unsupported file type error
    pub fn unsupported_file_type(message: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            message: message.into(),
        }
    }

    /// Wrap a failure of either upload branch
    pub fn upload_failed(source: PublisherError) -> Self {
        Self::UploadFailed {
            source: Box::new(source),
        }
    }

    /// Wrap a publish stage failure with the file name
    pub fn publish_failed(file_name: impl Into<String>, source: PublisherError) -> Self {
        Self::PublishFileFailed {
            file_name: file_name.into(),
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}
