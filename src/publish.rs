//! One-call publishing: invoice, pay, upload

use crate::client::NanoStoreClient;
use crate::file::FileHandle;
use crate::payment::PayParams;
use crate::types::{ProgressFn, UploadResult, STATUS_SUCCESS};
use crate::upload::UploadParams;
use crate::{PublisherError, Result};
use std::sync::Arc;
use tracing::info;

/// Description handed to the wallet for publish payments
pub const PUBLISH_PAYMENT_DESCRIPTION: &str = "Upload with NanoStore UI";

/// Parameters of [`NanoStoreClient::publish_file`]
#[derive(Clone, Default)]
pub struct PublishRequest {
    pub file: Option<Arc<dyn FileHandle>>,
    /// Hosting duration in minutes
    pub retention_period: Option<u64>,
    pub progress: Option<ProgressFn>,
}

impl std::fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishRequest")
            .field("file", &self.file.as_ref().map(|file| file.name().to_string()))
            .field("retention_period", &self.retention_period)
            .field("progress", &self.progress.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl PublishRequest {
    pub fn new(file: Arc<dyn FileHandle>, retention_period: u64) -> Self {
        Self {
            file: Some(file),
            retention_period: Some(retention_period),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl NanoStoreClient {
    /// Host a file: get an invoice, pay it and upload the bytes.
    ///
    /// A missing or empty file and a missing retention period are reported
    /// as is. Every other failure is wrapped with the file name.
    pub async fn publish_file(&self, request: PublishRequest) -> Result<UploadResult> {
        let file = match request.file {
            Some(file) if file.size() > 0 => file,
            _ => return Err(PublisherError::FileRequired),
        };
        let retention_period = match request.retention_period {
            Some(minutes) if minutes > 0 => minutes,
            _ => return Err(PublisherError::RetentionPeriodRequired),
        };

        let mut result = self
            .run_publish(file.clone(), retention_period, request.progress)
            .await
            .map_err(|e| PublisherError::publish_failed(file.name(), e))?;

        result.status = STATUS_SUCCESS.to_string();
        info!(file = file.name(), hash = %result.hash, "File published");
        Ok(result)
    }

    async fn run_publish(
        &self,
        file: Arc<dyn FileHandle>,
        retention_period: u64,
        progress: Option<ProgressFn>,
    ) -> Result<UploadResult> {
        let invoice = self.invoice(file.size(), retention_period).await?;

        let payment = self
            .pay(
                PayParams::new(&invoice.order_id, &invoice.identity_key, invoice.amount)
                    .with_description(PUBLISH_PAYMENT_DESCRIPTION),
            )
            .await?;

        let mut params = UploadParams::new(payment.upload_url, invoice.public_url, file)
            .with_server_url(self.config.nanostore_url());
        params.on_progress = progress;

        self.upload(params).await
    }
}
