//! Uploading paid-for files

use crate::client::NanoStoreClient;
use crate::file::{read_file_bytes, unsupported, FileHandle, DEFAULT_MIME_TYPE};
use crate::types::{ProgressFn, UploadProgress, UploadResult};
use crate::{PublisherError, Result};
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::{debug, info};

/// Servers under this prefix take uploads directly, without payment credentials
pub const LOCAL_SERVER_PREFIX: &str = "http://localhost";

/// Size of the chunks progress is reported for
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Parameters of [`NanoStoreClient::upload`]
#[derive(Clone)]
pub struct UploadParams {
    /// Pre-authorized URL the bytes are PUT to
    pub upload_url: String,
    /// URL the file is served from afterwards
    pub public_url: String,
    pub file: Arc<dyn FileHandle>,
    /// Storage server; the configured NanoStore URL when `None`
    pub server_url: Option<String>,
    pub on_progress: Option<ProgressFn>,
}

impl std::fmt::Debug for UploadParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadParams")
            .field("upload_url", &self.upload_url)
            .field("public_url", &self.public_url)
            .field("file", &self.file.name())
            .field("server_url", &self.server_url)
            .finish()
    }
}

impl UploadParams {
    pub fn new(
        upload_url: impl Into<String>,
        public_url: impl Into<String>,
        file: Arc<dyn FileHandle>,
    ) -> Self {
        Self {
            upload_url: upload_url.into(),
            public_url: public_url.into(),
            file,
            server_url: None,
            on_progress: None,
        }
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}

/// Whether `server_url` is a local development server
pub fn is_local_server(server_url: &str) -> bool {
    server_url.starts_with(LOCAL_SERVER_PREFIX)
}

impl NanoStoreClient {
    /// Upload a file and compute its UHRP locator.
    ///
    /// Against a production server the transfer and the hashing run
    /// concurrently; if either fails the whole upload fails.
    pub async fn upload(&self, params: UploadParams) -> Result<UploadResult> {
        let server_url = params
            .server_url
            .clone()
            .unwrap_or_else(|| self.config.nanostore_url().to_string());
        let server_url = server_url.trim_end_matches('/').to_string();

        if is_local_server(&server_url) {
            debug!(server = %server_url, "Uploading to local server");
            return self.upload_local(&server_url, params.file.as_ref()).await;
        }

        if params.upload_url.trim().is_empty() || params.public_url.trim().is_empty() {
            return Err(PublisherError::missing_parameters(
                "uploadURL and publicURL are required",
            ));
        }
        let file = params.file.as_ref();
        if !file.has_buffer_access() && !file.has_stream_access() {
            return Err(unsupported(file));
        }

        let data = read_file_bytes(file)
            .await
            .map_err(PublisherError::upload_failed)?;
        let content_type = file.mime_type().unwrap_or(DEFAULT_MIME_TYPE).to_string();
        debug!(size = data.len(), content_type = %content_type, "Uploading file");

        let (_, hash) = tokio::try_join!(
            async {
                self.transfer(
                    &params.upload_url,
                    data.clone(),
                    &content_type,
                    params.on_progress.clone(),
                )
                .await
                .map_err(PublisherError::upload_failed)
            },
            async {
                self.hash(data.clone())
                    .await
                    .map_err(PublisherError::upload_failed)
            }
        )?;

        info!(hash = %hash, public_url = %params.public_url, "File uploaded");
        Ok(UploadResult::success(params.public_url, hash))
    }

    async fn transfer(
        &self,
        upload_url: &str,
        data: Bytes,
        content_type: &str,
        on_progress: Option<ProgressFn>,
    ) -> Result<()> {
        let total = data.len() as u64;
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
            .collect();

        let mut loaded = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            loaded += chunk.len() as u64;
            if let Some(callback) = &on_progress {
                callback(UploadProgress { loaded, total });
            }
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let response = self
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublisherError::HttpStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn hash(&self, data: Bytes) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.locator(&data))
            .await
            .map_err(|e| PublisherError::unexpected(format!("Hashing task failed: {}", e)))?
    }

    async fn upload_local(&self, server_url: &str, file: &dyn FileHandle) -> Result<UploadResult> {
        if !file.has_buffer_access() && !file.has_stream_access() {
            return Err(unsupported(file));
        }

        let locator = self
            .post_local(server_url, file)
            .await
            .map_err(PublisherError::upload_failed)?;

        info!(hash = %locator, "File uploaded to local server");
        Ok(UploadResult::success(
            format!("{}/data/{}", server_url, locator),
            locator,
        ))
    }

    async fn post_local(&self, server_url: &str, file: &dyn FileHandle) -> Result<String> {
        let data = read_file_bytes(file).await?;
        let part = Part::bytes(data.to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime_type().unwrap_or(DEFAULT_MIME_TYPE))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/pay", server_url))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(PublisherError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        // The body is the locator, either bare or as a JSON string
        let locator = match serde_json::from_str::<String>(&text) {
            Ok(locator) => locator,
            Err(_) => text.trim().to_string(),
        };
        if locator.is_empty() {
            return Err(PublisherError::unexpected(
                "Local server returned an empty locator",
            ));
        }
        Ok(locator)
    }
}
