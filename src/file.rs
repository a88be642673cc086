//! Files that can be published
//!
//! A [`FileHandle`] exposes its bytes either as an in-memory buffer or
//! through a [`ByteReader`]. Uploads prefer the buffer.

use crate::{PublisherError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Fallback content type for uploads
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Asynchronous access to the full contents of a file
#[async_trait]
pub trait ByteReader: Send + Sync {
    async fn read_all(&self) -> Result<Bytes>;
}

/// A file to publish
pub trait FileHandle: Send + Sync {
    /// Display name, used in error messages
    fn name(&self) -> &str;

    /// Size in bytes
    fn size(&self) -> u64;

    /// MIME type, if known
    fn mime_type(&self) -> Option<&str> {
        None
    }

    /// Contents, when they are held in memory
    fn data_as_buffer(&self) -> Option<Bytes> {
        None
    }

    /// Reader for the contents, when they live elsewhere
    fn byte_reader(&self) -> Option<&dyn ByteReader> {
        None
    }

    fn has_buffer_access(&self) -> bool {
        self.data_as_buffer().is_some()
    }

    fn has_stream_access(&self) -> bool {
        self.byte_reader().is_some()
    }
}

/// Load the contents of `file`, preferring its buffer.
///
/// Fails with `UnsupportedFileType` when the file offers neither access mode.
pub async fn read_file_bytes(file: &dyn FileHandle) -> Result<Bytes> {
    if let Some(data) = file.data_as_buffer() {
        return Ok(data);
    }
    match file.byte_reader() {
        Some(reader) => reader.read_all().await,
        None => Err(unsupported(file)),
    }
}

/// Error for a file that exposes no way to read it
pub(crate) fn unsupported(file: &dyn FileHandle) -> PublisherError {
    PublisherError::unsupported_file_type(format!(
        "{} exposes neither a buffer nor a byte stream",
        file.name()
    ))
}

/// File held in memory
#[derive(Debug, Clone)]
pub struct BufferFile {
    name: String,
    mime_type: Option<String>,
    data: Bytes,
}

impl BufferFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl FileHandle for BufferFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn data_as_buffer(&self) -> Option<Bytes> {
        Some(self.data.clone())
    }
}

/// File on disk, read when the upload starts
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: Option<String>,
}

impl DiskFile {
    /// Stat `path` and guess its MIME type from the extension
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(PublisherError::unsupported_file_type(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_from_extension)
            .map(str::to_string);

        Ok(Self {
            path,
            name,
            size: metadata.len(),
            mime_type,
        })
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteReader for DiskFile {
    async fn read_all(&self) -> Result<Bytes> {
        Ok(Bytes::from(tokio::fs::read(&self.path).await?))
    }
}

impl FileHandle for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn byte_reader(&self) -> Option<&dyn ByteReader> {
        Some(self)
    }
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}
