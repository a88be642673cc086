//! # nanostore-publisher - pay-to-host file publishing
//!
//! Client for NanoStore file hosting. A publish asks the storage service
//! for an invoice, pays it with a one-time derived output, then uploads the
//! file while computing its UHRP locator.
//!
//! ```no_run
//! use nanostore_publisher::{BufferFile, Config, NanoStoreClient, PublishRequest};
//! use std::sync::Arc;
//!
//! # async fn run() -> nanostore_publisher::Result<()> {
//! let client = NanoStoreClient::new(Config::from_env()?)?;
//! let file = Arc::new(BufferFile::new("hello.txt", b"hello".to_vec()));
//! let result = client.publish_file(PublishRequest::new(file, 60)).await?;
//! println!("{} -> {}", result.hash, result.public_url);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod file;
pub mod invoice;
pub mod locator;
pub mod payment;
pub mod publish;
pub mod transport;
pub mod types;
pub mod upload;
pub mod wallet;

// Re-exports for convenience
pub use client::{NanoStoreClient, NanoStoreClientBuilder};
pub use config::Config;
pub use error::{ErrorCategory, PublisherError, Result};
pub use file::{BufferFile, ByteReader, DiskFile, FileHandle};
pub use locator::{ContentHasher, UhrpHasher};
pub use payment::{PayParams, SubmitPaymentParams};
pub use publish::PublishRequest;
pub use transport::{AuthenticatedTransport, SignedHttpTransport};
pub use types::*;
pub use upload::UploadParams;
pub use wallet::{KeyWallet, PaymentAction, PaymentWallet, RemoteWallet};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
