use nanostore_publisher::{Config, DiskFile, NanoStoreClient, PublishRequest, UploadProgress};
use std::env;
use std::sync::Arc;

/// Usage: publish_file <path> [retention-minutes]
///
/// Reads NANOSTORE_URL, NANOSTORE_CLIENT_PRIVATE_KEY and NANOSTORE_WALLET_URL
/// from the environment.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: publish_file <path> [retention-minutes]")?;
    let retention_period: u64 = match args.next() {
        Some(minutes) => minutes.parse()?,
        None => 60,
    };

    let config = Config::from_env()?;
    println!("Publishing to {}", config.nanostore_url());

    let client = NanoStoreClient::new(config)?;
    let file = Arc::new(DiskFile::open(&path).await?);

    let on_progress = Arc::new(|progress: UploadProgress| {
        println!("Uploaded {:.0}%", progress.fraction() * 100.0);
    });
    let request = PublishRequest::new(file, retention_period).with_progress(on_progress);

    let result = client.publish_file(request).await?;

    println!("UHRP URL:   {}", result.hash);
    println!("Public URL: {}", result.public_url);

    Ok(())
}
