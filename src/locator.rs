//! UHRP content locators
//!
//! A locator is the Base58Check encoding of `ce00 || SHA256(content)`.

use crate::{PublisherError, Result};
use sha2::{Digest, Sha256};

/// Version bytes prepended to the content hash
pub const LOCATOR_PREFIX: [u8; 2] = [0xce, 0x00];

const URL_PREFIXES: [&str; 2] = ["web+uhrp://", "uhrp:"];

/// Computes the content-addressed locator of uploaded bytes
pub trait ContentHasher: Send + Sync {
    /// Locator of `data`
    fn locator(&self, data: &[u8]) -> Result<String>;
}

/// Default [`ContentHasher`] producing UHRP URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct UhrpHasher;

impl ContentHasher for UhrpHasher {
    fn locator(&self, data: &[u8]) -> Result<String> {
        let digest = Sha256::digest(data);
        locator_for_hash(&digest)
    }
}

/// Locator of an already computed SHA-256 digest
pub fn locator_for_hash(hash: &[u8]) -> Result<String> {
    if hash.len() != 32 {
        return Err(PublisherError::crypto_failure(format!(
            "Content hash must be 32 bytes, got {}",
            hash.len()
        )));
    }

    let mut payload = Vec::with_capacity(LOCATOR_PREFIX.len() + hash.len() + 4);
    payload.extend_from_slice(&LOCATOR_PREFIX);
    payload.extend_from_slice(hash);
    let checksum = checksum(&payload);
    payload.extend_from_slice(&checksum);

    Ok(bs58::encode(payload).into_string())
}

/// SHA-256 digest encoded in a locator
pub fn hash_from_locator(locator: &str) -> Result<[u8; 32]> {
    let mut trimmed = locator.trim();
    for prefix in URL_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            trimmed = rest;
            break;
        }
    }

    let bytes = bs58::decode(trimmed)
        .into_vec()
        .map_err(|e| PublisherError::crypto_failure(format!("Invalid locator encoding: {}", e)))?;
    if bytes.len() != LOCATOR_PREFIX.len() + 32 + 4 {
        return Err(PublisherError::crypto_failure("Invalid locator length"));
    }

    let (payload, check) = bytes.split_at(bytes.len() - 4);
    if checksum(payload) != check {
        return Err(PublisherError::crypto_failure("Invalid locator checksum"));
    }
    if payload[..2] != LOCATOR_PREFIX {
        return Err(PublisherError::crypto_failure("Invalid locator prefix"));
    }

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&payload[2..]);
    Ok(hash)
}

/// Whether `locator` decodes to a content hash
pub fn is_valid_locator(locator: &str) -> bool {
    hash_from_locator(locator).is_ok()
}

fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(payload));
    [digest[0], digest[1], digest[2], digest[3]]
}
