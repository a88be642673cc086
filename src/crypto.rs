//! Cryptographic utilities for NanoStore payments

use crate::{PublisherError, Result};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Parse a compressed or uncompressed public key from hex
pub fn parse_public_key(hex_key: &str) -> Result<PublicKey> {
    PublicKey::from_str(hex_key.trim())
        .map_err(|e| PublisherError::derive_public_key_failed(format!("Invalid public key: {}", e)))
}

/// Compressed public key of `secret`, hex encoded
pub fn public_key_hex(secret: &SecretKey) -> String {
    let secp = Secp256k1::new();
    hex::encode(PublicKey::from_secret_key(&secp, secret).serialize())
}

/// Random nonces drawn from the operating system
pub mod nonce {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use rand::{rngs::OsRng, RngCore};

    /// Length of derivation prefixes and suffixes, in bytes
    pub const DERIVATION_NONCE_LEN: usize = 10;

    /// Fill a buffer of `len` bytes from the OS CSPRNG.
    ///
    /// There is no fallback: if the OS source fails the caller gets
    /// `CryptoFailure`.
    pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| {
                PublisherError::crypto_failure(format!("Randomness source failed: {}", e))
            })?;
        Ok(bytes)
    }

    /// Fresh base64 derivation prefix or suffix
    pub fn derivation_nonce() -> Result<String> {
        Ok(general_purpose::STANDARD.encode(random_bytes(DERIVATION_NONCE_LEN)?))
    }
}

/// One-time payment key derivation (BRC-42 style)
pub mod derivation {
    use super::*;
    use hmac::{Hmac, Mac};
    use secp256k1::Scalar;

    type HmacSha256 = Hmac<Sha256>;

    /// Protocol identifier of hosting payments
    pub const PAYMENT_PROTOCOL_ID: &str = "3241645161d8";

    /// Security level of hosting payments
    pub const PAYMENT_SECURITY_LEVEL: u8 = 2;

    /// Invoice number binding a payment to its derivation prefix and suffix
    pub fn invoice_number(derivation_prefix: &str, derivation_suffix: &str) -> String {
        format!(
            "{}-{}-{}",
            PAYMENT_SECURITY_LEVEL,
            PAYMENT_PROTOCOL_ID,
            key_id(derivation_prefix, derivation_suffix)
        )
    }

    /// Key identifier used when asking a wallet for the same key
    pub fn key_id(derivation_prefix: &str, derivation_suffix: &str) -> String {
        format!("{} {}", derivation_prefix, derivation_suffix)
    }

    /// HMAC of the invoice number keyed by the compressed ECDH point
    fn invoice_tweak(shared_secret: &PublicKey, invoice_number: &str) -> Result<Scalar> {
        let mut mac = HmacSha256::new_from_slice(&shared_secret.serialize())
            .map_err(|e| PublisherError::derive_public_key_failed(e.to_string()))?;
        mac.update(invoice_number.as_bytes());
        let digest = mac.finalize().into_bytes();

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Scalar::from_be_bytes(bytes)
            .map_err(|_| PublisherError::derive_public_key_failed("Invoice tweak out of range"))
    }

    /// Public key the sender pays to: `recipient + HMAC(ecdh, invoice) * G`
    pub fn derive_child_public_key(
        sender: &SecretKey,
        recipient: &PublicKey,
        invoice_number: &str,
    ) -> Result<PublicKey> {
        let secp = Secp256k1::new();
        let shared_secret = recipient
            .mul_tweak(&secp, &Scalar::from(*sender))
            .map_err(|e| PublisherError::derive_public_key_failed(e.to_string()))?;
        let tweak = invoice_tweak(&shared_secret, invoice_number)?;

        recipient
            .add_exp_tweak(&secp, &tweak)
            .map_err(|e| PublisherError::derive_public_key_failed(e.to_string()))
    }

    /// Private key the recipient spends with: `recipient + HMAC(ecdh, invoice)`
    pub fn derive_child_private_key(
        recipient: &SecretKey,
        sender: &PublicKey,
        invoice_number: &str,
    ) -> Result<SecretKey> {
        let secp = Secp256k1::new();
        let shared_secret = sender
            .mul_tweak(&secp, &Scalar::from(*recipient))
            .map_err(|e| PublisherError::derive_public_key_failed(e.to_string()))?;
        let tweak = invoice_tweak(&shared_secret, invoice_number)?;

        recipient
            .add_tweak(&tweak)
            .map_err(|e| PublisherError::derive_public_key_failed(e.to_string()))
    }
}

/// Locking scripts
pub mod script {
    use super::*;
    use ripemd::Ripemd160;

    /// RIPEMD160(SHA256(data))
    pub fn hash160(data: &[u8]) -> [u8; 20] {
        let sha = Sha256::digest(data);
        let mut out = [0u8; 20];
        out.copy_from_slice(&Ripemd160::digest(sha));
        out
    }

    /// Pay-to-public-key-hash script for a hex public key, hex encoded
    pub fn p2pkh_script_hex(public_key_hex: &str) -> Result<String> {
        let key = PublicKey::from_str(public_key_hex.trim()).map_err(|e| {
            PublisherError::create_script_failed(format!("Invalid derived public key: {}", e))
        })?;

        let mut script = Vec::with_capacity(25);
        script.extend_from_slice(&[0x76, 0xa9, 0x14]); // OP_DUP OP_HASH160 PUSH20
        script.extend_from_slice(&hash160(&key.serialize()));
        script.extend_from_slice(&[0x88, 0xac]); // OP_EQUALVERIFY OP_CHECKSIG
        Ok(hex::encode(script))
    }
}

/// Request signatures
pub mod signature {
    use super::*;
    use secp256k1::{ecdsa::Signature, Message};

    fn request_digest(nonce: &[u8], body: &[u8]) -> Result<Message> {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(body);
        Message::from_digest_slice(&hasher.finalize())
            .map_err(|e| PublisherError::crypto_failure(format!("Invalid request digest: {}", e)))
    }

    /// DER signature over `SHA256(nonce || body)`, hex encoded
    pub fn sign_request(secret: &SecretKey, nonce: &[u8], body: &[u8]) -> Result<String> {
        let secp = Secp256k1::new();
        let message = request_digest(nonce, body)?;
        let signature = secp.sign_ecdsa(&message, secret);
        Ok(hex::encode(signature.serialize_der().to_vec()))
    }

    /// Check a signature produced by [`sign_request`]
    pub fn verify_request(
        identity_key: &str,
        nonce: &[u8],
        body: &[u8],
        signature_hex: &str,
    ) -> Result<bool> {
        let secp = Secp256k1::new();
        let key = parse_public_key(identity_key)?;
        let signature = Signature::from_der(&hex::decode(signature_hex)?)
            .map_err(|e| PublisherError::crypto_failure(format!("Invalid signature: {}", e)))?;
        let message = request_digest(nonce, body)?;

        Ok(secp.verify_ecdsa(&message, &signature, &key).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER_KEY: &str = "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
    const RECIPIENT_KEY: &str = "fedcba0987654321fedcba0987654321fedcba0987654321fedcba0987654321";

    fn secret(hex_key: &str) -> SecretKey {
        SecretKey::from_slice(&hex::decode(hex_key).unwrap()).unwrap()
    }

    fn public(secret: &SecretKey) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::new(), secret)
    }

    #[test]
    fn test_derivation_nonces_are_unique() {
        let first = nonce::derivation_nonce().unwrap();
        let second = nonce::derivation_nonce().unwrap();

        assert_ne!(first, second);
        // 10 bytes encode to 16 base64 characters
        assert_eq!(first.len(), 16);
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(
            derivation::invoice_number("abc=", "def="),
            "2-3241645161d8-abc= def="
        );
    }

    #[test]
    fn test_sender_and_recipient_derive_matching_keys() {
        let sender = secret(SENDER_KEY);
        let recipient = secret(RECIPIENT_KEY);
        let invoice = derivation::invoice_number("prefix", "suffix");

        let child_public =
            derivation::derive_child_public_key(&sender, &public(&recipient), &invoice).unwrap();
        let child_private =
            derivation::derive_child_private_key(&recipient, &public(&sender), &invoice).unwrap();

        assert_eq!(public(&child_private), child_public);
        assert_ne!(child_public, public(&recipient));
    }

    #[test]
    fn test_distinct_invoices_give_distinct_keys() {
        let sender = secret(SENDER_KEY);
        let recipient = public(&secret(RECIPIENT_KEY));

        let first = derivation::derive_child_public_key(
            &sender,
            &recipient,
            &derivation::invoice_number("a", "b"),
        )
        .unwrap();
        let second = derivation::derive_child_public_key(
            &sender,
            &recipient,
            &derivation::invoice_number("a", "c"),
        )
        .unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_p2pkh_script_for_generator_point() {
        // hash160 of the compressed generator point
        let script = script::p2pkh_script_hex(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        )
        .unwrap();

        assert_eq!(
            script,
            "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac"
        );
    }

    #[test]
    fn test_p2pkh_script_rejects_garbage() {
        let error = script::p2pkh_script_hex("not-a-key").unwrap_err();
        assert_eq!(error.code(), "ERR_CREATE_SCRIPT");
    }

    #[test]
    fn test_request_signature_verifies() {
        let key = secret(SENDER_KEY);
        let identity = public_key_hex(&key);
        let body = br#"{"fileSize":1024,"retentionPeriod":60}"#;

        let signature = signature::sign_request(&key, b"nonce", body).unwrap();

        assert!(signature::verify_request(&identity, b"nonce", body, &signature).unwrap());
        assert!(!signature::verify_request(&identity, b"other", body, &signature).unwrap());
    }
}
