//! AES-256-GCM sealing of whole audit records.
//!
//! Payload layout, base64 (standard alphabet, padded):
//!
//! ```text
//! nonce (12 bytes) || ciphertext (n bytes) || tag (16 bytes)
//! ```
//!
//! The plaintext is the record serialized as JSON with `encrypted_payload`
//! cleared, so the payload never contains itself.  Decryption hands the
//! payload back on the returned record, which makes
//! `decrypt(encrypt(r, k), k) == r` hold field for field.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use custos_contracts::{
    error::{CustosError, CustosResult},
    record::AuditRecord,
};
use custos_core::traits::RecordCipher;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy a key out of a caller-supplied slice.
    ///
    /// # Errors
    ///
    /// `CustosError::InvalidKey` unless the slice is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CustosResult<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CustosError::InvalidKey {
            reason: format!(
                "encryption key must be {} bytes (256 bits), got {}",
                KEY_LEN,
                bytes.len()
            ),
        })?;
        Ok(Self(array))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

// ── Free functions ────────────────────────────────────────────────────────────

/// Encrypt the full record with a raw 256-bit key and store the payload on
/// the record.
///
/// Returns the base64 payload.
pub fn encrypt(record: &mut AuditRecord, key: &[u8]) -> CustosResult<String> {
    let key = EncryptionKey::from_slice(key)?;
    encrypt_with(record, &key)
}

/// Decrypt and authenticate `payload` with a raw 256-bit key.
pub fn decrypt(payload: &str, key: &[u8]) -> CustosResult<AuditRecord> {
    let key = EncryptionKey::from_slice(key)?;
    decrypt_with(payload, &key)
}

/// `encrypt` with an already validated key.
pub fn encrypt_with(record: &mut AuditRecord, key: &EncryptionKey) -> CustosResult<String> {
    let mut plain_view = record.clone();
    plain_view.encrypted_payload = None;
    let plaintext = serde_json::to_vec(&plain_view).map_err(|e| CustosError::Encoding {
        reason: format!("failed to serialize record '{}': {}", record.record_id, e),
    })?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = key
        .cipher()
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|e| CustosError::Encoding {
            reason: format!("AES-GCM encrypt: {}", e),
        })?;

    let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);
    let encoded = STANDARD.encode(&blob);

    debug!(
        record_id = %record.record_id,
        payload_bytes = blob.len(),
        "record encrypted"
    );
    record.encrypted_payload = Some(encoded.clone());
    Ok(encoded)
}

/// `decrypt` with an already validated key.
///
/// # Errors
///
/// `CustosError::Decryption` for bad base64, a truncated payload, or a tag
/// that does not authenticate (tampering or wrong key).
pub fn decrypt_with(payload: &str, key: &EncryptionKey) -> CustosResult<AuditRecord> {
    let blob = STANDARD.decode(payload).map_err(|e| CustosError::Decryption {
        reason: format!("payload is not base64: {}", e),
    })?;
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CustosError::Decryption {
            reason: format!(
                "payload is {} bytes, shorter than nonce plus tag ({})",
                blob.len(),
                NONCE_LEN + TAG_LEN
            ),
        });
    }

    let (nonce, sealed) = blob.split_at(NONCE_LEN);
    let plaintext = key
        .cipher()
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| {
            warn!("AES-GCM authentication failed; payload tampered or wrong key");
            CustosError::Decryption {
                reason: "authentication tag mismatch".to_string(),
            }
        })?;

    let mut record: AuditRecord =
        serde_json::from_slice(&plaintext).map_err(|e| CustosError::Encoding {
            reason: format!("decrypted payload is not an audit record: {}", e),
        })?;
    record.encrypted_payload = Some(payload.to_string());
    Ok(record)
}

// ── Trait implementation ──────────────────────────────────────────────────────

/// A `RecordCipher` holding one AES-256 key.
#[derive(Debug, Clone)]
pub struct AesGcmRecordCipher {
    key: EncryptionKey,
}

impl AesGcmRecordCipher {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    pub fn from_slice(key: &[u8]) -> CustosResult<Self> {
        Ok(Self::new(EncryptionKey::from_slice(key)?))
    }
}

impl RecordCipher for AesGcmRecordCipher {
    fn encrypt(&self, record: &mut AuditRecord) -> CustosResult<String> {
        encrypt_with(record, &self.key)
    }

    fn decrypt(&self, payload: &str) -> CustosResult<AuditRecord> {
        decrypt_with(payload, &self.key)
    }
}
