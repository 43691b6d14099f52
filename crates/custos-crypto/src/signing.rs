//! RSA signatures over a record's chain hash.
//!
//! The signed message is the SHA-256 digest of the record's `current_hash`
//! string (the lowercase hex text, not its decoded bytes), padded with
//! PKCS#1 v1.5.  The signature is stored base64-encoded on the record.
//!
//! Because only the chain hash is signed, the signature authenticates every
//! hashed field transitively: a field edit is caught by hash recomputation,
//! a hash edit is caught here.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    traits::PublicKeyParts,
    Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use custos_contracts::{
    error::{CustosError, CustosResult},
    record::AuditRecord,
};
use custos_core::traits::{RecordSigner, SignatureVerifier};

/// Smallest modulus accepted.  Only test fixtures should run this small.
pub const MIN_KEY_BITS: usize = 1024;

/// Modulus size for production deployments.
pub const PRODUCTION_KEY_BITS: usize = 4096;

// ── Free functions ────────────────────────────────────────────────────────────

/// Sign `record.current_hash` with `private_key` and store the signature.
///
/// Returns the base64 signature.
///
/// # Errors
///
/// - `CustosError::Precondition` when the record has not been hashed.
/// - `CustosError::InvalidKey` when the key is smaller than `MIN_KEY_BITS`.
/// - `CustosError::Signing` when the RSA primitive fails.
pub fn sign(record: &mut AuditRecord, private_key: &RsaPrivateKey) -> CustosResult<String> {
    let digest = match record.current_hash.as_deref() {
        Some(hash) if !hash.is_empty() => Sha256::digest(hash.as_bytes()),
        _ => {
            return Err(CustosError::Precondition {
                reason: format!(
                    "record '{}' must be hashed before it can be signed",
                    record.record_id
                ),
            })
        }
    };
    check_key_bits(private_key.size())?;

    let raw = private_key
        .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CustosError::Signing {
            reason: format!("RSA PKCS#1 v1.5 signing failed: {}", e),
        })?;

    let encoded = STANDARD.encode(raw);
    debug!(
        record_id = %record.record_id,
        signature_prefix = %&encoded[..encoded.len().min(16)],
        "record signed"
    );
    record.signature = Some(encoded.clone());
    Ok(encoded)
}

/// Check the record's signature against `public_key`.
///
/// Returns `Ok(false)` when the signature is well-formed but does not match
/// the stored `current_hash` (tampering or wrong key).
///
/// # Errors
///
/// `CustosError::MalformedSignature` when the signature is absent or is not
/// valid base64.
pub fn verify_signature(record: &AuditRecord, public_key: &RsaPublicKey) -> CustosResult<bool> {
    let encoded = match record.signature.as_deref() {
        Some(sig) if !sig.is_empty() => sig,
        _ => {
            return Err(CustosError::MalformedSignature {
                reason: format!("record '{}' carries no signature", record.record_id),
            })
        }
    };
    let raw = STANDARD
        .decode(encoded)
        .map_err(|e| CustosError::MalformedSignature {
            reason: format!("signature of record '{}' is not base64: {}", record.record_id, e),
        })?;

    let Some(hash) = record.current_hash.as_deref() else {
        warn!(record_id = %record.record_id, "signed record has no current_hash");
        return Ok(false);
    };
    let digest = Sha256::digest(hash.as_bytes());

    match public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &raw) {
        Ok(()) => {
            debug!(record_id = %record.record_id, "signature verified");
            Ok(true)
        }
        Err(e) => {
            warn!(record_id = %record.record_id, error = %e, "signature verification failed");
            Ok(false)
        }
    }
}

/// Short, stable identifier for a public key: the first 8 bytes (hex) of the
/// SHA-256 over its big-endian modulus and exponent.
pub fn key_fingerprint(public_key: &RsaPublicKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(public_key.n().to_bytes_be());
    hasher.update(public_key.e().to_bytes_be());
    hex::encode(&hasher.finalize()[..8])
}

pub(crate) fn check_key_bits(size_bytes: usize) -> CustosResult<()> {
    let bits = size_bytes * 8;
    if bits < MIN_KEY_BITS {
        return Err(CustosError::InvalidKey {
            reason: format!("RSA key has {} bits, minimum is {}", bits, MIN_KEY_BITS),
        });
    }
    Ok(())
}

// ── Trait implementations ─────────────────────────────────────────────────────

/// A `RecordSigner` holding an RSA private key.
///
/// Every signature it produces is tagged with the key's fingerprint (or an
/// explicit id) in `signing_key_id`.
pub struct RsaRecordSigner {
    key: RsaPrivateKey,
    key_id: String,
}

impl RsaRecordSigner {
    /// Wrap a caller-supplied private key.
    pub fn new(key: RsaPrivateKey) -> CustosResult<Self> {
        check_key_bits(key.size())?;
        let key_id = key_fingerprint(&key.to_public_key());
        Ok(Self { key, key_id })
    }

    /// Parse a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> CustosResult<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CustosError::InvalidKey {
            reason: format!("failed to parse PKCS#8 private key: {}", e),
        })?;
        Self::new(key)
    }

    /// Override the fingerprint with a deployment-assigned key id.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = key_id.into();
        self
    }

    /// A verifier for the matching public key, carrying the same key id.
    pub fn verifier(&self) -> RsaSignatureVerifier {
        RsaSignatureVerifier {
            key: self.key.to_public_key(),
            key_id: self.key_id.clone(),
        }
    }
}

impl fmt::Debug for RsaRecordSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaRecordSigner")
            .field("key_id", &self.key_id)
            .field("bits", &(self.key.size() * 8))
            .finish_non_exhaustive()
    }
}

impl RecordSigner for RsaRecordSigner {
    fn sign(&self, record: &mut AuditRecord) -> CustosResult<String> {
        let signature = sign(record, &self.key)?;
        record.signing_key_id = Some(self.key_id.clone());
        Ok(signature)
    }

    fn key_id(&self) -> Option<&str> {
        Some(&self.key_id)
    }
}

/// A `SignatureVerifier` holding an RSA public key.
#[derive(Debug, Clone)]
pub struct RsaSignatureVerifier {
    key: RsaPublicKey,
    key_id: String,
}

impl RsaSignatureVerifier {
    pub fn new(key: RsaPublicKey) -> CustosResult<Self> {
        check_key_bits(key.size())?;
        let key_id = key_fingerprint(&key);
        Ok(Self { key, key_id })
    }

    /// Parse a SubjectPublicKeyInfo PEM public key.
    pub fn from_public_key_pem(pem: &str) -> CustosResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem).map_err(|e| CustosError::InvalidKey {
            reason: format!("failed to parse public key: {}", e),
        })?;
        Self::new(key)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

impl SignatureVerifier for RsaSignatureVerifier {
    fn verify(&self, record: &AuditRecord) -> CustosResult<bool> {
        verify_signature(record, &self.key)
    }
}
