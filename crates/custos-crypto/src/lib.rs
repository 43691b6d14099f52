//! # custos-crypto
//!
//! Signing and at-rest sealing of CUSTOS audit records.
//!
//! - [`signing`]: RSA PKCS#1 v1.5 over SHA-256 of `current_hash`
//! - [`cipher`]: AES-256-GCM over the full serialized record
//!
//! Both come as free functions taking raw keys (`sign`, `verify_signature`,
//! `encrypt`, `decrypt`) and as implementations of the `custos-core` seam
//! traits (`RsaRecordSigner`, `RsaSignatureVerifier`, `AesGcmRecordCipher`)
//! for the chain writer and verifiers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custos_crypto::{sign, verify_signature, encrypt, decrypt};
//!
//! sign(&mut record, &private_key)?;          // after hashing
//! encrypt(&mut record, &aes_key)?;           // last step before storage
//! assert!(verify_signature(&record, &public_key)?);
//! let restored = decrypt(record.encrypted_payload.as_deref().unwrap(), &aes_key)?;
//! ```

pub mod cipher;
pub mod signing;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use cipher::{decrypt, encrypt, AesGcmRecordCipher, EncryptionKey};
pub use signing::{sign, verify_signature, RsaRecordSigner, RsaSignatureVerifier};

// ── Tests ─────────────────────────────────────────────────────────────────────
