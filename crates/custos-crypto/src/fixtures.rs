//! Key material for tests and demos.
//!
//! Compiled only for this crate's tests or with the `fixtures` feature.
//! Production keys are always supplied by the caller.

use std::sync::OnceLock;

use rand::{rngs::OsRng, RngCore};
use rsa::RsaPrivateKey;

use custos_contracts::error::{CustosError, CustosResult};

use crate::cipher::{EncryptionKey, KEY_LEN};
use crate::signing::{RsaRecordSigner, RsaSignatureVerifier, MIN_KEY_BITS};

/// Small enough to generate quickly, large enough for PKCS#1 v1.5 + SHA-256.
pub const TEST_KEY_BITS: usize = MIN_KEY_BITS;

/// Generate a fresh RSA private key of `bits` bits.
pub fn generate_signing_key(bits: usize) -> CustosResult<RsaPrivateKey> {
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| CustosError::InvalidKey {
        reason: format!("RSA key generation failed: {}", e),
    })
}

/// Generate a random 256-bit encryption key.
pub fn generate_encryption_key() -> EncryptionKey {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    EncryptionKey::from_bytes(bytes)
}

/// One RSA key per test binary, generated on first use.
pub fn test_signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| generate_signing_key(TEST_KEY_BITS).expect("test RSA key generation"))
}

/// A second, unrelated RSA key for wrong-key tests.
pub fn other_signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| generate_signing_key(TEST_KEY_BITS).expect("test RSA key generation"))
}

pub fn test_signer() -> RsaRecordSigner {
    RsaRecordSigner::new(test_signing_key().clone()).expect("test key meets minimum size")
}

pub fn test_verifier() -> RsaSignatureVerifier {
    test_signer().verifier()
}

/// A fixed 256-bit key, so ciphertexts in failing tests are reproducible
/// apart from the nonce.
pub fn test_encryption_key_bytes() -> [u8; KEY_LEN] {
    let mut bytes = [0u8; KEY_LEN];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = i as u8;
    }
    bytes
}
