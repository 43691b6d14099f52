//! Healthcare reference scenarios.
//!
//! Each scenario is a self-contained module that wires up real CUSTOS
//! components (chain writer, RSA signer, AES-GCM cipher, integrity verifier,
//! compliance reporter) with mock clinical activity and demonstrates one
//! property of the audit trail.

use std::sync::Arc;

use tracing::info;

use custos_audit::{ChainWriter, InMemoryAuditStore};
use custos_config::ComplianceConfig;
use custos_contracts::{error::CustosResult, record::AuditRecord};
use custos_core::{
    traits::{AuditStore, TimeSource},
    SystemClock,
};
use custos_crypto::{
    fixtures::{generate_encryption_key, generate_signing_key},
    AesGcmRecordCipher, RsaRecordSigner, RsaSignatureVerifier,
};
use custos_verify::{ComplianceReporter, IntegrityVerifier};

pub mod glucose_chain;
pub mod tamper_investigation;
pub mod unauthorized_access;

/// Embedded deployment profile for the scenarios.
pub const HEALTHCARE_CONFIG: &str = include_str!("../../config/healthcare.toml");

/// RSA modulus for the demo signer.  Production deployments use 4096.
pub const DEMO_KEY_BITS: usize = 2048;

/// Parse the embedded deployment profile.
pub fn healthcare_config() -> CustosResult<ComplianceConfig> {
    ComplianceConfig::from_toml_str(HEALTHCARE_CONFIG)
}

// ── Shared wiring ─────────────────────────────────────────────────────────────

/// A fully wired audit pipeline with freshly generated demo keys.
pub struct DemoPipeline {
    pub config: ComplianceConfig,
    pub store: Arc<InMemoryAuditStore>,
    pub writer: ChainWriter,
    pub verifier: RsaSignatureVerifier,
    pub cipher: AesGcmRecordCipher,
    pub integrity: IntegrityVerifier,
    pub reporter: ComplianceReporter,
}

impl DemoPipeline {
    pub fn new(config: &ComplianceConfig) -> CustosResult<Self> {
        Self::with_key_bits(config, DEMO_KEY_BITS)
    }

    pub fn with_key_bits(config: &ComplianceConfig, bits: usize) -> CustosResult<Self> {
        let signer =
            RsaRecordSigner::new(generate_signing_key(bits)?)?.with_key_id("mercy-general-2024");
        let verifier = signer.verifier();
        info!(key_id = %verifier.key_id(), bits, "demo signing key generated");
        let cipher = AesGcmRecordCipher::new(generate_encryption_key());
        let clock: Arc<dyn TimeSource> = Arc::new(SystemClock);
        let store = Arc::new(InMemoryAuditStore::new(&config.chain.genesis_hash));

        let writer = ChainWriter::new(
            store.clone(),
            Box::new(signer),
            Box::new(cipher.clone()),
            clock.clone(),
            config,
        );

        Ok(Self {
            config: config.clone(),
            store,
            writer,
            verifier,
            cipher,
            integrity: IntegrityVerifier::new(config.integrity.clone(), clock.clone()),
            reporter: ComplianceReporter::new(config, clock),
        })
    }

    pub fn read_chain(&self, chain: &str) -> CustosResult<Vec<AuditRecord>> {
        self.store.read_chain(chain)
    }
}

/// First 16 characters of a hash or signature, for display.
pub(crate) fn short(value: Option<&str>) -> &str {
    let value = value.unwrap_or("-");
    &value[..value.len().min(16)]
}
