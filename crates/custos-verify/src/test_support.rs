//! Sealed chains for the verifier tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use custos_audit::{ChainWriter, InMemoryAuditStore};
use custos_config::ComplianceConfig;
use custos_contracts::record::{AuditRecord, RecordFields};
use custos_core::{traits::AuditStore, FixedClock};
use custos_crypto::{
    fixtures::{test_encryption_key_bytes, test_signer},
    AesGcmRecordCipher,
};

/// The instant every test record is written at.
pub(crate) fn written_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

/// Write `fields` through a real `ChainWriter` and read the chain back.
pub(crate) fn sealed_chain_from(fields: Vec<RecordFields>) -> Vec<AuditRecord> {
    sealed_chain_with(&ComplianceConfig::default(), fields)
}

pub(crate) fn sealed_chain_with(
    config: &ComplianceConfig,
    fields: Vec<RecordFields>,
) -> Vec<AuditRecord> {
    let store = Arc::new(InMemoryAuditStore::new(&config.chain.genesis_hash));
    let writer = ChainWriter::new(
        store.clone(),
        Box::new(test_signer()),
        Box::new(AesGcmRecordCipher::from_slice(&test_encryption_key_bytes()).unwrap()),
        Arc::new(FixedClock::new(written_at())),
        config,
    );
    for f in fields {
        writer.write(f).unwrap();
    }
    store.read_chain("global").unwrap()
}

/// `n` glucose updates by one clinician.
pub(crate) fn sealed_chain(n: usize) -> Vec<AuditRecord> {
    sealed_chain_from(
        (0..n)
            .map(|i| {
                RecordFields::new("doctor_001", "update", "patient_data", format!("patient_{}", i))
                    .with_description("glucose reading corrected")
                    .with_values(Some("glucose: 110".into()), Some(format!("glucose: {}", 100 + i)))
            })
            .collect(),
    )
}
