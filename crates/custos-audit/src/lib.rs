//! # custos-audit
//!
//! Append-only, SHA-256 hash-chained audit records for CUSTOS.
//!
//! ## Overview
//!
//! Every record links to its predecessor through `previous_hash`, and its own
//! `current_hash` covers every provenance field plus that link.  Changing a
//! single byte of a stored record, or reordering, inserting or deleting
//! records, breaks the chain and is detected by `verify_chain`.
//!
//! `ChainWriter` runs the whole sealing pipeline (hash → sign → encrypt) and
//! appends to an `AuditStore` with compare-and-append semantics.
//! `InMemoryAuditStore` is the reference store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custos_audit::{ChainWriter, InMemoryAuditStore};
//! use custos_contracts::record::RecordFields;
//!
//! let store = Arc::new(InMemoryAuditStore::new(&config.chain.genesis_hash));
//! let writer = ChainWriter::new(store.clone(), signer, cipher, clock, &config);
//!
//! writer.write(RecordFields::new("doctor_001", "update", "patient_data", "patient_123"))?;
//! assert!(store.verify_integrity("global"));
//! ```

pub mod chain;
pub mod memory;
pub mod writer;

pub use chain::{chain_hash, compute_hash, recompute_hash, verify_chain};
pub use memory::InMemoryAuditStore;
pub use writer::{seal, ChainWriter};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use custos_config::{ChainScope, ComplianceConfig, GENESIS_HASH};
    use custos_contracts::{
        error::{CustosError, CustosResult},
        record::{build_record, AuditRecord, RecordFields},
    };
    use custos_core::{
        traits::{AuditStore, RecordCipher, RecordSigner, SignatureVerifier},
        FixedClock,
    };
    use custos_crypto::{
        fixtures::{test_encryption_key_bytes, test_signer},
        AesGcmRecordCipher,
    };

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn make_record(target_id: &str, new_value: &str) -> AuditRecord {
        build_record(
            RecordFields::new("doctor_001", "update", "patient_data", target_id)
                .with_values(Some("glucose: 110".into()), Some(new_value.into())),
            start(),
        )
    }

    fn cipher() -> Box<dyn RecordCipher> {
        Box::new(AesGcmRecordCipher::from_slice(&test_encryption_key_bytes()).unwrap())
    }

    fn make_writer(config: &ComplianceConfig) -> (Arc<InMemoryAuditStore>, ChainWriter) {
        let store = Arc::new(InMemoryAuditStore::new(&config.chain.genesis_hash));
        let clock = Arc::new(FixedClock::new(start()));
        let writer = ChainWriter::new(
            store.clone(),
            Box::new(test_signer()),
            cipher(),
            clock,
            config,
        );
        (store, writer)
    }

    fn fields(n: usize) -> RecordFields {
        RecordFields::new("nurse_042", "update", "patient_data", format!("patient_{}", n))
            .with_values(Some("bp: 120/80".into()), Some(format!("bp: 12{}/80", n)))
    }

    /// A signer whose key is unreachable.
    struct FailingSigner;

    impl RecordSigner for FailingSigner {
        fn sign(&self, _record: &mut AuditRecord) -> CustosResult<String> {
            Err(CustosError::Signing {
                reason: "hardware token unavailable".to_string(),
            })
        }
    }

    // ── Chain primitives ──────────────────────────────────────────────────────

    /// Three records linked from genesis form a valid chain.
    #[test]
    fn test_hash_chain_integrity() {
        let mut prev = "genesis".to_string();
        let mut chain = Vec::new();
        for n in 0..3 {
            let mut record = make_record(&format!("patient_{}", n), "glucose: 105");
            prev = compute_hash(&mut record, &prev).unwrap();
            chain.push(record);
        }

        assert!(verify_chain(&chain, "genesis"));
        assert_eq!(chain[0].previous_hash.as_deref(), Some("genesis"));
        assert_eq!(chain[1].previous_hash, chain[0].current_hash);
        assert_eq!(chain[2].previous_hash, chain[1].current_hash);
    }

    #[test]
    fn test_hash_is_deterministic_lowercase_hex() {
        let record = make_record("patient_123", "glucose: 105");
        let a = chain_hash(&record, GENESIS_HASH).unwrap();
        let b = chain_hash(&record.clone(), GENESIS_HASH).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_compute_hash_sets_chain_fields() {
        let mut record = make_record("patient_123", "glucose: 105");
        let hash = compute_hash(&mut record, GENESIS_HASH).unwrap();
        assert_eq!(record.previous_hash.as_deref(), Some(GENESIS_HASH));
        assert_eq!(record.current_hash.as_deref(), Some(hash.as_str()));
        assert_eq!(recompute_hash(&record).unwrap(), hash);
    }

    /// Mutating any hashed field breaks the chain.
    #[test]
    fn test_tamper_detection() {
        let mut prev = GENESIS_HASH.to_string();
        let mut chain = Vec::new();
        for n in 0..3 {
            let mut record = make_record(&format!("patient_{}", n), "glucose: 105");
            prev = compute_hash(&mut record, &prev).unwrap();
            chain.push(record);
        }

        chain[1].new_value = Some("glucose: 250".to_string());
        assert!(!verify_chain(&chain, GENESIS_HASH));
    }

    #[test]
    fn test_reordering_is_detected() {
        let mut prev = GENESIS_HASH.to_string();
        let mut chain = Vec::new();
        for n in 0..3 {
            let mut record = make_record(&format!("patient_{}", n), "glucose: 105");
            prev = compute_hash(&mut record, &prev).unwrap();
            chain.push(record);
        }

        chain.swap(1, 2);
        assert!(!verify_chain(&chain, GENESIS_HASH));
        chain.swap(1, 2);
        chain.remove(1);
        assert!(!verify_chain(&chain, GENESIS_HASH), "deletion must be detected");
    }

    #[test]
    fn test_rehash_is_rejected() {
        let mut record = make_record("patient_123", "glucose: 105");
        let first = compute_hash(&mut record, GENESIS_HASH).unwrap();

        let err = compute_hash(&mut record, "other-tail").unwrap_err();
        assert!(matches!(err, CustosError::Precondition { .. }));
        assert_eq!(record.current_hash.as_deref(), Some(first.as_str()));
        assert_eq!(record.previous_hash.as_deref(), Some(GENESIS_HASH));
    }

    #[test]
    fn test_unencodable_record_is_left_untouched() {
        let mut record = build_record(
            RecordFields::new("doctor_001", "read", "patient_data", "patient_123"),
            Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap(),
        );
        let err = compute_hash(&mut record, GENESIS_HASH).unwrap_err();
        assert!(matches!(err, CustosError::Encoding { .. }));
        assert!(record.previous_hash.is_none());
        assert!(record.current_hash.is_none());
    }

    #[test]
    fn test_verify_empty() {
        assert!(verify_chain(&[], GENESIS_HASH));
        let store = InMemoryAuditStore::new(GENESIS_HASH);
        assert!(store.verify_integrity("global"));
        assert!(store.is_empty());
    }

    // ── Store ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_store_rejects_unsealed_record() {
        let store = InMemoryAuditStore::new(GENESIS_HASH);
        let mut record = make_record("patient_123", "glucose: 105");
        compute_hash(&mut record, GENESIS_HASH).unwrap();

        let err = store.append("global", record).unwrap_err();
        assert!(matches!(err, CustosError::Precondition { .. }));
        assert_eq!(store.len("global"), 0);
    }

    #[test]
    fn test_store_rejects_stale_tail() {
        let store = InMemoryAuditStore::new(GENESIS_HASH);
        let signer = test_signer();
        let cipher = cipher();

        let first = seal(make_record("p1", "a"), GENESIS_HASH, &signer, cipher.as_ref()).unwrap();
        store.append("global", first).unwrap();

        // A second writer that read the tail before the first append.
        let stale = seal(make_record("p2", "b"), GENESIS_HASH, &signer, cipher.as_ref()).unwrap();
        match store.append("global", stale).unwrap_err() {
            CustosError::ChainConflict {
                chain,
                expected,
                actual,
            } => {
                assert_eq!(chain, "global");
                assert_eq!(actual, GENESIS_HASH);
                assert_eq!(Some(expected), store.tail_hash("global").unwrap());
            }
            other => panic!("expected ChainConflict, got {other:?}"),
        }
        assert_eq!(store.len("global"), 1);
    }

    // ── Writer ────────────────────────────────────────────────────────────────

    #[test]
    fn test_writer_seals_and_links() {
        let config = ComplianceConfig::default();
        let (store, writer) = make_writer(&config);

        let a = writer.write(fields(1)).unwrap();
        let b = writer.write(fields(2)).unwrap();

        assert_eq!(a.previous_hash.as_deref(), Some(GENESIS_HASH));
        assert_eq!(b.previous_hash, a.current_hash);
        for record in [&a, &b] {
            assert!(record.is_sealed());
            assert!(record.compliance.immutable);
            assert_eq!(record.compliance.retention_days, 2555);
            assert!(record.compliance.tags.contains("HIPAA"));
            assert!(record.system_version.starts_with("custos-"));
            assert_eq!(record.timestamp, start());
        }

        assert_eq!(store.read_chain("global").unwrap(), vec![a.clone(), b]);
        assert!(writer.verify_chain("global").unwrap());
        assert!(test_signer().verifier().verify(&a).unwrap());

        let restored = cipher().decrypt(a.encrypted_payload.as_deref().unwrap()).unwrap();
        assert_eq!(restored, a);
    }

    #[test]
    fn test_writer_failure_stores_nothing() {
        let config = ComplianceConfig::default();
        let store = Arc::new(InMemoryAuditStore::new(GENESIS_HASH));
        let writer = ChainWriter::new(
            store.clone(),
            Box::new(FailingSigner),
            cipher(),
            Arc::new(FixedClock::new(start())),
            &config,
        );

        let err = writer.write(fields(1)).unwrap_err();
        assert!(matches!(err, CustosError::Signing { .. }));
        assert!(store.is_empty());
        assert_eq!(store.tail_hash("global").unwrap(), None);
    }

    #[test]
    fn test_writer_rejects_prehashed_record() {
        let config = ComplianceConfig::default();
        let (store, writer) = make_writer(&config);

        let mut record = make_record("patient_123", "glucose: 105");
        compute_hash(&mut record, GENESIS_HASH).unwrap();
        let err = writer.append(record).unwrap_err();
        assert!(matches!(err, CustosError::Precondition { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_correction_is_a_new_record() {
        let config = ComplianceConfig::default();
        let (store, writer) = make_writer(&config);

        let original = writer.write(fields(1)).unwrap();
        let correction = writer
            .write(RecordFields::correction_of(
                &original,
                "doctor_001",
                "wrong patient selected",
            ))
            .unwrap();

        assert_eq!(correction.target_id, original.record_id);
        assert_eq!(correction.previous_hash, original.current_hash);
        let chain = store.read_chain("global").unwrap();
        assert_eq!(chain[0], original, "the original is never modified");
        assert!(writer.verify_chain("global").unwrap());
    }

    #[test]
    fn test_per_tenant_chains_are_independent() {
        let mut config = ComplianceConfig::default();
        config.chain.scope = ChainScope::PerTenant;
        let (store, writer) = make_writer(&config);

        let a1 = writer.write(fields(1).with_tenant("clinic-a")).unwrap();
        let b1 = writer.write(fields(2).with_tenant("clinic-b")).unwrap();
        let a2 = writer.write(fields(3).with_tenant("clinic-a")).unwrap();
        writer.write(fields(4)).unwrap();

        assert_eq!(a1.previous_hash.as_deref(), Some(GENESIS_HASH));
        assert_eq!(b1.previous_hash.as_deref(), Some(GENESIS_HASH));
        assert_eq!(a2.previous_hash, a1.current_hash);
        assert_eq!(
            store.chain_names(),
            vec!["tenant:clinic-a", "tenant:clinic-b", "tenant:default"]
        );
        assert_eq!(writer.chain_for(&a2), "tenant:clinic-a");
        for chain in store.chain_names() {
            assert!(store.verify_integrity(&chain), "chain {} must verify", chain);
        }
    }

    #[test]
    fn test_stored_tamper_is_detected() {
        let config = ComplianceConfig::default();
        let (store, writer) = make_writer(&config);
        for n in 0..3 {
            writer.write(fields(n)).unwrap();
        }

        {
            let mut chains = store.chains.lock().unwrap();
            chains.get_mut("global").unwrap()[0].actor_id = "intruder".to_string();
        }
        assert!(!store.verify_integrity("global"));
    }

    #[test]
    fn test_concurrent_writers_keep_one_chain() {
        let config = ComplianceConfig::default();
        let (store, writer) = make_writer(&config);
        let writer = Arc::new(writer);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    for n in 0..5 {
                        writer.write(fields(t * 10 + n)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len("global"), 20);
        assert!(store.verify_integrity("global"));
    }

    #[test]
    fn test_timestamps_follow_the_clock() {
        let config = ComplianceConfig::default();
        let store = Arc::new(InMemoryAuditStore::new(GENESIS_HASH));
        let clock = Arc::new(FixedClock::new(start()));
        let writer = ChainWriter::new(
            store.clone(),
            Box::new(test_signer()),
            cipher(),
            clock.clone(),
            &config,
        );

        let a = writer.write(fields(1)).unwrap();
        clock.advance(Duration::minutes(5));
        let b = writer.write(fields(2)).unwrap();
        assert_eq!(b.timestamp - a.timestamp, Duration::minutes(5));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn previous_hash_is_bound_into_the_hash(a in "[0-9a-f]{64}", b in "[0-9a-f]{64}") {
            prop_assume!(a != b);
            let record = make_record("patient_123", "glucose: 105");
            prop_assert_ne!(chain_hash(&record, &a).unwrap(), chain_hash(&record, &b).unwrap());
        }
    }
}
