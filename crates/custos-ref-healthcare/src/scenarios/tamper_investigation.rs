//! Scenario 2: Tamper Investigation
//!
//! An insider with write access to the database edits stored audit records
//! after the fact.  An investigator holding only the public key and the
//! deployment config reads the chain back and localizes every edit.
//!
//! Three edits are made to a copy of the stored chain:
//!   1. A glucose value is silently changed (hash no longer recomputes)
//!   2. A description is changed and the hash recomputed to cover it up
//!      (the signature no longer matches, and the next record's link breaks)
//!   3. One encrypted payload is corrupted (decryption is refused)

use custos_audit::chain_hash;
use custos_config::ComplianceConfig;
use custos_contracts::{
    compliance::{ComplianceReport, IntegrityReport},
    error::{CustosError, CustosResult},
    record::AuditRecord,
};
use custos_core::traits::RecordCipher;

use super::{short, DemoPipeline};
use crate::mock_data::glucose_monitoring;

/// Index of the record whose value the insider edits.
pub const EDITED_VALUE: usize = 2;

/// Index of the record the insider edits and re-hashes.
pub const REHASHED: usize = 3;

/// Apply the insider's edits to `chain` in place.
///
/// Fails with `CustosError::Precondition` when the chain is too short to
/// hold every edited record.
pub fn tamper(chain: &mut [AuditRecord]) -> CustosResult<()> {
    if chain.len() <= REHASHED {
        return Err(CustosError::Precondition {
            reason: format!(
                "tampering needs at least {} records, chain has {}",
                REHASHED + 1,
                chain.len()
            ),
        });
    }
    chain[EDITED_VALUE].new_value = Some("glucose: 95 mg/dL".to_string());

    let cover_up = &mut chain[REHASHED];
    cover_up.description = "Bedside capillary glucose, repeated".to_string();
    let previous = cover_up.previous_hash.clone().unwrap_or_default();
    cover_up.current_hash = Some(chain_hash(cover_up, &previous)?);

    if let Some(payload) = chain[0].encrypted_payload.as_mut() {
        let flipped = if payload.starts_with('A') { "B" } else { "A" };
        payload.replace_range(..1, flipped);
    }
    Ok(())
}

/// Write a clean chain, tamper with a copy, and investigate the copy.
pub fn investigate(
    pipeline: &DemoPipeline,
) -> CustosResult<(Vec<IntegrityReport>, ComplianceReport)> {
    for fields in glucose_monitoring("patient_456") {
        pipeline.writer.write(fields)?;
    }
    let mut chain = pipeline.read_chain("global")?;
    tamper(&mut chain)?;

    let reports = pipeline.reporter.verify_records(&chain, Some(&pipeline.verifier));
    let summary = pipeline
        .reporter
        .generate_compliance_report(&chain, Some(&pipeline.verifier));
    Ok((reports, summary))
}

/// Run Scenario 2: Tamper Investigation.
pub fn run_scenario(config: &ComplianceConfig) -> CustosResult<()> {
    println!("=== Scenario 2: Tamper Investigation ===");
    println!();

    let pipeline = DemoPipeline::new(config)?;
    let (reports, summary) = investigate(&pipeline)?;

    println!("  Insider edits applied to the stored chain:");
    println!("    - record {}: glucose value changed", EDITED_VALUE + 1);
    println!(
        "    - record {}: description changed, hash recomputed",
        REHASHED + 1
    );
    println!("    - record 1: encrypted payload corrupted");
    println!();

    println!("  Per-record verification:");
    for (position, report) in reports.iter().enumerate() {
        if report.valid {
            println!("    [{}] {}…  OK", position + 1, short(Some(report.record_id.as_str())));
            continue;
        }
        println!(
            "    [{}] {}…  {} violation(s)",
            position + 1,
            short(Some(report.record_id.as_str())),
            report.violations.len()
        );
        for violation in &report.violations {
            println!("          - {}", violation);
        }
    }
    println!();

    let mut tampered = pipeline.read_chain("global")?;
    tamper(&mut tampered)?;
    let payload = tampered[0].encrypted_payload.as_deref().unwrap_or_default();
    match pipeline.cipher.decrypt(payload) {
        Ok(_) => println!("  Corrupted payload:    DECRYPTED (unexpected)"),
        Err(e) => println!("  Corrupted payload:    REJECTED ({})", e),
    }
    println!();

    println!("  Report {}", summary.report_id);
    println!("  Status:               {}", summary.compliance_status);
    println!("  Hash mismatches:      {}", summary.computed_hash_mismatches);
    println!("  Signature failures:   {}", summary.signature_failed);
    println!("  Integrity violations: {}", summary.data_integrity_violations);
    println!("  Flagged records:      {}", summary.flagged_records.len());
    for recommendation in &summary.recommendations {
        println!("    - {}", recommendation);
    }
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use custos_contracts::compliance::{ComplianceStatus, IntegrityViolation};
    use custos_crypto::fixtures::TEST_KEY_BITS;

    use super::*;
    use crate::scenarios::healthcare_config;

    fn pipeline() -> DemoPipeline {
        DemoPipeline::with_key_bits(&healthcare_config().unwrap(), TEST_KEY_BITS).unwrap()
    }

    /// Every edit is localized to the record it touched (plus the successor
    /// of the re-hashed record, whose link now points at the old hash).
    #[test]
    fn test_edits_are_localized() {
        let (reports, summary) = investigate(&pipeline()).unwrap();

        assert!(reports[0].valid, "payload corruption is not visible to hashing");
        assert!(reports[1].valid);
        assert_eq!(reports[EDITED_VALUE].violations.len(), 1);
        assert!(reports[EDITED_VALUE].has_hash_mismatch());
        assert!(matches!(
            reports[REHASHED].violations.as_slice(),
            [IntegrityViolation::SignatureInvalid { .. }]
        ));
        assert!(matches!(
            reports[REHASHED + 1].violations.as_slice(),
            [IntegrityViolation::PreviousHashMismatch { .. }]
        ));

        assert_eq!(summary.computed_hash_mismatches, 1);
        assert_eq!(summary.signature_failed, 1);
        assert_eq!(summary.flagged_records.len(), 3);
        assert_eq!(summary.compliance_status, ComplianceStatus::Warning);
    }

    #[test]
    fn test_corrupted_payload_is_refused() {
        let pipeline = pipeline();
        investigate(&pipeline).unwrap();

        let mut chain = pipeline.read_chain("global").unwrap();
        tamper(&mut chain).unwrap();
        let err = pipeline
            .cipher
            .decrypt(chain[0].encrypted_payload.as_deref().unwrap())
            .unwrap_err();
        assert!(matches!(err, CustosError::Decryption { .. }));
    }

    #[test]
    fn test_short_chain_is_refused() {
        let pipeline = pipeline();
        for fields in glucose_monitoring("patient_789").into_iter().take(REHASHED) {
            pipeline.writer.write(fields).unwrap();
        }
        let mut chain = pipeline.read_chain("global").unwrap();
        let untouched = chain.clone();

        let err = tamper(&mut chain).unwrap_err();
        assert!(matches!(err, CustosError::Precondition { .. }));
        assert_eq!(chain, untouched, "a refused tamper leaves the chain as read");
    }

    #[test]
    fn test_store_is_never_modified() {
        let pipeline = pipeline();
        investigate(&pipeline).unwrap();
        assert!(pipeline.store.verify_integrity("global"));
    }
}
