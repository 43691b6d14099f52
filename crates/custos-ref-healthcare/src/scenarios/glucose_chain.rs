//! Scenario 1: Glucose Monitoring Chain
//!
//! Demonstrates the full write path on one patient's glucose readings and the
//! regulator-facing report over the result.
//!
//! Walk-through for the demo run:
//!   1. Five clinical actions are sealed (hash → sign → encrypt) and appended
//!   2. A mis-entered reading is amended with a correction record; the
//!      original stays untouched
//!   3. One record's encrypted payload is decrypted and compared field by
//!      field with the stored record
//!   4. The chain is verified end to end and a compliance report generated
//!   5. The report itself is audit-logged through the same pipeline

use custos_config::ComplianceConfig;
use custos_contracts::{
    compliance::ComplianceReport,
    error::CustosResult,
    record::RecordFields,
};
use custos_core::traits::RecordCipher;
use custos_verify::report_audit_fields;

use super::{short, DemoPipeline};
use crate::mock_data::{glucose_monitoring, ENDOCRINOLOGIST};

pub const PATIENT_ID: &str = "patient_123";

/// Write the monitoring chain, amend one reading and report on the result.
pub fn run_chain(pipeline: &DemoPipeline) -> CustosResult<ComplianceReport> {
    let mut written = Vec::new();
    for fields in glucose_monitoring(PATIENT_ID) {
        let record = pipeline.writer.write(fields)?;
        println!(
            "  [{}] {:<8} by {:<14} hash {}… sig {}…",
            written.len() + 1,
            record.action,
            record.actor_id,
            short(record.current_hash.as_deref()),
            short(record.signature.as_deref()),
        );
        written.push(record);
    }

    // The post-lunch reading belonged to another patient.
    let mistaken = &written[3];
    let correction = pipeline.writer.write(
        RecordFields::correction_of(mistaken, ENDOCRINOLOGIST, "Reading entered on wrong chart")
            .with_values(mistaken.new_value.clone(), None),
    )?;
    println!(
        "  [{}] {:<8} of record {}… (original untouched)",
        written.len() + 1,
        correction.action,
        short(Some(mistaken.record_id.as_str())),
    );
    println!();

    let chain_name = pipeline.writer.chain_for(&correction);
    let chain = pipeline.read_chain(&chain_name)?;
    let payload = chain[1].encrypted_payload.as_deref().unwrap_or_default();
    let restored = pipeline.cipher.decrypt(payload)?;
    println!(
        "  Decrypted payload of record 2 matches stored record: {}",
        if restored == chain[1] { "yes" } else { "NO" }
    );

    let linked = pipeline.writer.verify_chain(&chain_name)?;
    println!(
        "  Chain linkage and hashes:  {} ({} records)",
        if linked { "VERIFIED" } else { "FAILED" },
        chain.len()
    );

    Ok(pipeline
        .reporter
        .generate_compliance_report(&chain, Some(&pipeline.verifier)))
}

/// Run Scenario 1: Glucose Monitoring Chain.
pub fn run_scenario(config: &ComplianceConfig) -> CustosResult<()> {
    println!("=== Scenario 1: Glucose Monitoring Chain ===");
    println!();
    println!("  Patient: {}", PATIENT_ID);
    println!();

    let pipeline = DemoPipeline::new(config)?;
    let report = run_chain(&pipeline)?;

    println!();
    println!("  Report {}", report.report_id);
    println!("  Status:               {}", report.compliance_status);
    println!("  Records:              {}", report.total_logs);
    println!(
        "  Hash matches:         {}/{}",
        report.computed_hash_matches, report.total_logs
    );
    println!(
        "  Signatures verified:  {}/{}",
        report.signature_verified, report.total_logs
    );
    for recommendation in &report.recommendations {
        println!("    - {}", recommendation);
    }

    let logged = pipeline
        .writer
        .write(report_audit_fields(&report, "compliance_officer")?)?;
    println!();
    println!(
        "  Report audit-logged as record {}… (hash {}…)",
        short(Some(logged.record_id.as_str())),
        short(logged.current_hash.as_deref()),
    );
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use custos_contracts::{compliance::ComplianceStatus, record::ActionType};
    use custos_crypto::fixtures::TEST_KEY_BITS;

    use super::*;
    use crate::scenarios::healthcare_config;

    #[test]
    fn test_embedded_profile_loads() {
        let config = healthcare_config().unwrap();
        assert_eq!(config.records.system_version, "MPS-v1.0");
        assert_eq!(config.report.warning_hash_mismatch_limit, 5);
    }

    #[test]
    fn test_monitoring_chain_is_compliant() {
        let config = healthcare_config().unwrap();
        let pipeline = DemoPipeline::with_key_bits(&config, TEST_KEY_BITS).unwrap();
        let report = run_chain(&pipeline).unwrap();

        assert_eq!(report.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(report.total_logs, 6);
        assert_eq!(report.signature_verified, 6);
        assert_eq!(report.action_counts.get("update"), Some(&3));
        assert_eq!(report.action_counts.get("correction"), Some(&1));

        let chain = pipeline.read_chain("global").unwrap();
        assert_eq!(chain[5].action, ActionType::Correction);
        assert_eq!(chain[5].target_id, chain[3].record_id);
        assert!(chain
            .iter()
            .all(|r| r.system_version == "MPS-v1.0" && r.signing_key_id.is_some()));
    }
}
