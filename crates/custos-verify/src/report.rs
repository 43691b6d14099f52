//! Compliance reporting over an ordered chain of records.
//!
//! The reporter walks a chain from the genesis sentinel, verifying every
//! record against the *stored* `current_hash` of its predecessor.  A single
//! tampered record is therefore flagged on its own and does not cascade
//! into the records after it, unless its stored hash itself was changed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use custos_config::{ComplianceConfig, ReportSettings};
use custos_contracts::{
    compliance::{ComplianceReport, ComplianceStatus, IntegrityReport, IntegrityViolation},
    error::{CustosError, CustosResult},
    record::{ActionType, AuditRecord, Outcome, RecordFields},
};
use custos_core::traits::{SignatureVerifier, TimeSource};

use crate::integrity::IntegrityVerifier;

/// Action label and target type under which reports are audit-logged.
pub const COMPLIANCE_REPORT_ACTION: &str = "compliance_report";

/// Folds per-record integrity results into a `ComplianceReport`.
pub struct ComplianceReporter {
    integrity: IntegrityVerifier,
    genesis_hash: String,
    settings: ReportSettings,
    clock: Arc<dyn TimeSource>,
}

impl ComplianceReporter {
    pub fn new(config: &ComplianceConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            integrity: IntegrityVerifier::new(config.integrity.clone(), clock.clone()),
            genesis_hash: config.chain.genesis_hash.clone(),
            settings: config.report.clone(),
            clock,
        }
    }

    /// One `IntegrityReport` per record, in chain order.
    pub fn verify_records(
        &self,
        records: &[AuditRecord],
        verifier: Option<&dyn SignatureVerifier>,
    ) -> Vec<IntegrityReport> {
        let mut expected_prev = self.genesis_hash.as_str();
        let mut reports = Vec::with_capacity(records.len());

        for record in records {
            reports.push(self.integrity.verify_integrity(record, verifier, expected_prev));
            expected_prev = record.current_hash.as_deref().unwrap_or("");
        }

        reports
    }

    /// Verify every record and aggregate the results.
    ///
    /// Without a `verifier` the signature counters stay at zero.
    pub fn generate_compliance_report(
        &self,
        records: &[AuditRecord],
        verifier: Option<&dyn SignatureVerifier>,
    ) -> ComplianceReport {
        let reports = self.verify_records(records, verifier);

        let mut successful_actions = 0;
        let mut failed_actions = 0;
        let mut unauthorized_attempts = 0;
        let mut data_integrity_violations = 0;
        let mut computed_hash_matches = 0;
        let mut computed_hash_mismatches = 0;
        let mut signature_verified = 0;
        let mut signature_failed = 0;
        let mut action_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut flagged_records = Vec::new();

        for (record, report) in records.iter().zip(&reports) {
            match record.outcome {
                Outcome::Success => successful_actions += 1,
                Outcome::Failure => failed_actions += 1,
            }
            if record.actor_id == self.settings.unauthorized_actor {
                unauthorized_attempts += 1;
            }
            *action_counts
                .entry(record.action.as_str().to_string())
                .or_default() += 1;

            if report.has_hash_mismatch() {
                computed_hash_mismatches += 1;
            } else {
                computed_hash_matches += 1;
            }

            if verifier.is_some() {
                let signature_bad = report
                    .violations
                    .iter()
                    .any(|v| matches!(v, IntegrityViolation::SignatureInvalid { .. }));
                if signature_bad {
                    signature_failed += 1;
                } else {
                    signature_verified += 1;
                }
            }

            data_integrity_violations += report.violations.len();
            if !report.valid {
                flagged_records.push(record.record_id.clone());
            }
        }

        let compliance_status = self.verdict(
            computed_hash_mismatches,
            signature_failed,
            data_integrity_violations,
        );
        let generated_at = self.clock.now();
        let terminal_hash = records
            .last()
            .and_then(|r| r.current_hash.as_deref())
            .unwrap_or(&self.genesis_hash);

        let report = ComplianceReport {
            report_id: report_id(generated_at, terminal_hash, records.len()),
            generated_at,
            period_start: records.iter().map(|r| r.timestamp).min(),
            period_end: records.iter().map(|r| r.timestamp).max(),
            total_logs: records.len(),
            successful_actions,
            failed_actions,
            unauthorized_attempts,
            data_integrity_violations,
            computed_hash_matches,
            computed_hash_mismatches,
            signature_verified,
            signature_failed,
            action_counts,
            flagged_records,
            compliance_status,
            notes: format!(
                "{} records verified: {} hash mismatches, {} signature failures, {} integrity violations",
                records.len(),
                computed_hash_mismatches,
                signature_failed,
                data_integrity_violations
            ),
            recommendations: self
                .settings
                .recommendations
                .for_status(compliance_status)
                .to_vec(),
        };

        match compliance_status {
            ComplianceStatus::Compliant => info!(
                report_id = %report.report_id,
                total_logs = report.total_logs,
                "compliance report generated"
            ),
            _ => warn!(
                report_id = %report.report_id,
                status = %compliance_status,
                hash_mismatches = computed_hash_mismatches,
                signature_failures = signature_failed,
                violations = data_integrity_violations,
                "compliance report flags integrity problems"
            ),
        }

        report
    }

    fn verdict(
        &self,
        hash_mismatches: usize,
        signature_failures: usize,
        violations: usize,
    ) -> ComplianceStatus {
        if hash_mismatches == 0 && signature_failures == 0 && violations == 0 {
            ComplianceStatus::Compliant
        } else if hash_mismatches <= self.settings.warning_hash_mismatch_limit {
            ComplianceStatus::Warning
        } else {
            ComplianceStatus::Violation
        }
    }
}

/// `RPT-` followed by 16 hex characters of SHA-256 over the generation time,
/// the chain's terminal hash and the record count.
fn report_id(generated_at: DateTime<Utc>, terminal_hash: &str, total: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(generated_at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
    hasher.update(b"|");
    hasher.update(terminal_hash.as_bytes());
    hasher.update(b"|");
    hasher.update(total.to_string().as_bytes());
    format!("RPT-{}", hex::encode(&hasher.finalize()[..8]))
}

/// Fields for audit-logging `report` through the normal write pipeline.
///
/// The full report JSON goes into `new_value`; the summary line becomes the
/// description.
pub fn report_audit_fields(
    report: &ComplianceReport,
    actor_id: impl Into<String>,
) -> CustosResult<RecordFields> {
    let body = to_json(report)?;
    let fields = RecordFields::new(
        actor_id,
        ActionType::Other(COMPLIANCE_REPORT_ACTION.to_string()),
        COMPLIANCE_REPORT_ACTION,
        report.report_id.clone(),
    )
    .with_description(format!("{}: {}", report.compliance_status, report.notes))
    .with_values(None, Some(body));
    Ok(fields)
}

/// Serialize `report` as compact JSON.
pub fn to_json(report: &ComplianceReport) -> CustosResult<String> {
    serde_json::to_string(report).map_err(|e| CustosError::Encoding {
        reason: format!("failed to serialize report '{}': {}", report.report_id, e),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
