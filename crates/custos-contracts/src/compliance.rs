//! Integrity findings and compliance report types.
//!
//! The integrity verifier produces one `IntegrityReport` per record; the
//! compliance reporter folds many of them into a `ComplianceReport` for
//! regulator consumption.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single named reason a record failed integrity verification.
///
/// Violations are findings, not errors: the verifier accumulates every one it
/// finds instead of stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityViolation {
    /// The timestamp is further in the future than the clock-skew tolerance.
    TimestampInFuture {
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// The timestamp is older than the configured retention horizon.
    TimestampTooOld {
        timestamp: DateTime<Utc>,
        horizon_days: u32,
    },

    /// `previous_hash` does not link to the expected predecessor.
    PreviousHashMismatch { expected: String, actual: String },

    /// The stored `current_hash` differs from the recomputed one.
    CurrentHashMismatch { expected: String, actual: String },

    /// The hash could not be recomputed at all.
    HashNotRecomputable { reason: String },

    /// The signature is missing, malformed, or does not verify.
    SignatureInvalid { reason: String },

    /// The record carries no encrypted payload.
    MissingEncryptedPayload,

    /// A required identifying field is empty.
    MissingField { field: String },
}

impl IntegrityViolation {
    /// True for violations that mean the stored hash cannot be trusted.
    pub fn is_hash_mismatch(&self) -> bool {
        matches!(
            self,
            IntegrityViolation::CurrentHashMismatch { .. }
                | IntegrityViolation::HashNotRecomputable { .. }
        )
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::TimestampInFuture { timestamp, now } => {
                write!(f, "timestamp {} is in the future (now {})", timestamp, now)
            }
            IntegrityViolation::TimestampTooOld {
                timestamp,
                horizon_days,
            } => write!(
                f,
                "timestamp {} is older than the {}-day horizon",
                timestamp, horizon_days
            ),
            IntegrityViolation::PreviousHashMismatch { expected, actual } => write!(
                f,
                "hash chain broken (expected previous hash {}, found {})",
                expected, actual
            ),
            IntegrityViolation::CurrentHashMismatch { expected, actual } => write!(
                f,
                "hash mismatch (recomputed {}, stored {})",
                expected, actual
            ),
            IntegrityViolation::HashNotRecomputable { reason } => {
                write!(f, "hash could not be recomputed: {}", reason)
            }
            IntegrityViolation::SignatureInvalid { reason } => {
                write!(f, "signature verification failed: {}", reason)
            }
            IntegrityViolation::MissingEncryptedPayload => {
                f.write_str("encrypted payload is missing")
            }
            IntegrityViolation::MissingField { field } => {
                write!(f, "required field '{}' is empty", field)
            }
        }
    }
}

/// The outcome of verifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub record_id: String,

    /// True only when `violations` is empty.
    pub valid: bool,

    /// Every finding, in check order.
    pub violations: Vec<IntegrityViolation>,
}

impl IntegrityReport {
    pub fn new(record_id: impl Into<String>, violations: Vec<IntegrityViolation>) -> Self {
        Self {
            record_id: record_id.into(),
            valid: violations.is_empty(),
            violations,
        }
    }

    pub fn has_hash_mismatch(&self) -> bool {
        self.violations.iter().any(IntegrityViolation::is_hash_mismatch)
    }
}

/// Overall verdict of a compliance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    Violation,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::Warning => "WARNING",
            ComplianceStatus::Violation => "VIOLATION",
        })
    }
}

/// Aggregated verification results over an ordered chain of records.
///
/// Contains counts and record ids only, never raw error detail, so the
/// document can be handed to non-engineers and regulators as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Derived from the generation time and the chain's terminal hash.
    pub report_id: String,
    pub generated_at: DateTime<Utc>,

    /// Earliest record timestamp, `None` for an empty chain.
    pub period_start: Option<DateTime<Utc>>,

    /// Latest record timestamp, `None` for an empty chain.
    pub period_end: Option<DateTime<Utc>>,

    pub total_logs: usize,
    pub successful_actions: usize,
    pub failed_actions: usize,
    pub unauthorized_attempts: usize,
    pub data_integrity_violations: usize,
    pub computed_hash_matches: usize,
    pub computed_hash_mismatches: usize,
    pub signature_verified: usize,
    pub signature_failed: usize,

    /// Record count per action label (`"create"`, `"update"`, …).
    pub action_counts: BTreeMap<String, usize>,

    /// Ids of records with at least one integrity violation, in chain order.
    pub flagged_records: Vec<String>,

    pub compliance_status: ComplianceStatus,
    pub notes: String,
    pub recommendations: Vec<String>,
}
