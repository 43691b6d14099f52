//! Deployment configuration schema.
//!
//! A `ComplianceConfig` is deserialized from TOML.  Every section and field
//! has a default, so an empty document yields a working configuration.
//!
//! Example:
//! ```toml
//! [chain]
//! genesis_hash = "genesis"
//! scope = "per-tenant"
//!
//! [integrity]
//! clock_skew_secs = 60
//! max_age_days = 365
//!
//! [report]
//! unauthorized_actor = "unauthorized"
//! warning_hash_mismatch_limit = 5
//!
//! [records]
//! system_version = "MPS-v1.0"
//! retention_days = 2555
//! compliance_tags = ["FDA-21CFRPart11", "HIPAA"]
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use custos_contracts::{
    compliance::ComplianceStatus,
    record::{AuditRecord, RecordFields, DEFAULT_RETENTION_DAYS},
};

/// Default genesis sentinel: 64 hex zeros, never a real SHA-256 output in
/// practice, so the first record of a chain is unambiguous.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    pub chain: ChainSettings,
    pub integrity: IntegritySettings,
    pub report: ReportSettings,
    pub records: RecordSettings,
}

// ── [chain] ───────────────────────────────────────────────────────────────────

/// How records are partitioned into independent chains.
///
/// Each chain has its own tail hash and its own single-writer constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainScope {
    /// One chain for the whole deployment.
    #[default]
    Global,
    /// One chain per `target_type`.
    PerTargetType,
    /// One chain per `tenant_id`; records without a tenant share `"default"`.
    PerTenant,
}

impl ChainScope {
    /// The name of the chain `record` belongs to.
    pub fn chain_key(&self, record: &AuditRecord) -> String {
        match self {
            ChainScope::Global => "global".to_string(),
            ChainScope::PerTargetType => format!("target:{}", record.target_type),
            ChainScope::PerTenant => format!(
                "tenant:{}",
                record
                    .tenant_id
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .unwrap_or("default")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// `previous_hash` of the first record in every chain.  Fixed per
    /// deployment; changing it invalidates every existing chain.
    pub genesis_hash: String,
    pub scope: ChainScope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            genesis_hash: GENESIS_HASH.to_string(),
            scope: ChainScope::Global,
        }
    }
}

// ── [integrity] ───────────────────────────────────────────────────────────────

/// Largest accepted `integrity.clock_skew_secs` (one day).
pub const MAX_CLOCK_SKEW_SECS: i64 = 86_400;

/// Largest accepted `integrity.max_age_days` (one hundred years).
pub const MAX_AGE_DAYS_LIMIT: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegritySettings {
    /// How far in the future a timestamp may be before it is flagged.
    pub clock_skew_secs: i64,

    /// Records older than this are flagged as outside the retention horizon.
    pub max_age_days: u32,
}

impl IntegritySettings {
    /// `None` when the value does not fit a `Duration`.
    pub fn clock_skew(&self) -> Option<Duration> {
        Duration::try_seconds(self.clock_skew_secs)
    }

    pub fn max_age(&self) -> Option<Duration> {
        Duration::try_days(i64::from(self.max_age_days))
    }
}

impl Default for IntegritySettings {
    fn default() -> Self {
        Self {
            clock_skew_secs: 60,
            max_age_days: 365,
        }
    }
}

// ── [report] ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Actor id that marks an unauthorized attempt.
    pub unauthorized_actor: String,

    /// Highest hash-mismatch count that still yields WARNING rather than
    /// VIOLATION.
    pub warning_hash_mismatch_limit: usize,

    pub recommendations: Recommendations,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            unauthorized_actor: "unauthorized".to_string(),
            warning_hash_mismatch_limit: 5,
            recommendations: Recommendations::default(),
        }
    }
}

/// Recommended actions attached to each verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub compliant: Vec<String>,
    pub warning: Vec<String>,
    pub violation: Vec<String>,
}

impl Recommendations {
    pub fn for_status(&self, status: ComplianceStatus) -> &[String] {
        match status {
            ComplianceStatus::Compliant => &self.compliant,
            ComplianceStatus::Warning => &self.warning,
            ComplianceStatus::Violation => &self.violation,
        }
    }
}

impl Default for Recommendations {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            compliant: owned(&["Current state: compliant"]),
            warning: owned(&[
                "Integrity problems found in some records",
                "Re-verify the affected records",
                "Perform a system audit",
            ]),
            violation: owned(&[
                "Multiple integrity violations detected",
                "Open an immediate audit investigation",
                "Notify the health-data regulator",
                "Re-verify affected patient records",
            ]),
        }
    }
}

// ── [records] ─────────────────────────────────────────────────────────────────

/// Defaults stamped onto new records by the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSettings {
    pub system_version: String,
    pub retention_days: u32,
    pub compliance_tags: Vec<String>,
}

impl RecordSettings {
    /// Fill fields the caller left unset.  Caller-supplied values always win;
    /// tags are merged.
    pub fn apply(&self, mut fields: RecordFields) -> RecordFields {
        if fields.system_version.is_empty() {
            fields.system_version = self.system_version.clone();
        }
        if fields.retention_days.is_none() {
            fields.retention_days = Some(self.retention_days);
        }
        fields.tags.extend(self.compliance_tags.iter().cloned());
        fields
    }
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            system_version: concat!("custos-", env!("CARGO_PKG_VERSION")).to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            compliance_tags: vec!["FDA-21CFRPart11".to_string(), "HIPAA".to_string()],
        }
    }
}
