//! The audit record: one link in a tamper-evident chain.
//!
//! An `AuditRecord` moves through four states in a fixed order:
//!
//!   built → hashed → signed → encrypted (sealed)
//!
//! The chain fields (`previous_hash`, `current_hash`, `signature`,
//! `encrypted_payload`) start empty and are filled in by the hash chainer,
//! signer, and encryptor respectively.  Once `current_hash` is set the
//! provenance fields are frozen; corrections are new records built with
//! [`RecordFields::correction_of`].

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seven years, the common retention floor for clinical audit trails.
pub const DEFAULT_RETENTION_DAYS: u32 = 2555;

/// Target type used by correction records that point back at another record.
pub const AUDIT_RECORD_TARGET: &str = "audit_record";

// ── Enumerations ──────────────────────────────────────────────────────────────

/// What kind of action the audited actor performed.
///
/// Serialized as a plain lowercase string (`"create"`, `"update"`, …).  Any
/// string outside the known set round-trips as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Create,
    Read,
    Update,
    Delete,
    /// A new record amending an earlier one.
    Correction,
    /// Deployment-specific action label, e.g. `"export"`.
    Other(String),
}

impl ActionType {
    /// The stable string form used in canonical encoding and reports.
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::Create => "create",
            ActionType::Read => "read",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::Correction => "correction",
            ActionType::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for ActionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "create" => ActionType::Create,
            "read" => ActionType::Read,
            "update" => ActionType::Update,
            "delete" => ActionType::Delete,
            "correction" => ActionType::Correction,
            _ => ActionType::Other(s),
        }
    }
}

impl From<&str> for ActionType {
    fn from(s: &str) -> Self {
        ActionType::from(s.to_string())
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        match action {
            ActionType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Whether the audited action succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

// ── Supporting structures ─────────────────────────────────────────────────────

/// Where the request that triggered the action came from.
///
/// Every field is optional; absent and empty values hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

/// Regulatory metadata attached to every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceMetadata {
    /// Applicable regimes, e.g. `"FDA-21CFRPart11"`, `"HIPAA"`.
    pub tags: BTreeSet<String>,

    /// How long an external archival process must keep the record.
    pub retention_days: u32,

    /// Set when the record is sealed.  Never cleared.
    pub immutable: bool,
}

impl Default for ComplianceMetadata {
    fn default() -> Self {
        Self {
            tags: BTreeSet::new(),
            retention_days: DEFAULT_RETENTION_DAYS,
            immutable: false,
        }
    }
}

// ── AuditRecord ───────────────────────────────────────────────────────────────

/// A single audited action plus the cryptographic fields that chain, sign,
/// and seal it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Globally unique, assigned at build time.
    pub record_id: String,

    /// Trusted-source time at which the action completed.
    pub timestamp: DateTime<Utc>,

    pub actor_id: String,
    pub action: ActionType,
    pub target_type: String,
    pub target_id: String,
    pub description: String,

    /// Opaque snapshot of the target before the action (e.g. JSON).
    pub previous_value: Option<String>,

    /// Opaque snapshot of the target after the action.
    pub new_value: Option<String>,

    pub outcome: Outcome,
    pub error_detail: Option<String>,

    /// Version of the software that produced the record.
    pub system_version: String,

    #[serde(default)]
    pub client: ClientContext,

    /// Partition key for per-tenant chains.
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub compliance: ComplianceMetadata,

    /// `current_hash` of the preceding record, or the chain's genesis value.
    pub previous_hash: Option<String>,

    /// Lowercase hex SHA-256 over the canonical fields and `previous_hash`.
    pub current_hash: Option<String>,

    /// Base64 RSA signature over the SHA-256 of `current_hash`.
    pub signature: Option<String>,

    /// Opaque hint telling verifiers which public key to use.
    pub signing_key_id: Option<String>,

    /// Base64 `nonce || ciphertext || tag` of the full serialized record.
    pub encrypted_payload: Option<String>,
}

impl AuditRecord {
    /// True once the hash chainer has stamped this record.
    pub fn is_hashed(&self) -> bool {
        self.current_hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// True once the signer has attached a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// True when every write-path stage has run.
    pub fn is_sealed(&self) -> bool {
        self.is_hashed()
            && self.is_signed()
            && self.encrypted_payload.as_deref().is_some_and(|p| !p.is_empty())
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

/// Caller-supplied provenance for a new record.
///
/// Construct with [`RecordFields::new`], adjust with the `with_*` helpers, and
/// turn into a record with [`build_record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    /// Leave `None` to have a UUID v4 assigned.
    pub record_id: Option<String>,
    pub actor_id: String,
    pub action: ActionType,
    pub target_type: String,
    pub target_id: String,
    pub description: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
    pub system_version: String,
    pub client: ClientContext,
    pub tenant_id: Option<String>,
    pub tags: BTreeSet<String>,
    pub retention_days: Option<u32>,
}

impl RecordFields {
    /// Start a successful action by `actor_id` on `target_type/target_id`.
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<ActionType>,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            record_id: None,
            actor_id: actor_id.into(),
            action: action.into(),
            target_type: target_type.into(),
            target_id: target_id.into(),
            description: String::new(),
            previous_value: None,
            new_value: None,
            outcome: Outcome::Success,
            error_detail: None,
            system_version: String::new(),
            client: ClientContext::default(),
            tenant_id: None,
            tags: BTreeSet::new(),
            retention_days: None,
        }
    }

    /// Fields for a record that amends `original`.
    ///
    /// The correction targets the original record by id; the original itself
    /// is never touched.
    pub fn correction_of(
        original: &AuditRecord,
        actor_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut fields = Self::new(
            actor_id,
            ActionType::Correction,
            AUDIT_RECORD_TARGET,
            original.record_id.clone(),
        );
        fields.description = description.into();
        fields.tenant_id = original.tenant_id.clone();
        fields.tags = original.compliance.tags.clone();
        fields.retention_days = Some(original.compliance.retention_days);
        fields
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach before/after snapshots of the target.
    pub fn with_values(
        mut self,
        previous_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.previous_value = previous_value;
        self.new_value = new_value;
        self
    }

    /// Mark the action as failed with a human-readable reason.
    pub fn failed(mut self, error_detail: impl Into<String>) -> Self {
        self.outcome = Outcome::Failure;
        self.error_detail = Some(error_detail.into());
        self
    }

    pub fn with_system_version(mut self, version: impl Into<String>) -> Self {
        self.system_version = version.into();
        self
    }

    pub fn with_client(mut self, client: ClientContext) -> Self {
        self.client = client;
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }
}

/// Build an unhashed record from caller fields and a trusted timestamp.
///
/// All chain fields start empty.  The returned record is the only mutable
/// stage of the lifecycle: it must be hashed before it is signed.
pub fn build_record(fields: RecordFields, timestamp: DateTime<Utc>) -> AuditRecord {
    let record_id = fields
        .record_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    AuditRecord {
        record_id,
        timestamp,
        actor_id: fields.actor_id,
        action: fields.action,
        target_type: fields.target_type,
        target_id: fields.target_id,
        description: fields.description,
        previous_value: fields.previous_value,
        new_value: fields.new_value,
        outcome: fields.outcome,
        error_detail: fields.error_detail,
        system_version: fields.system_version,
        client: fields.client,
        tenant_id: fields.tenant_id,
        compliance: ComplianceMetadata {
            tags: fields.tags,
            retention_days: fields.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
            immutable: false,
        },
        previous_hash: None,
        current_hash: None,
        signature: None,
        signing_key_id: None,
        encrypted_payload: None,
    }
}
