//! Canonical byte encoding of an audit record's hashed fields.
//!
//! The encoding is the hashing input for the chain, so it must be both
//! deterministic and injective:
//!
//! - fields appear in a fixed order, each as `name=<len>:<value>;` where
//!   `<len>` is the UTF-8 byte length of `<value>` in decimal, so no value can
//!   masquerade as a delimiter;
//! - the timestamp is always UTC with nanosecond precision
//!   (`2024-01-31T08:15:00.000000000Z`);
//! - `None` and `Some("")` encode identically (`name=0:;`);
//! - the tag set is written as a count followed by each tag in sorted order.
//!
//! Chain fields (`previous_hash`, `current_hash`, `signature`,
//! `encrypted_payload`, `signing_key_id`) and the `immutable` flag are not
//! part of the encoding; the chainer appends `previous_hash` itself.

use chrono::Datelike;

use crate::{
    error::{CustosError, CustosResult},
    record::AuditRecord,
};

/// Version marker written first so a future layout change cannot collide
/// with this one.
pub const CANONICAL_VERSION: &str = "custos-record-v1";

/// Fixed-width UTC timestamp layout used in the encoding.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Encode the hashed fields of `record`.
///
/// Fails with `CustosError::Encoding` when the timestamp falls outside years
/// 0000–9999, where the fixed-width layout no longer holds.
pub fn canonical_bytes(record: &AuditRecord) -> CustosResult<Vec<u8>> {
    let year = record.timestamp.year();
    if !(0..=9999).contains(&year) {
        return Err(CustosError::Encoding {
            reason: format!(
                "timestamp year {} of record '{}' cannot be canonicalized",
                year, record.record_id
            ),
        });
    }

    let mut buf = Vec::with_capacity(256);
    push_field(&mut buf, "v", CANONICAL_VERSION);
    push_field(&mut buf, "record_id", &record.record_id);
    push_field(
        &mut buf,
        "timestamp",
        &record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
    );
    push_field(&mut buf, "actor_id", &record.actor_id);
    push_field(&mut buf, "action", record.action.as_str());
    push_field(&mut buf, "target_type", &record.target_type);
    push_field(&mut buf, "target_id", &record.target_id);
    push_field(&mut buf, "description", &record.description);
    push_opt(&mut buf, "previous_value", &record.previous_value);
    push_opt(&mut buf, "new_value", &record.new_value);
    push_field(&mut buf, "outcome", record.outcome.as_str());
    push_opt(&mut buf, "error_detail", &record.error_detail);
    push_field(&mut buf, "system_version", &record.system_version);
    push_opt(&mut buf, "ip_address", &record.client.ip_address);
    push_opt(&mut buf, "user_agent", &record.client.user_agent);
    push_opt(&mut buf, "session_id", &record.client.session_id);
    push_opt(&mut buf, "tenant_id", &record.tenant_id);
    push_field(
        &mut buf,
        "retention_days",
        &record.compliance.retention_days.to_string(),
    );
    push_field(&mut buf, "tags", &record.compliance.tags.len().to_string());
    for tag in &record.compliance.tags {
        push_field(&mut buf, "tag", tag);
    }

    Ok(buf)
}

fn push_field(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.push(b'=');
    buf.extend_from_slice(value.len().to_string().as_bytes());
    buf.push(b':');
    buf.extend_from_slice(value.as_bytes());
    buf.push(b';');
}

fn push_opt(buf: &mut Vec<u8>, name: &str, value: &Option<String>) {
    push_field(buf, name, value.as_deref().unwrap_or(""));
}
