//! Hash-chain primitives: hashing and chain linkage verification.
//!
//! Hash input layout (bytes, in order):
//!   1. canonical encoding of the record (see `custos_contracts::canonical`)
//!   2. `previous_hash=<len>:<previous_hash>;`
//!
//! The digest is SHA-256 rendered as 64 lowercase hex characters.  The
//! previous hash is length-prefixed like every other field, so a hash can
//! never be shifted into the record body or vice versa.

use sha2::{Digest, Sha256};
use tracing::debug;

use custos_contracts::{
    canonical::canonical_bytes,
    error::{CustosError, CustosResult},
    record::AuditRecord,
};

/// Compute the chain hash of `record` linked to `previous_hash`, without
/// touching the record.
///
/// Pure: identical inputs always produce identical output.
pub fn chain_hash(record: &AuditRecord, previous_hash: &str) -> CustosResult<String> {
    let canonical = canonical_bytes(record)?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hasher.update(b"previous_hash=");
    hasher.update(previous_hash.len().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(previous_hash.as_bytes());
    hasher.update(b";");

    Ok(hex::encode(hasher.finalize()))
}

/// Link `record` to `previous_hash` and stamp its `current_hash`.
///
/// Sets `record.previous_hash` and `record.current_hash` and returns the new
/// hash.
///
/// # Errors
///
/// - `CustosError::Precondition` if the record is already hashed; a hashed
///   record is immutable and may not be re-linked.
/// - `CustosError::Encoding` if the record cannot be canonicalized.  The
///   record is left untouched in that case.
pub fn compute_hash(record: &mut AuditRecord, previous_hash: &str) -> CustosResult<String> {
    if record.is_hashed() {
        return Err(CustosError::Precondition {
            reason: format!(
                "record '{}' is already hashed and cannot be re-linked",
                record.record_id
            ),
        });
    }

    let current_hash = chain_hash(record, previous_hash)?;
    debug!(
        record_id = %record.record_id,
        hash_prefix = %&current_hash[..16],
        "chain hash computed"
    );

    record.previous_hash = Some(previous_hash.to_string());
    record.current_hash = Some(current_hash.clone());
    Ok(current_hash)
}

/// Recompute a stored record's hash from its own fields and its own stored
/// `previous_hash` (empty when absent).
pub fn recompute_hash(record: &AuditRecord) -> CustosResult<String> {
    chain_hash(record, record.previous_hash.as_deref().unwrap_or(""))
}

/// Quick pass/fail check of a whole chain.
///
/// Returns `true` when, for every record:
///
/// 1. **Prev-hash linkage**: `previous_hash` equals the preceding record's
///    `current_hash` (or `genesis_hash` for the first record).
/// 2. **Hash correctness**: `current_hash` equals the recomputed value.
///
/// Returns `false` at the first mismatch.  An empty chain is valid.  For
/// per-record diagnostics use the integrity verifier instead.
pub fn verify_chain(records: &[AuditRecord], genesis_hash: &str) -> bool {
    let mut expected_prev = genesis_hash.to_string();

    for record in records {
        if record.previous_hash.as_deref() != Some(expected_prev.as_str()) {
            return false;
        }

        let Some(stored) = record.current_hash.as_deref() else {
            return false;
        };
        match recompute_hash(record) {
            Ok(recomputed) if recomputed == stored => {}
            _ => return false,
        }

        expected_prev = stored.to_string();
    }

    true
}
