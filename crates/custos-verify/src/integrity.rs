//! Per-record integrity verification.
//!
//! `IntegrityVerifier` runs six independent checks against one stored
//! record and returns every failure it finds:
//!
//! 1. **Timestamp**: not beyond now plus the clock-skew tolerance and not
//!    older than the retention horizon.
//! 2. **Linkage**: `previous_hash` equals the expected predecessor hash.
//! 3. **Hash**: recomputing over the record's own fields and stored
//!    `previous_hash` reproduces `current_hash`.
//! 4. **Signature**: valid under the supplied public key, when one is given.
//! 5. **Confidentiality**: `encrypted_payload` is present.
//! 6. **Identity**: `record_id`, `actor_id` and `action` are non-empty.
//!
//! Checks are accumulated rather than short-circuited so an investigator
//! sees the full failure set in one pass.

use std::sync::Arc;

use tracing::{debug, warn};

use custos_audit::chain::recompute_hash;
use custos_config::IntegritySettings;
use custos_contracts::{
    compliance::{IntegrityReport, IntegrityViolation},
    record::AuditRecord,
};
use custos_core::traits::{SignatureVerifier, TimeSource};

/// Verifies stored records against a trusted clock and optional public key.
pub struct IntegrityVerifier {
    settings: IntegritySettings,
    clock: Arc<dyn TimeSource>,
}

impl IntegrityVerifier {
    pub fn new(settings: IntegritySettings, clock: Arc<dyn TimeSource>) -> Self {
        Self { settings, clock }
    }

    /// Verify one record.
    ///
    /// `expected_previous_hash` is the genesis sentinel for the first record
    /// of a chain and the predecessor's stored `current_hash` otherwise.
    /// Without a `verifier` the signature check is skipped.
    pub fn verify_integrity(
        &self,
        record: &AuditRecord,
        verifier: Option<&dyn SignatureVerifier>,
        expected_previous_hash: &str,
    ) -> IntegrityReport {
        let mut violations = Vec::new();

        // ── 1. Timestamp ──────────────────────────────────────────────────────
        // A bound that falls outside the representable range is no bound.
        let now = self.clock.now();
        let latest = self
            .settings
            .clock_skew()
            .and_then(|skew| now.checked_add_signed(skew));
        if latest.is_some_and(|latest| record.timestamp > latest) {
            violations.push(IntegrityViolation::TimestampInFuture {
                timestamp: record.timestamp,
                now,
            });
        }
        let earliest = self
            .settings
            .max_age()
            .and_then(|age| now.checked_sub_signed(age));
        if earliest.is_some_and(|earliest| record.timestamp < earliest) {
            violations.push(IntegrityViolation::TimestampTooOld {
                timestamp: record.timestamp,
                horizon_days: self.settings.max_age_days,
            });
        }

        // ── 2. Linkage ────────────────────────────────────────────────────────
        let actual_previous = record.previous_hash.as_deref().unwrap_or("");
        if actual_previous != expected_previous_hash {
            violations.push(IntegrityViolation::PreviousHashMismatch {
                expected: expected_previous_hash.to_string(),
                actual: actual_previous.to_string(),
            });
        }

        // ── 3. Hash ───────────────────────────────────────────────────────────
        match (record.current_hash.as_deref(), recompute_hash(record)) {
            (None, _) => violations.push(IntegrityViolation::HashNotRecomputable {
                reason: "record was never hashed".to_string(),
            }),
            (Some(_), Err(e)) => violations.push(IntegrityViolation::HashNotRecomputable {
                reason: e.to_string(),
            }),
            (Some(stored), Ok(recomputed)) if stored != recomputed => {
                violations.push(IntegrityViolation::CurrentHashMismatch {
                    expected: recomputed,
                    actual: stored.to_string(),
                });
            }
            (Some(_), Ok(_)) => {}
        }

        // ── 4. Signature ──────────────────────────────────────────────────────
        if let Some(verifier) = verifier {
            match verifier.verify(record) {
                Ok(true) => {}
                Ok(false) => violations.push(IntegrityViolation::SignatureInvalid {
                    reason: "signature does not match current hash".to_string(),
                }),
                Err(e) => violations.push(IntegrityViolation::SignatureInvalid {
                    reason: e.to_string(),
                }),
            }
        }

        // ── 5. Confidentiality ────────────────────────────────────────────────
        if record.encrypted_payload.as_deref().map_or(true, str::is_empty) {
            violations.push(IntegrityViolation::MissingEncryptedPayload);
        }

        // ── 6. Identity ───────────────────────────────────────────────────────
        for (field, value) in [
            ("record_id", record.record_id.as_str()),
            ("actor_id", record.actor_id.as_str()),
            ("action", record.action.as_str()),
        ] {
            if value.is_empty() {
                violations.push(IntegrityViolation::MissingField {
                    field: field.to_string(),
                });
            }
        }

        for violation in &violations {
            warn!(record_id = %record.record_id, %violation, "integrity violation");
        }
        debug!(
            record_id = %record.record_id,
            violation_count = violations.len(),
            "integrity verification complete"
        );

        IntegrityReport::new(record.record_id.clone(), violations)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use custos_config::{IntegritySettings, GENESIS_HASH};
    use custos_contracts::compliance::IntegrityViolation;
    use custos_core::{traits::SignatureVerifier, FixedClock};
    use custos_crypto::fixtures::{other_signing_key, test_verifier};
    use custos_crypto::RsaSignatureVerifier;

    use super::IntegrityVerifier;
    use crate::test_support::{sealed_chain, written_at};

    fn verifier_at(offset: Duration) -> IntegrityVerifier {
        IntegrityVerifier::new(
            IntegritySettings::default(),
            Arc::new(FixedClock::new(written_at() + offset)),
        )
    }

    #[test]
    fn test_sealed_record_is_valid() {
        let chain = sealed_chain(1);
        let key = test_verifier();
        let report = verifier_at(Duration::hours(1)).verify_integrity(
            &chain[0],
            Some(&key),
            GENESIS_HASH,
        );
        assert!(report.valid, "unexpected violations: {:?}", report.violations);
        assert_eq!(report.record_id, chain[0].record_id);
    }

    #[test]
    fn test_future_timestamp_beyond_skew() {
        let chain = sealed_chain(1);
        let report =
            verifier_at(Duration::minutes(-2)).verify_integrity(&chain[0], None, GENESIS_HASH);
        assert_eq!(report.violations.len(), 1);
        assert!(matches!(
            report.violations[0],
            IntegrityViolation::TimestampInFuture { .. }
        ));
    }

    #[test]
    fn test_small_skew_is_tolerated() {
        let chain = sealed_chain(1);
        let report =
            verifier_at(Duration::seconds(-30)).verify_integrity(&chain[0], None, GENESIS_HASH);
        assert!(report.valid);
    }

    #[test]
    fn test_timestamp_beyond_horizon() {
        let chain = sealed_chain(1);
        let report =
            verifier_at(Duration::days(366)).verify_integrity(&chain[0], None, GENESIS_HASH);
        assert_eq!(
            report.violations,
            vec![IntegrityViolation::TimestampTooOld {
                timestamp: chain[0].timestamp,
                horizon_days: 365,
            }]
        );
    }

    #[test]
    fn test_unrepresentable_bounds_do_not_panic() {
        let chain = sealed_chain(1);
        let settings = IntegritySettings {
            clock_skew_secs: i64::MAX,
            max_age_days: 4_000_000_000,
        };
        let verifier = IntegrityVerifier::new(
            settings,
            Arc::new(FixedClock::new(written_at() + Duration::hours(1))),
        );
        let report = verifier.verify_integrity(&chain[0], None, GENESIS_HASH);
        assert!(report.valid, "unexpected violations: {:?}", report.violations);
    }

    #[test]
    fn test_unexpected_predecessor() {
        let chain = sealed_chain(2);
        let report =
            verifier_at(Duration::hours(1)).verify_integrity(&chain[1], None, GENESIS_HASH);
        assert_eq!(
            report.violations,
            vec![IntegrityViolation::PreviousHashMismatch {
                expected: GENESIS_HASH.to_string(),
                actual: chain[0].current_hash.clone().unwrap(),
            }]
        );
    }

    #[test]
    fn test_field_edit_is_a_hash_mismatch_only() {
        let mut chain = sealed_chain(1);
        chain[0].new_value = Some("glucose: 250".to_string());

        let key = test_verifier();
        let report = verifier_at(Duration::hours(1)).verify_integrity(
            &chain[0],
            Some(&key),
            GENESIS_HASH,
        );
        assert_eq!(report.violations.len(), 1);
        assert!(report.has_hash_mismatch());
    }

    #[test]
    fn test_hash_edit_breaks_the_signature() {
        let mut chain = sealed_chain(1);
        chain[0].current_hash = Some("ab".repeat(32));

        let key = test_verifier();
        let report = verifier_at(Duration::hours(1)).verify_integrity(
            &chain[0],
            Some(&key),
            GENESIS_HASH,
        );
        assert_eq!(report.violations.len(), 2);
        assert!(report.has_hash_mismatch());
        assert!(matches!(
            report.violations[1],
            IntegrityViolation::SignatureInvalid { .. }
        ));
    }

    #[test]
    fn test_wrong_public_key() {
        let chain = sealed_chain(1);
        let other = RsaSignatureVerifier::new(other_signing_key().to_public_key()).unwrap();
        let report = verifier_at(Duration::hours(1)).verify_integrity(
            &chain[0],
            Some(&other as &dyn SignatureVerifier),
            GENESIS_HASH,
        );
        assert!(matches!(
            report.violations.as_slice(),
            [IntegrityViolation::SignatureInvalid { .. }]
        ));
    }

    #[test]
    fn test_stripped_signature_is_reported() {
        let mut chain = sealed_chain(1);
        chain[0].signature = None;

        let key = test_verifier();
        let report = verifier_at(Duration::hours(1)).verify_integrity(
            &chain[0],
            Some(&key),
            GENESIS_HASH,
        );
        assert!(matches!(
            report.violations.as_slice(),
            [IntegrityViolation::SignatureInvalid { .. }]
        ));

        // Without a key the signature is not examined at all.
        let report = verifier_at(Duration::hours(1)).verify_integrity(&chain[0], None, GENESIS_HASH);
        assert!(report.valid);
    }

    #[test]
    fn test_missing_payload() {
        let mut chain = sealed_chain(1);
        chain[0].encrypted_payload = Some(String::new());
        let report = verifier_at(Duration::hours(1)).verify_integrity(&chain[0], None, GENESIS_HASH);
        assert_eq!(report.violations, vec![IntegrityViolation::MissingEncryptedPayload]);
    }

    #[test]
    fn test_missing_identity_fields_accumulate() {
        let mut chain = sealed_chain(1);
        chain[0].actor_id.clear();
        chain[0].record_id.clear();
        chain[0].encrypted_payload = None;

        let report = verifier_at(Duration::hours(1)).verify_integrity(&chain[0], None, GENESIS_HASH);
        let missing: Vec<_> = report
            .violations
            .iter()
            .filter_map(|v| match v {
                IntegrityViolation::MissingField { field } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["record_id", "actor_id"]);
        assert!(report.violations.contains(&IntegrityViolation::MissingEncryptedPayload));
        assert!(report.has_hash_mismatch(), "both fields are hashed");
    }

    #[test]
    fn test_unhashed_record() {
        let mut chain = sealed_chain(1);
        chain[0].current_hash = None;
        let report = verifier_at(Duration::hours(1)).verify_integrity(&chain[0], None, GENESIS_HASH);
        assert!(matches!(
            report.violations.as_slice(),
            [IntegrityViolation::HashNotRecomputable { .. }]
        ));
    }
}
