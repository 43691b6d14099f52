//! Trust-boundary trait definitions for the CUSTOS audit pipeline.
//!
//! Everything the core needs from the outside world comes in through one of
//! these traits:
//!
//! - `TimeSource`       : trusted wall-clock time for new records
//! - `RecordSigner`     : private-key holder that signs `current_hash`
//! - `SignatureVerifier`: public-key holder that checks those signatures
//! - `RecordCipher`     : symmetric-key holder that seals records at rest
//! - `AuditStore`       : durable, append-only record storage
//!
//! Implementations are resolved by the caller before any core operation runs;
//! none of these calls is expected to block on I/O inside the core.

use chrono::{DateTime, Utc};

use custos_contracts::{error::CustosResult, record::AuditRecord};

/// A trusted source of the current time.
///
/// Production deployments back this with a synchronized clock; the core only
/// consumes the value and never talks NTP itself.
pub trait TimeSource: Send + Sync {
    /// Return the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Produces signatures over a record's chain hash.
pub trait RecordSigner: Send + Sync {
    /// Sign `record.current_hash`, store the encoded signature on the record,
    /// and return it.
    ///
    /// Must fail with `CustosError::Precondition` when the record has not
    /// been hashed yet.
    fn sign(&self, record: &mut AuditRecord) -> CustosResult<String>;

    /// Opaque identifier recorded alongside each signature, if any.
    fn key_id(&self) -> Option<&str> {
        None
    }
}

/// Checks signatures produced by a `RecordSigner`.
///
/// Verification is read-only and may run concurrently on the same record.
pub trait SignatureVerifier: Send + Sync {
    /// Return `Ok(true)` for a valid signature over the stored
    /// `current_hash`, `Ok(false)` for a well-formed but invalid one, and
    /// `Err(CustosError::MalformedSignature)` when the signature is missing
    /// or cannot be decoded.
    fn verify(&self, record: &AuditRecord) -> CustosResult<bool>;
}

/// Authenticated at-rest encryption of whole records.
pub trait RecordCipher: Send + Sync {
    /// Encrypt the full record, store the encoded ciphertext in
    /// `record.encrypted_payload`, and return it.
    fn encrypt(&self, record: &mut AuditRecord) -> CustosResult<String>;

    /// Decrypt and authenticate `payload` back into a record.
    ///
    /// Must fail with `CustosError::Decryption` on any authentication
    /// failure; corrupted plaintext is never returned.
    fn decrypt(&self, payload: &str) -> CustosResult<AuditRecord>;
}

/// Durable, append-only storage for sealed records.
///
/// Records are grouped into named chains (see the deployment's chain scope).
/// The store never updates or deletes a record.
pub trait AuditStore: Send + Sync {
    /// The `current_hash` of the last record in `chain`, or `None` when the
    /// chain is empty.
    fn tail_hash(&self, chain: &str) -> CustosResult<Option<String>>;

    /// Append a sealed record to `chain`.
    ///
    /// Implementations must reject the append with
    /// `CustosError::ChainConflict` when `record.previous_hash` does not
    /// match the current tail, and with `CustosError::Precondition` when the
    /// record is not fully sealed.
    fn append(&self, chain: &str, record: AuditRecord) -> CustosResult<()>;

    /// All records of `chain` in append order.
    fn read_chain(&self, chain: &str) -> CustosResult<Vec<AuditRecord>>;
}
