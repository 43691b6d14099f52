//! Error types for the CUSTOS audit pipeline.
//!
//! Structural failures (bad encoding, out-of-order calls, bad keys, failed
//! decryption) are errors and stop the current operation.  Integrity findings
//! are NOT errors: they are collected as
//! [`IntegrityViolation`](crate::compliance::IntegrityViolation)s so a single
//! verification pass reports everything it found.

use thiserror::Error;

/// The unified error type for CUSTOS.
#[derive(Debug, Error)]
pub enum CustosError {
    /// A record could not be canonicalized or serialized.
    ///
    /// Always a caller bug, e.g. a field that cannot be represented.
    #[error("encoding error: {reason}")]
    Encoding { reason: String },

    /// An operation was invoked out of order, e.g. signing before hashing or
    /// re-hashing a record that is already part of a chain.
    #[error("precondition violated: {reason}")]
    Precondition { reason: String },

    /// A key had the wrong size or could not be parsed.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The authenticated cipher rejected a payload.
    ///
    /// Either the payload was tampered with or the wrong key was used.  Never
    /// downgraded to an empty result.
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },

    /// A signature was missing or could not be decoded.
    ///
    /// Distinct from a well-formed signature that simply does not verify,
    /// which is reported as `Ok(false)`.
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    /// The signing primitive itself failed.
    #[error("signing failed: {reason}")]
    Signing { reason: String },

    /// A compare-and-append found a different chain tail than the one the
    /// record was linked against.
    #[error("chain '{chain}' conflict: record links to {actual} but tail is {expected}")]
    ChainConflict {
        chain: String,
        expected: String,
        actual: String,
    },

    /// The audit store could not append or read records.
    #[error("audit store failure: {reason}")]
    StoreFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the CUSTOS crates.
pub type CustosResult<T> = Result<T, CustosError>;
