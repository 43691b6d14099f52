//! # custos-contracts
//!
//! Shared types, canonical encoding, and error types for CUSTOS, the
//! tamper-evident audit trail for regulated health-data actions.
//!
//! All crates in the workspace import from here. No cryptography lives in
//! this crate: only the record model, its canonical byte layout, and the
//! report and error definitions.

pub mod canonical;
pub mod compliance;
pub mod error;
pub mod record;

pub use record::{build_record, ActionType, AuditRecord, Outcome, RecordFields};
