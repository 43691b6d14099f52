//! # custos-verify
//!
//! Independent verification of stored CUSTOS audit records.
//!
//! This crate provides:
//! - [`integrity::IntegrityVerifier`], which checks one record's timestamp,
//!   chain linkage, hash, signature, encryption and identity fields and
//!   reports every violation it finds
//! - [`report::ComplianceReporter`], which walks a whole chain and folds the
//!   per-record results into a regulator-facing `ComplianceReport` with a
//!   COMPLIANT / WARNING / VIOLATION verdict
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custos_core::SystemClock;
//! use custos_verify::ComplianceReporter;
//!
//! let reporter = ComplianceReporter::new(&config, Arc::new(SystemClock));
//! let report = reporter.generate_compliance_report(&records, Some(&verifier));
//! println!("{}", report.compliance_status);
//! ```

pub mod integrity;
pub mod report;

#[cfg(test)]
mod test_support;

pub use integrity::IntegrityVerifier;
pub use report::{report_audit_fields, to_json, ComplianceReporter, COMPLIANCE_REPORT_ACTION};
