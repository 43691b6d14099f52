//! # custos-ref-healthcare
//!
//! Healthcare reference scenarios for the CUSTOS tamper-evident audit trail.
//!
//! Demonstrates three properties using mock clinical activity:
//!
//! 1. **Glucose Monitoring Chain**: sealing, correction records, payload
//!    decryption and a COMPLIANT report that is itself audit-logged.
//! 2. **Tamper Investigation**: insider edits to stored records localized
//!    per record, ending in a WARNING report.
//! 3. **Unauthorized Access Monitoring**: per-tenant chains written
//!    concurrently, with denied attempts counted in each clinic's report.
//!
//! All data is hardcoded and fictional.  Keys are generated per run.

pub mod mock_data;
pub mod scenarios;
