//! # custos-config
//!
//! TOML-driven deployment configuration for CUSTOS.
//!
//! ## Overview
//!
//! A deployment fixes four things that the core algorithms leave open:
//! the chain's genesis sentinel and partitioning (`[chain]`), the timestamp
//! tolerances of the integrity verifier (`[integrity]`), the reporter's
//! unauthorized-actor sentinel, verdict threshold and recommendations
//! (`[report]`), and the defaults stamped onto new records (`[records]`).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use custos_config::ComplianceConfig;
//!
//! let config = ComplianceConfig::from_file(Path::new("custos.toml"))?;
//! ```

pub mod loader;
pub mod settings;

pub use settings::{
    ChainScope, ChainSettings, ComplianceConfig, IntegritySettings, Recommendations,
    RecordSettings, ReportSettings, GENESIS_HASH, MAX_AGE_DAYS_LIMIT, MAX_CLOCK_SKEW_SECS,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
