//! Loading and validating `ComplianceConfig` from TOML.
//!
//! Parsing follows the same two entry points everywhere in CUSTOS:
//! `from_toml_str` for embedded documents and `from_file` for deployment
//! files.  Both validate the parsed values before returning, so a config that
//! loads is a config the verifier and reporter can use.

use std::path::Path;

use tracing::{debug, warn};

use custos_contracts::error::{CustosError, CustosResult};

use crate::settings::{ComplianceConfig, MAX_AGE_DAYS_LIMIT, MAX_CLOCK_SKEW_SECS};

impl ComplianceConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `CustosError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or carries out-of-range values.
    pub fn from_toml_str(s: &str) -> CustosResult<Self> {
        let config: ComplianceConfig = toml::from_str(s).map_err(|e| CustosError::ConfigError {
            reason: format!("failed to parse compliance TOML: {}", e),
        })?;
        config.validate()?;

        debug!(
            genesis_hash = %config.chain.genesis_hash,
            scope = ?config.chain.scope,
            clock_skew_secs = config.integrity.clock_skew_secs,
            max_age_days = config.integrity.max_age_days,
            "compliance configuration loaded"
        );

        Ok(config)
    }

    /// Read the file at `path` and parse it as compliance configuration.
    pub fn from_file(path: &Path) -> CustosResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CustosError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values the pipeline cannot operate with.
    pub fn validate(&self) -> CustosResult<()> {
        if self.chain.genesis_hash.is_empty() {
            return Err(CustosError::ConfigError {
                reason: "chain.genesis_hash must not be empty".to_string(),
            });
        }
        if !(0..=MAX_CLOCK_SKEW_SECS).contains(&self.integrity.clock_skew_secs) {
            return Err(CustosError::ConfigError {
                reason: format!(
                    "integrity.clock_skew_secs must be between 0 and {}, got {}",
                    MAX_CLOCK_SKEW_SECS, self.integrity.clock_skew_secs
                ),
            });
        }
        if !(1..=MAX_AGE_DAYS_LIMIT).contains(&self.integrity.max_age_days) {
            return Err(CustosError::ConfigError {
                reason: format!(
                    "integrity.max_age_days must be between 1 and {}, got {}",
                    MAX_AGE_DAYS_LIMIT, self.integrity.max_age_days
                ),
            });
        }
        if self.report.unauthorized_actor.is_empty() {
            warn!("report.unauthorized_actor is empty; records with no actor will count as unauthorized");
        }
        Ok(())
    }
}
