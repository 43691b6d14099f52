//! In-memory implementation of `AuditStore`.
//!
//! `InMemoryAuditStore` is the reference implementation of the `AuditStore`
//! trait.  It keeps every chain in a `Vec` behind a single `Mutex`, so
//! compare-and-append is atomic across threads.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{info, warn};

use custos_contracts::{
    error::{CustosError, CustosResult},
    record::AuditRecord,
};
use custos_core::traits::AuditStore;

use crate::chain::verify_chain;

/// An append-only, in-memory store of sealed records, keyed by chain name.
pub struct InMemoryAuditStore {
    genesis_hash: String,
    pub(crate) chains: Mutex<HashMap<String, Vec<AuditRecord>>>,
}

impl InMemoryAuditStore {
    /// Create an empty store.  The first record of every chain must link to
    /// `genesis_hash`.
    pub fn new(genesis_hash: impl Into<String>) -> Self {
        Self {
            genesis_hash: genesis_hash.into(),
            chains: Mutex::new(HashMap::new()),
        }
    }

    /// Names of all non-empty chains, sorted.
    pub fn chain_names(&self) -> Vec<String> {
        let chains = self.chains.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = chains.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of records in `chain`.
    pub fn len(&self, chain: &str) -> usize {
        let chains = self.chains.lock().unwrap_or_else(|e| e.into_inner());
        chains.get(chain).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        let chains = self.chains.lock().unwrap_or_else(|e| e.into_inner());
        chains.values().all(Vec::is_empty)
    }

    /// Quick linkage-and-hash check of one stored chain.
    pub fn verify_integrity(&self, chain: &str) -> bool {
        let chains = self.chains.lock().unwrap_or_else(|e| e.into_inner());
        chains
            .get(chain)
            .map_or(true, |records| verify_chain(records, &self.genesis_hash))
    }
}

impl AuditStore for InMemoryAuditStore {
    fn tail_hash(&self, chain: &str) -> CustosResult<Option<String>> {
        let chains = self.chains.lock().map_err(|e| CustosError::StoreFailed {
            reason: format!("store lock poisoned: {}", e),
        })?;
        Ok(chains
            .get(chain)
            .and_then(|records| records.last())
            .and_then(|record| record.current_hash.clone()))
    }

    /// Compare-and-append: the record must link to the chain's current tail
    /// (or to the genesis sentinel for an empty chain).
    fn append(&self, chain: &str, record: AuditRecord) -> CustosResult<()> {
        if !record.is_sealed() {
            return Err(CustosError::Precondition {
                reason: format!(
                    "record '{}' must be hashed, signed and encrypted before it is stored",
                    record.record_id
                ),
            });
        }

        let mut chains = self.chains.lock().map_err(|e| CustosError::StoreFailed {
            reason: format!("store lock poisoned: {}", e),
        })?;
        let records = chains.entry(chain.to_string()).or_default();

        let expected = records
            .last()
            .and_then(|r| r.current_hash.clone())
            .unwrap_or_else(|| self.genesis_hash.clone());
        let actual = record.previous_hash.clone().unwrap_or_default();
        if actual != expected {
            warn!(
                chain = %chain,
                record_id = %record.record_id,
                "append rejected: record does not link to chain tail"
            );
            return Err(CustosError::ChainConflict {
                chain: chain.to_string(),
                expected,
                actual,
            });
        }

        info!(
            chain = %chain,
            record_id = %record.record_id,
            position = records.len(),
            "record appended"
        );
        records.push(record);
        Ok(())
    }

    fn read_chain(&self, chain: &str) -> CustosResult<Vec<AuditRecord>> {
        let chains = self.chains.lock().map_err(|e| CustosError::StoreFailed {
            reason: format!("store lock poisoned: {}", e),
        })?;
        Ok(chains.get(chain).cloned().unwrap_or_default())
    }
}
