//! The sealing write pipeline: hash → sign → encrypt → append.
//!
//! A record is only ever appended fully sealed.  Each step works on an owned
//! record; if any step fails the record is dropped and nothing reaches the
//! store.
//!
//! A chain has exactly one writer at a time.  `ChainWriter` serializes its
//! own writes with a lock, and the store's compare-and-append rejects any
//! interleaved write from elsewhere with `CustosError::ChainConflict`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use custos_config::{ChainSettings, ComplianceConfig, RecordSettings};
use custos_contracts::{
    error::{CustosError, CustosResult},
    record::{build_record, AuditRecord, RecordFields},
};
use custos_core::traits::{AuditStore, RecordCipher, RecordSigner, TimeSource};

use crate::chain::{compute_hash, verify_chain};

/// Hash, sign and encrypt `record` against `previous_hash`.
///
/// Marks the record immutable.  Returns the sealed record, or an error with
/// the record discarded.
pub fn seal(
    mut record: AuditRecord,
    previous_hash: &str,
    signer: &dyn RecordSigner,
    cipher: &dyn RecordCipher,
) -> CustosResult<AuditRecord> {
    compute_hash(&mut record, previous_hash)?;
    record.compliance.immutable = true;
    signer.sign(&mut record)?;
    cipher.encrypt(&mut record)?;
    Ok(record)
}

/// Appends sealed records to the chains of an `AuditStore`.
pub struct ChainWriter {
    store: Arc<dyn AuditStore>,
    signer: Box<dyn RecordSigner>,
    cipher: Box<dyn RecordCipher>,
    clock: Arc<dyn TimeSource>,
    chain: ChainSettings,
    records: RecordSettings,

    /// Held for the whole read-tail → append sequence.  Also remembers the
    /// last timestamp written per chain.
    last_written: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl ChainWriter {
    pub fn new(
        store: Arc<dyn AuditStore>,
        signer: Box<dyn RecordSigner>,
        cipher: Box<dyn RecordCipher>,
        clock: Arc<dyn TimeSource>,
        config: &ComplianceConfig,
    ) -> Self {
        Self {
            store,
            signer,
            cipher,
            clock,
            chain: config.chain.clone(),
            records: config.records.clone(),
            last_written: Mutex::new(HashMap::new()),
        }
    }

    /// Build a record from `fields`, stamped with the trusted time and the
    /// deployment's record defaults, and append it.
    pub fn write(&self, fields: RecordFields) -> CustosResult<AuditRecord> {
        let record = build_record(self.records.apply(fields), self.clock.now());
        self.append(record)
    }

    /// Seal an already-built record and append it to its chain.
    ///
    /// # Errors
    ///
    /// - `CustosError::Precondition` if the record is already hashed.
    /// - `CustosError::ChainConflict` if another writer advanced the chain.
    /// - Any signer, cipher or store error.
    pub fn append(&self, record: AuditRecord) -> CustosResult<AuditRecord> {
        let mut last_written = self.last_written.lock().map_err(|e| CustosError::StoreFailed {
            reason: format!("writer lock poisoned: {}", e),
        })?;

        let chain = self.chain.scope.chain_key(&record);
        let previous_hash = self
            .store
            .tail_hash(&chain)?
            .unwrap_or_else(|| self.chain.genesis_hash.clone());

        if let Some(last) = last_written.get(&chain) {
            if record.timestamp < *last {
                warn!(
                    chain = %chain,
                    record_id = %record.record_id,
                    timestamp = %record.timestamp,
                    previous = %last,
                    "record timestamp precedes its predecessor"
                );
            }
        }

        let sealed = seal(
            record,
            &previous_hash,
            self.signer.as_ref(),
            self.cipher.as_ref(),
        )?;
        self.store.append(&chain, sealed.clone())?;
        last_written.insert(chain.clone(), sealed.timestamp);

        info!(
            chain = %chain,
            record_id = %sealed.record_id,
            action = %sealed.action,
            "audit record sealed"
        );
        Ok(sealed)
    }

    /// The chain a record with these properties would be written to.
    pub fn chain_for(&self, record: &AuditRecord) -> String {
        self.chain.scope.chain_key(record)
    }

    pub fn genesis_hash(&self) -> &str {
        &self.chain.genesis_hash
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Read `chain` back and check linkage and hashes end to end.
    pub fn verify_chain(&self, chain: &str) -> CustosResult<bool> {
        let records = self.store.read_chain(chain)?;
        Ok(verify_chain(&records, &self.chain.genesis_hash))
    }
}
