//! redb-based storage layer for the clinic ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `counters` | `(clinic_id, name)` | `u64` | Monotonic document counters |
//! | `stock_items` | `(clinic_id, id)` | JSON | Product types |
//! | `stock_batches` | `(clinic_id, id)` | JSON | Received lots |
//! | `stock_movements` | `(clinic_id, id)` | JSON | Append-only stock trail |
//! | `purchases` | `(clinic_id, id)` | JSON | Purchase documents |
//! | `dispenses` | `(clinic_id, id)` | JSON | Dispense documents |
//! | `invoices` | `(clinic_id, id)` | JSON | Invoices |
//! | `payments` | `(clinic_id, id)` | JSON | Payment rows |
//! | `queue_entries` | `(clinic_id, id)` | JSON | Walk-in queue |
//! | `appointments` | `(clinic_id, id)` | JSON | Appointments |
//! | `visits` | `(clinic_id, id)` | JSON | Consultations |
//! | `patients` | `(clinic_id, id)` | JSON | Patient records |
//! | `services` | `(clinic_id, id)` | JSON | Billing catalog |
//! | `audit_log` | `sequence` | JSON | Hash-chained audit trail |
//!
//! # Atomicity
//!
//! Every mutating engine operation runs inside exactly one
//! `WriteTransaction`. redb commits are copy-on-write with an atomic
//! pointer swap, and an uncommitted transaction aborts when dropped, so a
//! business-rule failure halfway through an operation leaves no partial
//! state behind.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Common shape of all per-clinic document tables
pub(crate) type DocTable = TableDefinition<'static, (&'static str, i64), &'static [u8]>;

/// Monotonic counters: key = (clinic_id, counter name), value = current value
pub(crate) const COUNTERS: TableDefinition<(&str, &str), u64> = TableDefinition::new("counters");

pub(crate) const STOCK_ITEMS: DocTable = TableDefinition::new("stock_items");
pub(crate) const STOCK_BATCHES: DocTable = TableDefinition::new("stock_batches");
pub(crate) const STOCK_MOVEMENTS: DocTable = TableDefinition::new("stock_movements");
pub(crate) const PURCHASES: DocTable = TableDefinition::new("purchases");
pub(crate) const DISPENSES: DocTable = TableDefinition::new("dispenses");
pub(crate) const INVOICES: DocTable = TableDefinition::new("invoices");
pub(crate) const PAYMENTS: DocTable = TableDefinition::new("payments");
pub(crate) const QUEUE_ENTRIES: DocTable = TableDefinition::new("queue_entries");
pub(crate) const APPOINTMENTS: DocTable = TableDefinition::new("appointments");
pub(crate) const VISITS: DocTable = TableDefinition::new("visits");
pub(crate) const PATIENTS: DocTable = TableDefinition::new("patients");
pub(crate) const SERVICES: DocTable = TableDefinition::new("services");

/// Audit log: key = global sequence, value = JSON-serialized AuditEntry
pub(crate) const AUDIT_LOG: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_log");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::error::LedgerError {
    fn from(err: StorageError) -> Self {
        shared::error::LedgerError::storage(err.to_string())
    }
}

/// Ledger storage backed by redb
///
/// redb uses `Durability::Immediate` by default: commits are persistent as
/// soon as `commit()` returns and the database file is always in a
/// consistent state, which matters for front-desk machines that get
/// powered off without warning.
#[derive(Clone)]
pub struct LedgerStorage {
    db: Arc<Database>,
}

impl LedgerStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing and tooling)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Create all tables so later read transactions never hit a missing
    /// table.
    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(COUNTERS)?;
            let _ = write_txn.open_table(STOCK_ITEMS)?;
            let _ = write_txn.open_table(STOCK_BATCHES)?;
            let _ = write_txn.open_table(STOCK_MOVEMENTS)?;
            let _ = write_txn.open_table(PURCHASES)?;
            let _ = write_txn.open_table(DISPENSES)?;
            let _ = write_txn.open_table(INVOICES)?;
            let _ = write_txn.open_table(PAYMENTS)?;
            let _ = write_txn.open_table(QUEUE_ENTRIES)?;
            let _ = write_txn.open_table(APPOINTMENTS)?;
            let _ = write_txn.open_table(VISITS)?;
            let _ = write_txn.open_table(PATIENTS)?;
            let _ = write_txn.open_table(SERVICES)?;
            let _ = write_txn.open_table(AUDIT_LOG)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Shared handle to the underlying database (audit storage attaches
    /// to the same file)
    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    // ========== Read-path helpers (own read transaction) ==========

    /// Read one document
    pub(crate) fn read_doc<T: DeserializeOwned>(
        &self,
        table: DocTable,
        clinic_id: &str,
        id: i64,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get((clinic_id, id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Read all of a clinic's documents from one table, in key order
    pub(crate) fn scan_docs<T: DeserializeOwned>(
        &self,
        table: DocTable,
        clinic_id: &str,
    ) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;

        let mut docs = Vec::new();
        let range_start = (clinic_id, i64::MIN);
        let range_end = (clinic_id, i64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            docs.push(serde_json::from_slice(value.value())?);
        }
        Ok(docs)
    }

    /// Current value of a counter (0 if never issued)
    pub(crate) fn read_counter(&self, clinic_id: &str, name: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS)?;
        Ok(table.get((clinic_id, name))?.map(|g| g.value()).unwrap_or(0))
    }
}

// ========== In-transaction helpers ==========
//
// Each helper opens its table and drops the handle before returning, so
// sequential calls inside one transaction never trip redb's
// table-already-open check.

/// Write one document within the caller's transaction
pub(crate) fn put_doc<T: Serialize>(
    txn: &WriteTransaction,
    table: DocTable,
    clinic_id: &str,
    id: i64,
    doc: &T,
) -> StorageResult<()> {
    let mut table = txn.open_table(table)?;
    let value = serde_json::to_vec(doc)?;
    table.insert((clinic_id, id), value.as_slice())?;
    Ok(())
}

/// Read one document within the caller's transaction
pub(crate) fn get_doc<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: DocTable,
    clinic_id: &str,
    id: i64,
) -> StorageResult<Option<T>> {
    let table = txn.open_table(table)?;
    match table.get((clinic_id, id))? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Read all of a clinic's documents from one table within the caller's
/// transaction
pub(crate) fn scan_docs_txn<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: DocTable,
    clinic_id: &str,
) -> StorageResult<Vec<T>> {
    let table = txn.open_table(table)?;

    let mut docs = Vec::new();
    let range_start = (clinic_id, i64::MIN);
    let range_end = (clinic_id, i64::MAX);
    for result in table.range(range_start..=range_end)? {
        let (_key, value) = result?;
        docs.push(serde_json::from_slice(value.value())?);
    }
    Ok(docs)
}

/// Commit, folding redb's commit error into [`StorageError`]
pub(crate) fn commit(txn: WriteTransaction) -> StorageResult<()> {
    txn.commit()?;
    Ok(())
}
