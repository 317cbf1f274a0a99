//! LedgerEngine — operation facade
//!
//! One engine instance per process, shared by all callers. The engine
//! owns the storage handle and an optional audit sink; the operations
//! themselves live in the `stock`, `documents` and `visits` modules as
//! `impl LedgerEngine` blocks.
//!
//! # Operation Flow
//!
//! ```text
//! operation(clinic_id, actor, input)
//!     ├─ 1. Validate input (no transaction yet)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Issue sequence number(s) if the operation numbers a document
//!     ├─ 4. Check business preconditions against current state
//!     ├─ 5. Apply all writes
//!     ├─ 6. Commit (abort-on-drop if any step failed)
//!     ├─ 7. Push audit entry (best-effort, non-blocking)
//!     └─ 8. Return the created/updated document
//! ```

use chrono::NaiveDate;
use shared::error::{LedgerError, LedgerResult};
use shared::models::Actor;
use tokio::sync::mpsc;

use crate::audit::{AuditAction, AuditLogRequest, AuditService};
use crate::sequence;
use crate::storage::LedgerStorage;

/// Transactional ledger engine for one clinic database
#[derive(Clone)]
pub struct LedgerEngine {
    storage: LedgerStorage,
    audit_tx: Option<mpsc::Sender<AuditLogRequest>>,
}

impl LedgerEngine {
    /// Open or create the ledger database at the given path
    pub fn open(path: impl AsRef<std::path::Path>) -> LedgerResult<Self> {
        Ok(Self::with_storage(LedgerStorage::open(path)?))
    }

    /// Open an in-memory engine (for testing and tooling)
    pub fn open_in_memory() -> LedgerResult<Self> {
        Ok(Self::with_storage(LedgerStorage::open_in_memory()?))
    }

    /// Wrap an already-opened storage handle
    pub fn with_storage(storage: LedgerStorage) -> Self {
        Self { storage, audit_tx: None }
    }

    /// Route audit entries to the given service's worker channel
    pub fn attach_audit(&mut self, service: &AuditService) {
        self.audit_tx = Some(service.sender());
    }

    /// Storage handle
    pub fn storage(&self) -> &LedgerStorage {
        &self.storage
    }

    // ========== Sequence Issuer ==========

    /// Allocate the next value of a named counter
    ///
    /// Counters are created lazily on first issuance and only ever move
    /// forward by exactly 1. Call once per logical document, inside the
    /// transaction that writes the document — never as a separate step —
    /// so a failed operation cannot orphan a number. Voided documents
    /// legitimately leave gaps; duplicates would be a correctness bug.
    pub fn issue_sequence(&self, clinic_id: &str, name: &str) -> LedgerResult<u64> {
        let txn = self.storage.begin_write()?;
        let value = sequence::issue(&txn, clinic_id, name)?;
        crate::storage::commit(txn)?;
        Ok(value)
    }

    /// Current value of a counter without issuing (0 if never issued)
    pub fn current_sequence(&self, clinic_id: &str, name: &str) -> LedgerResult<u64> {
        Ok(self.storage.read_counter(clinic_id, name)?)
    }

    // ========== Internal helpers ==========

    /// Push an audit entry for a committed operation.
    ///
    /// Best-effort by contract: the business transaction has already
    /// committed, so a full or closed channel is logged as a warning and
    /// the entry is dropped — it never blocks or fails the caller.
    pub(crate) fn audit_log(
        &self,
        clinic_id: &str,
        actor: &Actor,
        action: AuditAction,
        resource_type: &str,
        resource_id: i64,
        details: serde_json::Value,
    ) {
        let Some(tx) = &self.audit_tx else {
            return;
        };
        let req = AuditLogRequest {
            clinic_id: clinic_id.to_string(),
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            operator_id: Some(actor.uid.clone()),
            operator_email: actor.email.clone(),
            details,
        };
        if let Err(e) = tx.try_send(req) {
            tracing::warn!(action = %action, error = %e, "Audit entry dropped");
        }
    }
}

/// Parse a `YYYY-MM-DD` input field into a calendar date
pub(crate) fn parse_date(value: &str, field: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        LedgerError::invalid_input(format!(
            "{field} must be a YYYY-MM-DD calendar date, got \"{value}\""
        ))
    })
}
