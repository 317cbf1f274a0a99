//! Walk-in queue operations (排队叫号)

use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{Actor, QueueEntry, QueueSource, QueueStatus, QueueTokenInput};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::LedgerEngine;
use crate::sequence;
use crate::storage::{self, QUEUE_ENTRIES};

impl LedgerEngine {
    /// Issue today's next queue token and create the queue entry.
    ///
    /// The token and the entry commit together: a token number with no
    /// entry, or an entry with a reused number, cannot exist. Token N
    /// proves N-1 tokens were issued earlier the same clinic-day, even if
    /// some are later skipped.
    pub fn add_queue_token(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: QueueTokenInput,
    ) -> LedgerResult<QueueEntry> {
        if input.doctor_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("doctor_name must not be empty"));
        }

        let day = util::today_key();
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let token = sequence::issue(&txn, clinic_id, &sequence::queue_counter_name(&day))?;

        let source = input.source.unwrap_or(if input.patient_id.is_some() {
            QueueSource::Patient
        } else {
            QueueSource::Walkin
        });
        let entry = QueueEntry {
            id: util::snowflake_id(),
            token_number: token,
            date: day,
            patient_id: input.patient_id,
            patient_name: input.patient_name,
            phone: input.phone,
            doctor_id: input.doctor_id,
            doctor_name: input.doctor_name,
            source,
            status: QueueStatus::Waiting,
            created_by: actor.uid.clone(),
            created_at: now,
            updated_by: actor.uid.clone(),
            updated_at: now,
        };
        storage::put_doc(&txn, QUEUE_ENTRIES, clinic_id, entry.id, &entry)?;
        storage::commit(txn)?;

        tracing::info!(token = entry.token_number, date = %entry.date, "Queue token issued");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::QueueTokenIssued,
            "queue",
            entry.id,
            json!({ "token_number": entry.token_number, "date": entry.date }),
        );
        Ok(entry)
    }

    /// Move a queue entry along its status flow.
    ///
    /// Transitions outside the table (`waiting -> in_consult -> done`,
    /// `waiting -> skipped`) are rejected; repeating the current status
    /// is a no-op.
    pub fn update_queue_status(
        &self,
        clinic_id: &str,
        actor: &Actor,
        queue_id: i64,
        status: QueueStatus,
    ) -> LedgerResult<QueueEntry> {
        let txn = self.storage().begin_write()?;
        let mut entry: QueueEntry = storage::get_doc(&txn, QUEUE_ENTRIES, clinic_id, queue_id)?
            .ok_or_else(|| LedgerError::not_found(format!("queue entry {queue_id}")))?;

        if entry.status == status {
            return Ok(entry);
        }
        if !entry.status.can_transition(status) {
            return Err(LedgerError::invalid_input(format!(
                "queue status cannot change {:?} -> {:?}",
                entry.status, status
            )));
        }

        let from = entry.status;
        entry.status = status;
        entry.updated_by = actor.uid.clone();
        entry.updated_at = util::now_millis();
        storage::put_doc(&txn, QUEUE_ENTRIES, clinic_id, entry.id, &entry)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::QueueStatusChanged,
            "queue",
            entry.id,
            json!({ "token_number": entry.token_number, "from": format!("{from:?}"), "to": format!("{status:?}") }),
        );
        Ok(entry)
    }

    pub fn get_queue_entry(&self, clinic_id: &str, queue_id: i64) -> LedgerResult<Option<QueueEntry>> {
        Ok(self.storage().read_doc(QUEUE_ENTRIES, clinic_id, queue_id)?)
    }

    /// A day's queue, ordered by token number (the queue board view)
    pub fn list_queue_for_day(&self, clinic_id: &str, day: &str) -> LedgerResult<Vec<QueueEntry>> {
        let mut entries: Vec<QueueEntry> = self
            .storage()
            .scan_docs::<QueueEntry>(QUEUE_ENTRIES, clinic_id)?
            .into_iter()
            .filter(|e| e.date == day)
            .collect();
        entries.sort_by_key(|e| e.token_number);
        Ok(entries)
    }
}
