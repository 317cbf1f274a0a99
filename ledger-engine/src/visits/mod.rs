//! Visit lifecycle (就诊)
//!
//! A visit links exactly one origin — a queue entry or an appointment —
//! to the consultation output. Creation is idempotent per origin (a
//! repeated "start consult" click returns the already-open visit), and
//! every lifecycle transition pushes the origin's status forward inside
//! the same transaction, so visit and origin can never disagree.

use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{
    Actor, Appointment, AppointmentStatus, QueueEntry, QueueStatus, SourceRefType, Visit,
    VisitStatus, VisitUpdate,
};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::{LedgerEngine, parse_date};
use crate::storage::{self, APPOINTMENTS, QUEUE_ENTRIES, VISITS};

impl LedgerEngine {
    /// Start a consultation from a queue entry.
    ///
    /// Returns the existing open visit unchanged if one is already open
    /// for this entry. Otherwise creates an open visit with the entry's
    /// patient snapshot and moves the entry to `in_consult`.
    pub fn create_visit_from_queue(
        &self,
        clinic_id: &str,
        actor: &Actor,
        queue_id: i64,
    ) -> LedgerResult<Visit> {
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let mut entry: QueueEntry = storage::get_doc(&txn, QUEUE_ENTRIES, clinic_id, queue_id)?
            .ok_or_else(|| LedgerError::not_found(format!("queue entry {queue_id}")))?;

        if let Some(existing) = find_open_visit(&txn, clinic_id, SourceRefType::Queue, queue_id)? {
            return Ok(existing);
        }

        // A consult can only start from a live entry; the status flow
        // never regresses out of done/skipped.
        let push_status = entry.status != QueueStatus::InConsult;
        if push_status && !entry.status.can_transition(QueueStatus::InConsult) {
            return Err(LedgerError::invalid_input(format!(
                "queue entry #{} is {:?}; consultation cannot start",
                entry.token_number, entry.status
            )));
        }

        let visit = Visit {
            id: util::snowflake_id(),
            patient_id: entry.patient_id,
            patient_name: entry
                .patient_name
                .clone()
                .unwrap_or_else(|| "Walk-in".to_string()),
            phone: entry.phone.clone(),
            nic: None,
            doctor_id: entry.doctor_id,
            doctor_name: entry.doctor_name.clone(),
            source_ref_type: SourceRefType::Queue,
            source_ref_id: queue_id,
            status: VisitStatus::Open,
            diagnosis: String::new(),
            notes: String::new(),
            prescription: Vec::new(),
            follow_up_date: None,
            created_by: actor.uid.clone(),
            created_at: now,
            updated_by: actor.uid.clone(),
            updated_at: now,
        };
        storage::put_doc(&txn, VISITS, clinic_id, visit.id, &visit)?;

        if push_status {
            entry.status = QueueStatus::InConsult;
            entry.updated_by = actor.uid.clone();
            entry.updated_at = now;
            storage::put_doc(&txn, QUEUE_ENTRIES, clinic_id, entry.id, &entry)?;
        }
        storage::commit(txn)?;

        tracing::info!(visit_id = visit.id, token = entry.token_number, "Visit opened from queue");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::VisitOpened,
            "visit",
            visit.id,
            json!({ "source": "queue", "token_number": entry.token_number }),
        );
        Ok(visit)
    }

    /// Start a consultation from an appointment; same idempotency and
    /// status-push rules as the queue variant.
    pub fn create_visit_from_appointment(
        &self,
        clinic_id: &str,
        actor: &Actor,
        appointment_id: i64,
    ) -> LedgerResult<Visit> {
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let mut appointment: Appointment =
            storage::get_doc(&txn, APPOINTMENTS, clinic_id, appointment_id)?
                .ok_or_else(|| LedgerError::not_found(format!("appointment {appointment_id}")))?;

        if let Some(existing) =
            find_open_visit(&txn, clinic_id, SourceRefType::Appointment, appointment_id)?
        {
            return Ok(existing);
        }

        let push_status = appointment.status != AppointmentStatus::InConsult;
        if push_status && !appointment.status.can_transition(AppointmentStatus::InConsult) {
            return Err(LedgerError::invalid_input(format!(
                "appointment is {:?}; consultation cannot start",
                appointment.status
            )));
        }

        let visit = Visit {
            id: util::snowflake_id(),
            patient_id: appointment.patient_id,
            patient_name: if appointment.patient_name.trim().is_empty() {
                "Unknown".to_string()
            } else {
                appointment.patient_name.clone()
            },
            phone: None,
            nic: None,
            doctor_id: appointment.doctor_id,
            doctor_name: appointment.doctor_name.clone(),
            source_ref_type: SourceRefType::Appointment,
            source_ref_id: appointment_id,
            status: VisitStatus::Open,
            diagnosis: String::new(),
            notes: String::new(),
            prescription: Vec::new(),
            follow_up_date: None,
            created_by: actor.uid.clone(),
            created_at: now,
            updated_by: actor.uid.clone(),
            updated_at: now,
        };
        storage::put_doc(&txn, VISITS, clinic_id, visit.id, &visit)?;

        if push_status {
            appointment.status = AppointmentStatus::InConsult;
            appointment.updated_by = actor.uid.clone();
            appointment.updated_at = now;
            storage::put_doc(&txn, APPOINTMENTS, clinic_id, appointment.id, &appointment)?;
        }
        storage::commit(txn)?;

        tracing::info!(visit_id = visit.id, "Visit opened from appointment");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::VisitOpened,
            "visit",
            visit.id,
            json!({ "source": "appointment" }),
        );
        Ok(visit)
    }

    /// Update the clinical fields of an open visit
    pub fn update_visit(
        &self,
        clinic_id: &str,
        actor: &Actor,
        visit_id: i64,
        patch: VisitUpdate,
    ) -> LedgerResult<Visit> {
        let follow_up = match &patch.follow_up_date {
            Some(value) => Some(parse_date(value, "follow_up_date")?),
            None => None,
        };

        let txn = self.storage().begin_write()?;
        let mut visit: Visit = storage::get_doc(&txn, VISITS, clinic_id, visit_id)?
            .ok_or_else(|| LedgerError::not_found(format!("visit {visit_id}")))?;
        if visit.status == VisitStatus::Closed {
            return Err(LedgerError::invalid_input("visit is closed"));
        }

        if let Some(diagnosis) = patch.diagnosis {
            visit.diagnosis = diagnosis;
        }
        if let Some(notes) = patch.notes {
            visit.notes = notes;
        }
        if let Some(prescription) = patch.prescription {
            visit.prescription = prescription;
        }
        if let Some(date) = follow_up {
            visit.follow_up_date = Some(date);
        }
        visit.updated_by = actor.uid.clone();
        visit.updated_at = util::now_millis();

        storage::put_doc(&txn, VISITS, clinic_id, visit.id, &visit)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::VisitUpdated,
            "visit",
            visit.id,
            json!({ "prescription_lines": visit.prescription.len() }),
        );
        Ok(visit)
    }

    /// Close a visit and push the origin forward (`queue -> done`,
    /// `appointment -> completed`) in the same transaction.
    ///
    /// Closing an already-closed visit is a no-op returning the stored
    /// visit — a repeated "end consult" click must not error.
    pub fn close_visit(&self, clinic_id: &str, actor: &Actor, visit_id: i64) -> LedgerResult<Visit> {
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let mut visit: Visit = storage::get_doc(&txn, VISITS, clinic_id, visit_id)?
            .ok_or_else(|| LedgerError::not_found(format!("visit {visit_id}")))?;
        if visit.status == VisitStatus::Closed {
            return Ok(visit);
        }

        visit.status = VisitStatus::Closed;
        visit.updated_by = actor.uid.clone();
        visit.updated_at = now;
        storage::put_doc(&txn, VISITS, clinic_id, visit.id, &visit)?;

        match visit.source_ref_type {
            SourceRefType::Queue => {
                let mut entry: QueueEntry =
                    storage::get_doc(&txn, QUEUE_ENTRIES, clinic_id, visit.source_ref_id)?
                        .ok_or_else(|| {
                            LedgerError::not_found(format!(
                                "queue entry {} for visit {visit_id}",
                                visit.source_ref_id
                            ))
                        })?;
                if entry.status.can_transition(QueueStatus::Done) {
                    entry.status = QueueStatus::Done;
                    entry.updated_by = actor.uid.clone();
                    entry.updated_at = now;
                    storage::put_doc(&txn, QUEUE_ENTRIES, clinic_id, entry.id, &entry)?;
                } else {
                    tracing::debug!(status = ?entry.status, "Queue entry already past in_consult");
                }
            }
            SourceRefType::Appointment => {
                let mut appointment: Appointment =
                    storage::get_doc(&txn, APPOINTMENTS, clinic_id, visit.source_ref_id)?
                        .ok_or_else(|| {
                            LedgerError::not_found(format!(
                                "appointment {} for visit {visit_id}",
                                visit.source_ref_id
                            ))
                        })?;
                if appointment.status.can_transition(AppointmentStatus::Completed) {
                    appointment.status = AppointmentStatus::Completed;
                    appointment.updated_by = actor.uid.clone();
                    appointment.updated_at = now;
                    storage::put_doc(&txn, APPOINTMENTS, clinic_id, appointment.id, &appointment)?;
                } else {
                    tracing::debug!(status = ?appointment.status, "Appointment already past in_consult");
                }
            }
        }
        storage::commit(txn)?;

        tracing::info!(visit_id = visit.id, "Visit closed");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::VisitClosed,
            "visit",
            visit.id,
            json!({ "source_ref_id": visit.source_ref_id }),
        );
        Ok(visit)
    }

    pub fn get_visit(&self, clinic_id: &str, visit_id: i64) -> LedgerResult<Option<Visit>> {
        Ok(self.storage().read_doc(VISITS, clinic_id, visit_id)?)
    }
}

/// Lookup-before-create guard: the open visit for an origin, if any
fn find_open_visit(
    txn: &redb::WriteTransaction,
    clinic_id: &str,
    source_ref_type: SourceRefType,
    source_ref_id: i64,
) -> crate::storage::StorageResult<Option<Visit>> {
    let visits: Vec<Visit> = storage::scan_docs_txn(txn, VISITS, clinic_id)?;
    Ok(visits.into_iter().find(|v| {
        v.status == VisitStatus::Open
            && v.source_ref_type == source_ref_type
            && v.source_ref_id == source_ref_id
    }))
}
