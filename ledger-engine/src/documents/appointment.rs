//! Appointment operations (预约)

use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{Actor, Appointment, AppointmentInput, AppointmentStatus};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::{LedgerEngine, parse_date};
use crate::storage::{self, APPOINTMENTS};

impl LedgerEngine {
    /// Book an appointment
    pub fn create_appointment(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: AppointmentInput,
    ) -> LedgerResult<Appointment> {
        if input.patient_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("patient_name must not be empty"));
        }
        if input.doctor_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("doctor_name must not be empty"));
        }
        let date = parse_date(&input.date, "date")?;

        let now = util::now_millis();
        let appointment = Appointment {
            id: util::snowflake_id(),
            patient_id: input.patient_id,
            patient_name: input.patient_name,
            doctor_id: input.doctor_id,
            doctor_name: input.doctor_name,
            date: util::date_key(date),
            time: input.time,
            status: AppointmentStatus::Booked,
            created_by: actor.uid.clone(),
            created_at: now,
            updated_by: actor.uid.clone(),
            updated_at: now,
        };

        let txn = self.storage().begin_write()?;
        storage::put_doc(&txn, APPOINTMENTS, clinic_id, appointment.id, &appointment)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::AppointmentCreated,
            "appointment",
            appointment.id,
            json!({ "patient_name": appointment.patient_name, "date": appointment.date }),
        );
        Ok(appointment)
    }

    /// Move an appointment along its status flow; transitions outside
    /// the table are rejected, repeating the current status is a no-op.
    pub fn update_appointment_status(
        &self,
        clinic_id: &str,
        actor: &Actor,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> LedgerResult<Appointment> {
        let txn = self.storage().begin_write()?;
        let mut appointment: Appointment =
            storage::get_doc(&txn, APPOINTMENTS, clinic_id, appointment_id)?
                .ok_or_else(|| LedgerError::not_found(format!("appointment {appointment_id}")))?;

        if appointment.status == status {
            return Ok(appointment);
        }
        if !appointment.status.can_transition(status) {
            return Err(LedgerError::invalid_input(format!(
                "appointment status cannot change {:?} -> {:?}",
                appointment.status, status
            )));
        }

        let from = appointment.status;
        appointment.status = status;
        appointment.updated_by = actor.uid.clone();
        appointment.updated_at = util::now_millis();
        storage::put_doc(&txn, APPOINTMENTS, clinic_id, appointment.id, &appointment)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::AppointmentStatusChanged,
            "appointment",
            appointment.id,
            json!({ "from": format!("{from:?}"), "to": format!("{status:?}") }),
        );
        Ok(appointment)
    }

    pub fn get_appointment(
        &self,
        clinic_id: &str,
        appointment_id: i64,
    ) -> LedgerResult<Option<Appointment>> {
        Ok(self.storage().read_doc(APPOINTMENTS, clinic_id, appointment_id)?)
    }

    /// Appointments within a day range (inclusive), ordered by date
    pub fn list_appointments_between(
        &self,
        clinic_id: &str,
        from: &str,
        to: &str,
    ) -> LedgerResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .storage()
            .scan_docs::<Appointment>(APPOINTMENTS, clinic_id)?
            .into_iter()
            .filter(|a| a.date.as_str() >= from && a.date.as_str() <= to)
            .collect();
        appointments.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(appointments)
    }
}
