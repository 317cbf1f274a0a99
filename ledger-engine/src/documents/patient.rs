//! Patient record operations

use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{Actor, Patient, PatientCreate, PatientUpdate};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::LedgerEngine;
use crate::storage::{self, PATIENTS};

impl LedgerEngine {
    /// Register a patient
    pub fn create_patient(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: PatientCreate,
    ) -> LedgerResult<Patient> {
        if input.full_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("full_name must not be empty"));
        }

        let now = util::now_millis();
        let patient = Patient {
            id: util::snowflake_id(),
            full_name: input.full_name,
            phone: input.phone,
            nic: input.nic,
            patient_code: input.patient_code,
            created_by: actor.uid.clone(),
            created_at: now,
            updated_by: actor.uid.clone(),
            updated_at: now,
        };

        let txn = self.storage().begin_write()?;
        storage::put_doc(&txn, PATIENTS, clinic_id, patient.id, &patient)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::PatientCreated,
            "patient",
            patient.id,
            json!({ "full_name": patient.full_name }),
        );
        Ok(patient)
    }

    /// Update a patient's identity fields
    pub fn update_patient(
        &self,
        clinic_id: &str,
        actor: &Actor,
        patient_id: i64,
        patch: PatientUpdate,
    ) -> LedgerResult<Patient> {
        let txn = self.storage().begin_write()?;
        let mut patient: Patient = storage::get_doc(&txn, PATIENTS, clinic_id, patient_id)?
            .ok_or_else(|| LedgerError::not_found(format!("patient {patient_id}")))?;

        if let Some(full_name) = patch.full_name {
            if full_name.trim().is_empty() {
                return Err(LedgerError::invalid_input("full_name must not be empty"));
            }
            patient.full_name = full_name;
        }
        if let Some(phone) = patch.phone {
            patient.phone = phone;
        }
        if let Some(nic) = patch.nic {
            patient.nic = nic;
        }
        if let Some(code) = patch.patient_code {
            patient.patient_code = code;
        }
        patient.updated_by = actor.uid.clone();
        patient.updated_at = util::now_millis();

        storage::put_doc(&txn, PATIENTS, clinic_id, patient.id, &patient)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::PatientUpdated,
            "patient",
            patient.id,
            json!({ "full_name": patient.full_name }),
        );
        Ok(patient)
    }

    pub fn get_patient(&self, clinic_id: &str, patient_id: i64) -> LedgerResult<Option<Patient>> {
        Ok(self.storage().read_doc(PATIENTS, clinic_id, patient_id)?)
    }
}
