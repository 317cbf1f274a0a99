//! Billing service catalog operations

use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{Actor, Service, ServiceInput};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::LedgerEngine;
use crate::money;
use crate::storage::{self, SERVICES};

/// Catalog installed by [`LedgerEngine::seed_default_services`] for a
/// fresh clinic
const DEFAULT_SERVICES: &[(&str, f64)] = &[
    ("General Consultation", 3000.0),
    ("Follow-up Consultation", 2000.0),
];

impl LedgerEngine {
    /// Add a billable service to the catalog
    pub fn create_service(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: ServiceInput,
    ) -> LedgerResult<Service> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::invalid_input("service name must not be empty"));
        }
        money::require_non_negative(input.amount, "amount")?;

        let service = Service {
            id: util::snowflake_id(),
            name: input.name,
            amount: input.amount,
            active: input.active,
            created_by: actor.uid.clone(),
            created_at: util::now_millis(),
        };

        let txn = self.storage().begin_write()?;
        storage::put_doc(&txn, SERVICES, clinic_id, service.id, &service)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::ServiceCreated,
            "service",
            service.id,
            json!({ "name": service.name, "amount": service.amount }),
        );
        Ok(service)
    }

    /// Install the default consultation fees for a fresh clinic.
    ///
    /// Idempotent: a clinic that already has any services is left
    /// untouched and an empty list is returned.
    pub fn seed_default_services(&self, clinic_id: &str, actor: &Actor) -> LedgerResult<Vec<Service>> {
        let now = util::now_millis();

        let txn = self.storage().begin_write()?;
        let existing: Vec<Service> = storage::scan_docs_txn(&txn, SERVICES, clinic_id)?;
        if !existing.is_empty() {
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(DEFAULT_SERVICES.len());
        for (name, amount) in DEFAULT_SERVICES {
            let service = Service {
                id: util::snowflake_id(),
                name: (*name).to_string(),
                amount: *amount,
                active: true,
                created_by: actor.uid.clone(),
                created_at: now,
            };
            storage::put_doc(&txn, SERVICES, clinic_id, service.id, &service)?;
            created.push(service);
        }
        storage::commit(txn)?;

        tracing::info!(count = created.len(), "Default services seeded");
        Ok(created)
    }

    /// The clinic's service catalog
    pub fn list_services(&self, clinic_id: &str) -> LedgerResult<Vec<Service>> {
        Ok(self.storage().scan_docs(SERVICES, clinic_id)?)
    }
}
