//! Invoice and payment operations (收费)

use serde_json::json;
use shared::error::{LedgerError, LedgerResult};
use shared::models::{
    Actor, Invoice, InvoiceInput, InvoiceItem, InvoiceStatus, Payment, PaymentInput,
};
use shared::util;

use crate::audit::AuditAction;
use crate::engine::LedgerEngine;
use crate::money;
use crate::sequence;
use crate::storage::{self, INVOICES, PAYMENTS};

impl LedgerEngine {
    /// Issue an invoice.
    ///
    /// Line items are normalized (`qty` floored to 1, `unit_price`
    /// floored to 0), the discount is clamped to `[0, subtotal]` and
    /// `total = subtotal - discount`. Invoices are billing records only —
    /// stock is untouched.
    pub fn create_invoice(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: InvoiceInput,
    ) -> LedgerResult<Invoice> {
        if input.items.is_empty() {
            return Err(LedgerError::invalid_input("invoice must contain at least one item"));
        }
        if input.patient_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("patient_name must not be empty"));
        }
        money::require_finite(input.discount, "discount")?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            money::require_finite(item.unit_price, "unit_price")?;
            let qty = item.qty.max(1);
            let unit_price = item.unit_price.max(0.0);
            items.push(InvoiceItem {
                service_id: item.service_id,
                name: item.name.clone(),
                qty,
                unit_price,
                line_total: money::line_total(qty, unit_price),
            });
        }
        let subtotal = money::sum(items.iter().map(|i| i.line_total));
        let discount = input.discount.clamp(0.0, subtotal);
        let total = money::subtract(subtotal, discount);

        let now = util::now_millis();
        let invoice_id = util::snowflake_id();

        let txn = self.storage().begin_write()?;
        let seq = sequence::issue(&txn, clinic_id, "invoices")?;
        let invoice = Invoice {
            id: invoice_id,
            invoice_number: sequence::format_doc_no("INV", seq),
            patient_id: input.patient_id,
            patient_name: input.patient_name,
            doctor_id: input.doctor_id,
            doctor_name: input.doctor_name,
            items,
            subtotal,
            discount,
            total,
            status: InvoiceStatus::Issued,
            created_by: actor.uid.clone(),
            created_at: now,
            void_reason: None,
            voided_by: None,
            voided_at: None,
        };
        storage::put_doc(&txn, INVOICES, clinic_id, invoice_id, &invoice)?;
        storage::commit(txn)?;

        tracing::info!(invoice_number = %invoice.invoice_number, total = invoice.total, "Invoice issued");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::InvoiceIssued,
            "invoice",
            invoice_id,
            json!({ "invoice_number": invoice.invoice_number, "total": invoice.total }),
        );
        Ok(invoice)
    }

    /// Void an issued invoice. Stock is unaffected — dispense reversals
    /// go through `void_dispense`.
    pub fn void_invoice(
        &self,
        clinic_id: &str,
        actor: &Actor,
        invoice_id: i64,
        reason: &str,
    ) -> LedgerResult<Invoice> {
        let txn = self.storage().begin_write()?;
        let mut invoice: Invoice = storage::get_doc(&txn, INVOICES, clinic_id, invoice_id)?
            .ok_or_else(|| LedgerError::not_found(format!("invoice {invoice_id}")))?;
        if invoice.status == InvoiceStatus::Void {
            return Err(LedgerError::already_void(format!("invoice {}", invoice.invoice_number)));
        }

        invoice.status = InvoiceStatus::Void;
        invoice.void_reason = Some(reason.to_string());
        invoice.voided_by = Some(actor.uid.clone());
        invoice.voided_at = Some(util::now_millis());
        storage::put_doc(&txn, INVOICES, clinic_id, invoice_id, &invoice)?;
        storage::commit(txn)?;

        tracing::info!(invoice_number = %invoice.invoice_number, reason, "Invoice voided");
        self.audit_log(
            clinic_id,
            actor,
            AuditAction::InvoiceVoided,
            "invoice",
            invoice_id,
            json!({ "invoice_number": invoice.invoice_number, "reason": reason }),
        );
        Ok(invoice)
    }

    /// Append a payment against an invoice.
    ///
    /// No settlement logic: the invoice status is never derived from
    /// cumulative payments — reconciliation is a reporting concern.
    pub fn record_payment(
        &self,
        clinic_id: &str,
        actor: &Actor,
        input: PaymentInput,
    ) -> LedgerResult<Payment> {
        money::require_non_negative(input.amount, "payment amount")?;

        let txn = self.storage().begin_write()?;
        let invoice: Option<Invoice> = storage::get_doc(&txn, INVOICES, clinic_id, input.invoice_id)?;
        let invoice = invoice
            .ok_or_else(|| LedgerError::not_found(format!("invoice {}", input.invoice_id)))?;

        let payment = Payment {
            id: util::snowflake_id(),
            invoice_id: invoice.id,
            amount: input.amount,
            method: input.method,
            note: input.note,
            created_by: actor.uid.clone(),
            created_at: util::now_millis(),
        };
        storage::put_doc(&txn, PAYMENTS, clinic_id, payment.id, &payment)?;
        storage::commit(txn)?;

        self.audit_log(
            clinic_id,
            actor,
            AuditAction::PaymentRecorded,
            "payment",
            payment.id,
            json!({ "invoice_number": invoice.invoice_number, "amount": payment.amount }),
        );
        Ok(payment)
    }

    pub fn get_invoice(&self, clinic_id: &str, invoice_id: i64) -> LedgerResult<Option<Invoice>> {
        Ok(self.storage().read_doc(INVOICES, clinic_id, invoice_id)?)
    }

    /// Payments recorded against one invoice, in append order
    pub fn list_payments_for_invoice(
        &self,
        clinic_id: &str,
        invoice_id: i64,
    ) -> LedgerResult<Vec<Payment>> {
        let payments: Vec<Payment> = self.storage().scan_docs(PAYMENTS, clinic_id)?;
        Ok(payments.into_iter().filter(|p| p.invoice_id == invoice_id).collect())
    }
}
