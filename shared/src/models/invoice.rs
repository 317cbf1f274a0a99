//! Invoice and payment models (收费)

use serde::{Deserialize, Serialize};

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Issued,
    Void,
}

/// One billed line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub service_id: Option<i64>,
    pub name: String,
    pub qty: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Invoice document
///
/// `total = subtotal - discount` with `discount` clamped to
/// `[0, subtotal]` — both enforced at creation. Invoices are billing
/// records only, fully decoupled from stock effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    /// `INV-000001` style document number
    pub invoice_number: String,
    pub patient_id: Option<i64>,
    pub patient_name: String,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub status: InvoiceStatus,
    pub created_by: String,
    pub created_at: i64,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
    pub voided_at: Option<i64>,
}

/// Create invoice payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceInput {
    pub patient_id: Option<i64>,
    pub patient_name: String,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub items: Vec<InvoiceItemInput>,
    #[serde(default)]
    pub discount: f64,
}

/// One line of an invoice payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItemInput {
    pub service_id: Option<i64>,
    pub name: String,
    pub qty: i64,
    pub unit_price: f64,
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Other,
}

/// Payment row
///
/// Appended against an invoice; never reconciled against the invoice
/// status here — partial/over payment handling lives in reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: i64,
}

/// Record payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub invoice_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub note: Option<String>,
}
