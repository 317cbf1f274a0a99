//! Dispense models (发药)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dispense status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispenseStatus {
    Posted,
    Void,
}

/// Allocation taken from one batch
///
/// Frozen at post time so a void can restore exactly the stock the
/// dispense consumed, batch by batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUsage {
    pub batch_id: i64,
    pub batch_no: String,
    pub expiry_date: NaiveDate,
    pub qty: i64,
    pub unit_cost: f64,
}

/// One dispensed item line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenseLine {
    pub item_id: i64,
    /// Item name frozen at post time
    pub item_name: String,
    pub qty: i64,
    /// FEFO allocation frozen at post time
    pub batches_used: Vec<BatchUsage>,
    pub cost_total: f64,
}

/// Dispense document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispense {
    pub id: i64,
    /// `DS-000001` style document number
    pub dispense_no: String,
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub dispense_date: NaiveDate,
    pub lines: Vec<DispenseLine>,
    pub total_cost: f64,
    pub status: DispenseStatus,
    pub created_by: String,
    pub created_at: i64,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
    pub voided_at: Option<i64>,
}

/// Post dispense payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenseInput {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub lines: Vec<DispenseLineInput>,
}

/// One requested item line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenseLineInput {
    pub item_id: i64,
    pub qty: i64,
}
